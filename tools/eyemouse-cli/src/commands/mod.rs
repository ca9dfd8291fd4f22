pub mod calibrate;
pub mod info;
pub mod init;
pub mod run;
pub mod validate;

use std::path::{Path, PathBuf};

use eyemouse_common::config::{config_file_path, AppConfig};

/// Explicit `--config` path, or the standard location.
pub fn resolve_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(config_file_path)
}

/// Load the effective configuration.
///
/// An explicit path must exist and parse; the standard location falls
/// back to defaults.
pub fn load_config(config: Option<&Path>) -> anyhow::Result<AppConfig> {
    match config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        None => Ok(AppConfig::load()),
    }
}
