//! Write a default configuration file.

use std::path::PathBuf;

use eyemouse_common::config::AppConfig;

pub fn run(config: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = super::resolve_path(config);
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let defaults = AppConfig::default();
    defaults
        .save_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;

    println!("Config written to {}", path.display());
    println!(
        "  Screen: {}x{}",
        defaults.screen.width, defaults.screen.height
    );
    println!(
        "  Wake/sleep phrases: \"{}\" / \"{}\"",
        defaults.activation.wake_phrase, defaults.activation.sleep_phrase
    );
    println!();
    println!("Next: run `eyemouse calibrate` to store your gaze calibration.");

    Ok(())
}
