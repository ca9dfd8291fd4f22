//! Store gaze calibration values.

use std::path::PathBuf;

use eyemouse_common::config::{AppConfig, Calibration};

pub fn run(
    config: Option<PathBuf>,
    center_x: f64,
    center_y: f64,
    range_x: f64,
    range_y: f64,
    sensitivity: Option<f64>,
    smoothing: Option<f64>,
) -> anyhow::Result<()> {
    let path = super::resolve_path(config);
    let mut cfg = if path.exists() {
        AppConfig::load_from(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?
    } else {
        AppConfig::default()
    };

    let calibration = Calibration {
        center_x,
        center_y,
        range_x,
        range_y,
    };
    calibration
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid calibration: {e}"))?;
    cfg.calibration = calibration;

    if let Some(sensitivity) = sensitivity {
        cfg.tracking.sensitivity = sensitivity;
    }
    if let Some(smoothing) = smoothing {
        cfg.tracking.smoothing_factor = smoothing;
    }
    cfg.validate()
        .map_err(|e| anyhow::anyhow!("Invalid settings: {e}"))?;

    cfg.save_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to save config: {e}"))?;

    println!("Calibration saved to {}", path.display());
    println!("  Center: ({center_x}, {center_y})");
    println!("  Range: ({range_x}, {range_y})");
    println!("  Sensitivity: {}", cfg.tracking.sensitivity);
    println!("  Smoothing: {}", cfg.tracking.smoothing_factor);

    Ok(())
}
