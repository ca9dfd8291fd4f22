//! Show the effective configuration.

use std::path::PathBuf;

pub fn run(config: Option<PathBuf>) -> anyhow::Result<()> {
    let path = super::resolve_path(config.clone());
    let cfg = super::load_config(config.as_deref())?;

    let source = if path.exists() { "file" } else { "defaults" };
    println!("Config: {} ({source})", path.display());
    println!();

    let t = &cfg.tracking;
    println!("Tracking:");
    println!("  Sensitivity: {}", t.sensitivity);
    println!("  Smoothing: {}", t.smoothing_factor);
    println!("  Closed threshold: {}", t.closed_threshold);
    println!(
        "  Long blink: {}s, double blink window: {}s",
        t.long_blink_secs, t.double_blink_window_secs
    );
    println!(
        "  Click cooldown: {}s, single click interval: {}s",
        t.click_cooldown_secs, t.single_click_interval_secs
    );
    println!("  Scroll amount: {}", t.scroll_amount);
    println!();

    let c = &cfg.calibration;
    println!("Calibration:");
    println!("  Center: ({}, {})", c.center_x, c.center_y);
    println!("  Range: ({}, {})", c.range_x, c.range_y);
    println!();

    println!("Screen:");
    println!(
        "  {}x{} (safe margin {}px)",
        cfg.screen.width, cfg.screen.height, cfg.screen.safe_margin
    );
    println!();

    let layout = &cfg.landmarks;
    println!("Landmarks:");
    println!("  Required per frame: {}", layout.required_len());
    let iris_len = layout
        .left
        .iris
        .iter()
        .chain(&layout.right.iris)
        .max()
        .map_or(0, |i| i + 1);
    println!("  With iris points: {iris_len}");
    println!();

    println!("Activation:");
    println!(
        "  Wake: \"{}\", sleep: \"{}\", start active: {}",
        cfg.activation.wake_phrase, cfg.activation.sleep_phrase, cfg.activation.start_active
    );

    Ok(())
}
