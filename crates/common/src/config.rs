//! Application configuration.
//!
//! All sections deserialize with `#[serde(default)]`, so a partial
//! settings file merges with the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EyemouseError, EyemouseResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Blink and gaze behaviour.
    pub tracking: TrackingConfig,

    /// Operator calibration for gaze normalization.
    pub calibration: Calibration,

    /// Empirical gain constants.
    pub tuning: TuningConfig,

    /// Landmark index table of the active landmark model.
    pub landmarks: LandmarkLayout,

    /// Target screen geometry.
    pub screen: ScreenConfig,

    /// Wake/sleep phrase handling.
    pub activation: ActivationConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Blink classification, click policy, and gaze mapping parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    /// Cursor gain applied to the normalized gaze offset.
    pub sensitivity: f64,

    /// Weight of the previous gaze sample in [0.0, 1.0].
    /// Larger values lag more and jitter less.
    pub smoothing_factor: f64,

    /// Lid distance below which an eye counts as closed, in landmark units.
    pub closed_threshold: f64,

    /// Minimum closure (seconds) for a long blink.
    pub long_blink_secs: f64,

    /// Maximum spacing (seconds) between blink ends for a double blink.
    pub double_blink_window_secs: f64,

    /// Dead time (seconds) after a right or double click.
    pub click_cooldown_secs: f64,

    /// Minimum spacing (seconds) between single left clicks.
    pub single_click_interval_secs: f64,

    /// Scroll step emitted per wink frame.
    pub scroll_amount: i32,
}

/// Center/range values mapping averaged gaze to a normalized offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Calibration {
    pub center_x: f64,
    pub center_y: f64,
    pub range_x: f64,
    pub range_y: f64,
}

/// Empirically tuned gain constants.
///
/// The defaults reproduce the behaviour users have calibrated against;
/// change them only together with a recalibration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TuningConfig {
    /// Extra gain on each eye's box-relative pupil position.
    pub pupil_amplification: f64,

    /// Gain on the sum of both eyes' relative positions.
    pub binocular_gain: f64,

    /// Screen dimension divisor applied with `sensitivity`.
    pub screen_divisor: f64,

    /// Normalized offset below which the cursor holds still.
    pub dead_zone: f64,

    /// Gaussian sigma for the darkest-pixel pupil search (7x7 kernel).
    pub pupil_blur_sigma: f32,
}

/// Landmark indices for one eye.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EyeLandmarks {
    /// Contour points outlining the eye.
    pub contour: Vec<usize>,

    /// Upper lid landmark.
    pub lid_top: usize,

    /// Lower lid landmark.
    pub lid_bottom: usize,

    /// Iris boundary points; only present with refined landmark models.
    pub iris: Vec<usize>,
}

/// Named landmark index table, MediaPipe face mesh by default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LandmarkLayout {
    pub left: EyeLandmarks,
    pub right: EyeLandmarks,
}

/// Screen geometry used to map gaze to absolute coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,

    /// Moves closer than this many pixels to an edge are dropped.
    pub safe_margin: u32,
}

/// Activation phrase configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActivationConfig {
    pub wake_phrase: String,
    pub sleep_phrase: String,

    /// Whether tracking starts active without a wake phrase.
    pub start_active: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "eyemouse_tracking_core=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            sensitivity: 10.0,
            smoothing_factor: 0.7,
            closed_threshold: 0.018,
            long_blink_secs: 1.0,
            double_blink_window_secs: 0.5,
            click_cooldown_secs: 0.5,
            single_click_interval_secs: 0.5,
            scroll_amount: 2,
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            range_x: 0.5,
            range_y: 0.5,
        }
    }
}

impl Calibration {
    /// Reject ranges that would divide by zero or produce NaN.
    pub fn validate(&self) -> EyemouseResult<()> {
        let fields = [
            ("center_x", self.center_x),
            ("center_y", self.center_y),
            ("range_x", self.range_x),
            ("range_y", self.range_y),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EyemouseError::calibration(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.range_x == 0.0 || self.range_y == 0.0 {
            return Err(EyemouseError::calibration(format!(
                "ranges must be non-zero, got ({}, {})",
                self.range_x, self.range_y
            )));
        }
        Ok(())
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            pupil_amplification: 2.0,
            binocular_gain: 1.5,
            screen_divisor: 20.0,
            dead_zone: 0.02,
            pupil_blur_sigma: 1.4,
        }
    }
}

impl Default for LandmarkLayout {
    fn default() -> Self {
        Self {
            left: EyeLandmarks {
                contour: vec![362, 385, 387, 263, 373, 380],
                lid_top: 385,
                lid_bottom: 380,
                iris: vec![474, 475, 476, 477],
            },
            right: EyeLandmarks {
                contour: vec![33, 160, 158, 133, 153, 144],
                lid_top: 160,
                lid_bottom: 144,
                iris: vec![469, 470, 471, 472],
            },
        }
    }
}

impl EyeLandmarks {
    /// Highest index needed for openness and eye-box computation.
    pub fn max_required_index(&self) -> usize {
        self.contour
            .iter()
            .copied()
            .chain([self.lid_top, self.lid_bottom])
            .max()
            .unwrap_or(0)
    }

    /// Whether a frame with `len` landmarks carries this eye's iris points.
    pub fn has_iris(&self, len: usize) -> bool {
        !self.iris.is_empty() && self.iris.iter().all(|&i| i < len)
    }
}

impl LandmarkLayout {
    /// Minimum landmark count a frame needs for blink and eye-box work.
    pub fn required_len(&self) -> usize {
        self.left
            .max_required_index()
            .max(self.right.max_required_index())
            + 1
    }

    /// Whether both eyes' iris points are present in a frame of `len` landmarks.
    pub fn has_iris(&self, len: usize) -> bool {
        self.left.has_iris(len) && self.right.has_iris(len)
    }

    fn validate(&self) -> EyemouseResult<()> {
        for (side, eye) in [("left", &self.left), ("right", &self.right)] {
            if eye.contour.len() < 3 {
                return Err(EyemouseError::config(format!(
                    "{side} eye contour needs at least 3 landmarks, got {}",
                    eye.contour.len()
                )));
            }
        }
        Ok(())
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            safe_margin: 50,
        }
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            wake_phrase: "wake up".to_string(),
            sleep_phrase: "go to sleep".to_string(),
            start_active: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> EyemouseResult<Self> {
        if !path.exists() {
            return Err(EyemouseError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> EyemouseResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> EyemouseResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check every section for values the pipeline cannot work with.
    pub fn validate(&self) -> EyemouseResult<()> {
        let t = &self.tracking;
        if !t.sensitivity.is_finite() {
            return Err(EyemouseError::config("sensitivity must be finite"));
        }
        if !(0.0..=1.0).contains(&t.smoothing_factor) {
            return Err(EyemouseError::config(format!(
                "smoothing_factor must be within [0, 1], got {}",
                t.smoothing_factor
            )));
        }
        if !(t.closed_threshold.is_finite() && t.closed_threshold > 0.0) {
            return Err(EyemouseError::config(format!(
                "closed_threshold must be positive, got {}",
                t.closed_threshold
            )));
        }
        let windows = [
            ("long_blink_secs", t.long_blink_secs),
            ("double_blink_window_secs", t.double_blink_window_secs),
            ("click_cooldown_secs", t.click_cooldown_secs),
            ("single_click_interval_secs", t.single_click_interval_secs),
        ];
        for (name, value) in windows {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EyemouseError::config(format!(
                    "{name} must be a non-negative duration, got {value}"
                )));
            }
        }

        self.calibration.validate()?;

        if self.tuning.screen_divisor == 0.0 || !self.tuning.screen_divisor.is_finite() {
            return Err(EyemouseError::config("screen_divisor must be non-zero"));
        }
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(EyemouseError::config(format!(
                "screen size must be non-zero, got {}x{}",
                self.screen.width, self.screen.height
            )));
        }

        self.landmarks.validate()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("eyemouse").join("config.json")
}
