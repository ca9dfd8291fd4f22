//! Gaze mapping from binocular pupil offsets to screen pixels.

use eyemouse_common::config::{AppConfig, Calibration};
use eyemouse_common::error::EyemouseResult;

use crate::eye_geometry::PupilEstimate;

/// Gaze change (normalized units) large enough to be worth a debug record.
const GAZE_LOG_DELTA: f64 = 0.1;

/// One eye's amplified box-relative pupil offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelativeGaze {
    pub x: f64,
    pub y: f64,
}

impl RelativeGaze {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<&PupilEstimate> for RelativeGaze {
    fn from(pupil: &PupilEstimate) -> Self {
        Self::new(pupil.relative_x, pupil.relative_y)
    }
}

/// Gains and screen geometry for the mapper.
#[derive(Debug, Clone, PartialEq)]
pub struct GazeSettings {
    pub sensitivity: f64,
    /// Weight of the previous sample, clamped to [0, 1].
    pub smoothing_factor: f64,
    pub binocular_gain: f64,
    pub screen_divisor: f64,
    pub dead_zone: f64,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl GazeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            sensitivity: config.tracking.sensitivity,
            smoothing_factor: config.tracking.smoothing_factor.clamp(0.0, 1.0),
            binocular_gain: config.tuning.binocular_gain,
            screen_divisor: config.tuning.screen_divisor,
            dead_zone: config.tuning.dead_zone,
            screen_width: config.screen.width,
            screen_height: config.screen.height,
        }
    }
}

impl Default for GazeSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Result of mapping one frame's gaze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeDecision {
    pub norm_x: f64,
    pub norm_y: f64,
    /// Clamped screen target in pixels.
    pub target_x: i32,
    pub target_y: i32,
    /// False inside the dead zone: hold position.
    pub moved: bool,
}

/// Smooths, calibrates and maps binocular gaze onto the screen.
#[derive(Debug, Clone)]
pub struct GazeMapper {
    calibration: Calibration,
    settings: GazeSettings,
    previous: Option<(RelativeGaze, RelativeGaze)>,
    last_logged_norm: (f64, f64),
}

impl GazeMapper {
    pub fn new(calibration: Calibration, settings: GazeSettings) -> Self {
        let mut settings = settings;
        settings.smoothing_factor = settings.smoothing_factor.clamp(0.0, 1.0);
        Self {
            calibration,
            settings,
            previous: None,
            last_logged_norm: (0.0, 0.0),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.calibration, GazeSettings::from_config(config))
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn settings(&self) -> &GazeSettings {
        &self.settings
    }

    /// Replace the calibration. Takes effect on the next mapped frame.
    ///
    /// A zero or non-finite value is rejected and the current calibration kept.
    pub fn calibrate(&mut self, calibration: Calibration) -> EyemouseResult<()> {
        calibration.validate()?;
        self.calibration = calibration;
        tracing::info!(
            center_x = calibration.center_x,
            center_y = calibration.center_y,
            range_x = calibration.range_x,
            range_y = calibration.range_y,
            "Calibration updated"
        );
        Ok(())
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.settings.sensitivity = sensitivity;
    }

    pub fn set_smoothing(&mut self, smoothing_factor: f64) {
        self.settings.smoothing_factor = smoothing_factor.clamp(0.0, 1.0);
    }

    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.settings.screen_width = width;
        self.settings.screen_height = height;
    }

    /// Forget the previous sample so the next frame maps unsmoothed.
    pub fn reset_smoothing(&mut self) {
        self.previous = None;
    }

    pub fn has_previous_sample(&self) -> bool {
        self.previous.is_some()
    }

    /// Map one frame's per-eye offsets to a screen target.
    ///
    /// Returns `None` for non-finite input, leaving all state untouched.
    pub fn map(&mut self, left: RelativeGaze, right: RelativeGaze) -> Option<GazeDecision> {
        if !(left.is_finite() && right.is_finite()) {
            tracing::trace!("Dropping non-finite gaze sample");
            return None;
        }

        let gain = self.settings.binocular_gain;
        let alpha = self.settings.smoothing_factor;

        let mut avg_x = (left.x + right.x) * gain;
        let mut avg_y = (left.y + right.y) * gain;

        if let Some((prev_left, prev_right)) = self.previous {
            let prev_x = (prev_left.x + prev_right.x) * gain;
            let prev_y = (prev_left.y + prev_right.y) * gain;
            avg_x = avg_x * (1.0 - alpha) + prev_x * alpha;
            avg_y = avg_y * (1.0 - alpha) + prev_y * alpha;
        }

        let norm_x = normalize(avg_x, self.calibration.center_x, self.calibration.range_x);
        let norm_y = normalize(avg_y, self.calibration.center_y, self.calibration.range_y);

        let (last_x, last_y) = self.last_logged_norm;
        if (norm_x - last_x).abs() > GAZE_LOG_DELTA || (norm_y - last_y).abs() > GAZE_LOG_DELTA {
            tracing::debug!(norm_x, norm_y, "Gaze direction changed");
            self.last_logged_norm = (norm_x, norm_y);
        }

        let target_x = self.to_screen(norm_x, self.settings.screen_width);
        let target_y = self.to_screen(norm_y, self.settings.screen_height);

        let dead_zone = self.settings.dead_zone;
        let moved = norm_x.abs() > dead_zone || norm_y.abs() > dead_zone;

        // The raw sample is kept even when the cursor holds still.
        self.previous = Some((left, right));

        Some(GazeDecision {
            norm_x,
            norm_y,
            target_x,
            target_y,
            moved,
        })
    }

    fn to_screen(&self, norm: f64, dimension: u32) -> i32 {
        let dim = f64::from(dimension);
        let divisor = self.settings.screen_divisor;
        let scaled = if divisor == 0.0 {
            0.0
        } else {
            norm * self.settings.sensitivity * (dim / divisor)
        };
        let target = scaled + dim / 2.0;
        if target.is_nan() {
            return (dim / 2.0) as i32;
        }
        target.clamp(0.0, dim) as i32
    }
}

/// `(avg - center) / range`; a zero range passes the offset through.
fn normalize(avg: f64, center: f64, range: f64) -> f64 {
    if range == 0.0 {
        avg - center
    } else {
        (avg - center) / range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyemouse_common::error::EyemouseError;

    fn mapper(smoothing: f64) -> GazeMapper {
        let settings = GazeSettings {
            smoothing_factor: smoothing,
            ..Default::default()
        };
        GazeMapper::new(Calibration::default(), settings)
    }

    #[test]
    fn test_reference_frame_maps_to_clamped_target() {
        let mut m = mapper(0.7);
        let decision = m
            .map(RelativeGaze::new(0.2, 0.1), RelativeGaze::new(0.3, 0.2))
            .unwrap();
        assert!((decision.norm_x - 1.5).abs() < 1e-9);
        assert!((decision.norm_y - 0.9).abs() < 1e-9);
        assert_eq!(decision.target_x, 1920);
        assert_eq!(decision.target_y, 1026);
        assert!(decision.moved);
    }

    #[test]
    fn test_dead_zone_holds_position() {
        let mut m = mapper(0.0);
        let decision = m
            .map(RelativeGaze::new(0.002, -0.003), RelativeGaze::new(0.001, 0.0))
            .unwrap();
        assert!(!decision.moved);
        // State still advances on a dead-zone frame.
        assert!(m.has_previous_sample());
    }

    #[test]
    fn test_idempotent_without_smoothing() {
        let mut m = mapper(0.0);
        let left = RelativeGaze::new(0.1, -0.05);
        let right = RelativeGaze::new(0.12, -0.02);
        let first = m.map(left, right).unwrap();
        let second = m.map(left, right).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_smoothing_blends_with_previous_raw_sample() {
        let mut m = mapper(0.5);
        m.map(RelativeGaze::new(0.0, 0.0), RelativeGaze::new(0.0, 0.0));
        let decision = m
            .map(RelativeGaze::new(0.2, 0.0), RelativeGaze::new(0.2, 0.0))
            .unwrap();
        // avg 0.6 blended half-way with 0.0, divided by range 0.5.
        assert!((decision.norm_x - 0.6).abs() < 1e-9);

        m.reset_smoothing();
        let decision = m
            .map(RelativeGaze::new(0.2, 0.0), RelativeGaze::new(0.2, 0.0))
            .unwrap();
        assert!((decision.norm_x - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_full_smoothing_follows_previous_sample_only() {
        let mut m = mapper(1.0);
        let first = m
            .map(RelativeGaze::new(0.1, 0.1), RelativeGaze::new(0.1, 0.1))
            .unwrap();
        let second = m
            .map(RelativeGaze::new(-0.3, 0.2), RelativeGaze::new(-0.3, 0.2))
            .unwrap();
        assert_eq!(first.target_x, second.target_x);
        assert_eq!(first.target_y, second.target_y);
    }

    #[test]
    fn test_targets_stay_on_screen() {
        let mut m = mapper(0.0);
        let decision = m
            .map(RelativeGaze::new(-2.0, -2.0), RelativeGaze::new(-2.0, -2.0))
            .unwrap();
        assert_eq!(decision.target_x, 0);
        assert_eq!(decision.target_y, 0);
    }

    #[test]
    fn test_non_finite_input_is_dropped() {
        let mut m = mapper(0.5);
        assert!(m
            .map(RelativeGaze::new(f64::NAN, 0.0), RelativeGaze::new(0.0, 0.0))
            .is_none());
        assert!(!m.has_previous_sample());
    }

    #[test]
    fn test_zero_range_calibration_rejected() {
        let mut m = mapper(0.0);
        let err = m
            .calibrate(Calibration {
                range_y: 0.0,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, EyemouseError::Calibration { .. }));
        assert_eq!(*m.calibration(), Calibration::default());
    }

    #[test]
    fn test_calibration_applies_on_next_frame() {
        let mut m = mapper(0.0);
        m.calibrate(Calibration {
            center_x: 0.75,
            center_y: 0.45,
            range_x: 1.0,
            range_y: 1.0,
        })
        .unwrap();
        let decision = m
            .map(RelativeGaze::new(0.2, 0.1), RelativeGaze::new(0.3, 0.2))
            .unwrap();
        assert!(!decision.moved);
        assert_eq!(decision.target_x, 960);
        assert_eq!(decision.target_y, 540);
    }

    #[test]
    fn test_zero_range_passes_offset_through() {
        assert_eq!(normalize(0.3, 0.1, 0.0), 0.3 - 0.1);
        assert_eq!(normalize(0.3, 0.1, 0.5), (0.3 - 0.1) / 0.5);
    }

    #[test]
    fn test_smoothing_setter_clamps() {
        let mut m = mapper(0.5);
        m.set_smoothing(3.0);
        assert_eq!(m.settings().smoothing_factor, 1.0);
        m.set_smoothing(-1.0);
        assert_eq!(m.settings().smoothing_factor, 0.0);
    }

    #[test]
    fn test_screen_size_change() {
        let mut m = mapper(0.0);
        m.set_screen_size(1000, 500);
        let decision = m
            .map(RelativeGaze::new(0.0, 0.0), RelativeGaze::new(0.0, 0.0))
            .unwrap();
        assert_eq!((decision.target_x, decision.target_y), (500, 250));
    }
}
