//! Session timing.
//!
//! Blink durations and click cooldowns run on each frame's own `t`, not on
//! the host clock. [`FrameClock`] only anchors a session in wall time and
//! reports how long it ran; [`RateController`] caps the processed frame rate
//! using frame timestamps.

use std::time::Instant;

/// Start of a tracking session, in both monotonic and wall time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Instant,
    /// RFC 3339 wall time at start, written into intent log headers.
    epoch_wall: String,
}

impl FrameClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Host seconds since the session started.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// Drops frames that arrive faster than a target rate.
#[derive(Debug)]
pub struct RateController {
    min_gap_ns: u64,
    last_accepted_ns: Option<u64>,
}

impl RateController {
    /// A rate of zero accepts every frame.
    pub fn new(max_hz: u32) -> Self {
        let min_gap_ns = match max_hz {
            0 => 0,
            hz => 1_000_000_000 / u64::from(hz),
        };
        Self {
            min_gap_ns,
            last_accepted_ns: None,
        }
    }

    /// Whether a frame stamped `frame_ns` should be processed.
    ///
    /// The first frame is always accepted. Later frames are accepted once
    /// at least one interval has passed since the last accepted frame.
    pub fn should_tick(&mut self, frame_ns: u64) -> bool {
        let due = self
            .last_accepted_ns
            .map_or(true, |last| frame_ns >= last.saturating_add(self.min_gap_ns));
        if due {
            self.last_accepted_ns = Some(frame_ns);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_records_wall_epoch() {
        let clock = FrameClock::start();
        assert!(clock.elapsed_secs() < 1.0);
        assert!(chrono::DateTime::parse_from_rfc3339(clock.epoch_wall()).is_ok());
    }

    #[test]
    fn test_rate_controller_drops_early_frames() {
        let mut ctrl = RateController::new(30);
        assert!(ctrl.should_tick(0));
        assert!(!ctrl.should_tick(10_000_000));
        assert!(ctrl.should_tick(34_000_000));
        assert!(!ctrl.should_tick(50_000_000));
    }

    #[test]
    fn test_rate_controller_unlimited() {
        let mut ctrl = RateController::new(0);
        assert!(ctrl.should_tick(5));
        assert!(ctrl.should_tick(5));
        assert!(ctrl.should_tick(6));
    }
}
