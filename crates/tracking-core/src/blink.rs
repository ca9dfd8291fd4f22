//! Per-eye blink classification.
//!
//! One [`BlinkStateMachine`] per eye consumes the lid openness of every
//! frame. A blink is classified only when the eye reopens, once its full
//! duration is known:
//!
//! - **long:** closed for at least `long_blink_secs`
//! - **double:** ended within `double_blink_window_secs` of the previous
//!   blink's end (end-to-end spacing, not start-to-start)

use eyemouse_common::config::TrackingConfig;

/// Thresholds for blink classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkTiming {
    /// Openness below this counts as closed.
    pub closed_threshold: f64,
    pub long_blink_secs: f64,
    pub double_blink_window_secs: f64,
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

impl From<&TrackingConfig> for BlinkTiming {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            closed_threshold: config.closed_threshold,
            long_blink_secs: config.long_blink_secs,
            double_blink_window_secs: config.double_blink_window_secs,
        }
    }
}

/// Mutable per-eye state. Changes only on open/closed transitions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlinkState {
    pub closed: bool,
    /// Frame time at which the current closure began.
    pub closed_since: f64,
    /// Frame time at which the previous blink ended, if any.
    pub last_blink_end: Option<f64>,
}

/// Per-frame blink report for one eye. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlinkEvent {
    pub is_closed: bool,
    /// Completed blink length, or the running closure length while closed.
    pub duration: f64,
    pub blink_completed: bool,
    pub is_long: bool,
    pub is_double: bool,
}

/// Open/closed state machine for a single eye.
#[derive(Debug, Clone)]
pub struct BlinkStateMachine {
    timing: BlinkTiming,
    state: BlinkState,
}

impl BlinkStateMachine {
    pub fn new(timing: BlinkTiming) -> Self {
        Self::with_state(timing, BlinkState::default())
    }

    /// Resume from a known state.
    pub fn with_state(timing: BlinkTiming, state: BlinkState) -> Self {
        Self { timing, state }
    }

    pub fn state(&self) -> &BlinkState {
        &self.state
    }

    pub fn timing(&self) -> &BlinkTiming {
        &self.timing
    }

    /// Return to the initial open state.
    pub fn reset(&mut self) {
        self.state = BlinkState::default();
    }

    /// Feed one frame's openness measured at `now` (seconds).
    pub fn update(&mut self, openness: f64, now: f64) -> BlinkEvent {
        let is_closed = openness < self.timing.closed_threshold;
        let mut event = BlinkEvent {
            is_closed,
            ..Default::default()
        };

        match (self.state.closed, is_closed) {
            (false, true) => {
                self.state.closed = true;
                self.state.closed_since = now;
            }
            (true, false) => {
                let duration = now - self.state.closed_since;
                event.blink_completed = true;
                event.duration = duration;
                event.is_long = duration >= self.timing.long_blink_secs;
                event.is_double = self
                    .state
                    .last_blink_end
                    .is_some_and(|end| now - end < self.timing.double_blink_window_secs);

                self.state.closed = false;
                self.state.last_blink_end = Some(now);
            }
            (true, true) => {
                event.duration = now - self.state.closed_since;
            }
            (false, false) => {}
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: f64 = 100.0;

    fn machine(state: BlinkState) -> BlinkStateMachine {
        BlinkStateMachine::with_state(BlinkTiming::default(), state)
    }

    #[test]
    fn test_open_eye_on_fresh_state() {
        let mut m = BlinkStateMachine::new(BlinkTiming::default());
        let event = m.update(0.05, T);
        assert!(!event.is_closed);
        assert!(!event.blink_completed);
        assert_eq!(event.duration, 0.0);
        assert!(!m.state().closed);
    }

    #[test]
    fn test_closing_records_start() {
        let mut m = BlinkStateMachine::new(BlinkTiming::default());
        m.update(0.05, T - 0.1);
        let event = m.update(0.01, T);
        assert!(event.is_closed);
        assert!(!event.blink_completed);
        assert_eq!(event.duration, 0.0);
        assert!(m.state().closed);
        assert_eq!(m.state().closed_since, T);
    }

    #[test]
    fn test_still_closed_reports_running_duration() {
        let mut m = machine(BlinkState {
            closed: true,
            closed_since: T - 0.4,
            last_blink_end: None,
        });
        let event = m.update(0.01, T);
        assert!(event.is_closed);
        assert!(!event.blink_completed);
        assert!((event.duration - 0.4).abs() < 1e-9);
        assert_eq!(m.state().closed_since, T - 0.4);
    }

    #[test]
    fn test_short_blink_completes() {
        let mut m = machine(BlinkState {
            closed: true,
            closed_since: T - 0.2,
            last_blink_end: Some(0.0),
        });
        let event = m.update(0.05, T);
        assert!(!event.is_closed);
        assert!(event.blink_completed);
        assert!(!event.is_long);
        assert!(!event.is_double);
        assert!((event.duration - 0.2).abs() < 1e-9);
        assert!(!m.state().closed);
        assert_eq!(m.state().last_blink_end, Some(T));
    }

    #[test]
    fn test_long_blink() {
        let mut m = machine(BlinkState {
            closed: true,
            closed_since: T - 1.5,
            last_blink_end: Some(0.0),
        });
        let event = m.update(0.05, T);
        assert!(event.blink_completed);
        assert!(event.is_long);
    }

    #[test]
    fn test_long_blink_boundary_is_inclusive() {
        let mut m = machine(BlinkState {
            closed: true,
            closed_since: 1.0,
            last_blink_end: None,
        });
        assert!(m.update(0.05, 2.0).is_long);
    }

    #[test]
    fn test_double_blink_uses_end_to_end_spacing() {
        let mut m = machine(BlinkState {
            closed: true,
            closed_since: T - 0.2,
            last_blink_end: Some(T - 0.3),
        });
        let event = m.update(0.05, T);
        assert!(event.blink_completed);
        assert!(event.is_double);
        assert!(!event.is_long);
    }

    #[test]
    fn test_first_blink_is_never_double() {
        let mut m = BlinkStateMachine::new(BlinkTiming::default());
        m.update(0.01, 0.05);
        let event = m.update(0.05, 0.2);
        assert!(event.blink_completed);
        assert!(!event.is_double);
    }

    #[test]
    fn test_two_quick_blinks_sequence() {
        let mut m = BlinkStateMachine::new(BlinkTiming::default());
        m.update(0.01, 10.0);
        assert!(!m.update(0.05, 10.15).is_double);
        m.update(0.01, 10.3);
        let second = m.update(0.05, 10.45);
        assert!(second.blink_completed);
        assert!(second.is_double);

        // A third blink well after the second is single again.
        m.update(0.01, 12.0);
        assert!(!m.update(0.05, 12.1).is_double);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut m = BlinkStateMachine::new(BlinkTiming::default());
        m.update(0.01, 1.0);
        m.reset();
        assert_eq!(*m.state(), BlinkState::default());
    }
}
