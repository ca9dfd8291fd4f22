//! Gesture dispatch: blink events, winks and gaze into actuation intents.
//!
//! Only the left eye drives clicks. Precedence per frame, first match wins:
//!
//! 1. long blink: right click, starts the click cooldown
//! 2. double blink: double click, starts the click cooldown
//! 3. single blink (right eye did not blink this frame): left click,
//!    rate limited by `single_click_interval_secs`
//!
//! Wink scrolling and cursor movement are evaluated every frame
//! regardless of clicks or cooldown. Intents come out as click, scroll, move.

use eyemouse_common::config::TrackingConfig;
use eyemouse_face_model::ActuationIntent;

use crate::blink::BlinkEvent;
use crate::gaze::GazeDecision;

/// Debounce and scroll parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GesturePolicy {
    /// Blink-derived clicks are suppressed this long after a right or double click.
    pub click_cooldown_secs: f64,
    pub single_click_interval_secs: f64,
    pub scroll_amount: i32,
}

impl Default for GesturePolicy {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

impl From<&TrackingConfig> for GesturePolicy {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            click_cooldown_secs: config.click_cooldown_secs,
            single_click_interval_secs: config.single_click_interval_secs,
            scroll_amount: config.scroll_amount,
        }
    }
}

/// Merges both eyes' blink events and the gaze decision.
#[derive(Debug, Clone, Default)]
pub struct GestureDispatcher {
    policy: GesturePolicy,
    cooldown_started: Option<f64>,
    last_single_click: Option<f64>,
}

impl GestureDispatcher {
    pub fn new(policy: GesturePolicy) -> Self {
        Self {
            policy,
            cooldown_started: None,
            last_single_click: None,
        }
    }

    pub fn policy(&self) -> &GesturePolicy {
        &self.policy
    }

    /// Whether blink-derived clicks are currently suppressed.
    pub fn in_cooldown(&self, now: f64) -> bool {
        self.cooldown_started
            .is_some_and(|start| now - start < self.policy.click_cooldown_secs)
    }

    /// Decide this frame's intents.
    pub fn dispatch(
        &mut self,
        left: &BlinkEvent,
        right: &BlinkEvent,
        gaze: Option<&GazeDecision>,
        now: f64,
    ) -> Vec<ActuationIntent> {
        let mut intents = Vec::new();

        if let Some(click) = self.click(left, right, now) {
            tracing::debug!(intent = click.label(), duration = left.duration, "Blink click");
            intents.push(click);
        }

        match (left.is_closed, right.is_closed) {
            (false, true) => intents.push(ActuationIntent::Scroll {
                amount: -self.policy.scroll_amount,
            }),
            (true, false) => intents.push(ActuationIntent::Scroll {
                amount: self.policy.scroll_amount,
            }),
            _ => {}
        }

        if let Some(decision) = gaze.filter(|d| d.moved) {
            intents.push(ActuationIntent::MoveTo {
                x: decision.target_x,
                y: decision.target_y,
            });
        }

        intents
    }

    fn click(&mut self, left: &BlinkEvent, right: &BlinkEvent, now: f64) -> Option<ActuationIntent> {
        if !left.blink_completed {
            return None;
        }

        let candidate = if left.is_long {
            ActuationIntent::RightClick
        } else if left.is_double {
            ActuationIntent::DoubleClick
        } else if !right.blink_completed && self.single_click_due(now) {
            ActuationIntent::LeftClick
        } else {
            return None;
        };

        if self.in_cooldown(now) {
            tracing::trace!(intent = candidate.label(), "Click suppressed by cooldown");
            return None;
        }

        match candidate {
            ActuationIntent::LeftClick => self.last_single_click = Some(now),
            _ => self.cooldown_started = Some(now),
        }
        Some(candidate)
    }

    fn single_click_due(&self, now: f64) -> bool {
        self.last_single_click
            .map_or(true, |last| now - last > self.policy.single_click_interval_secs)
    }
}
