//! EyeMouse Tracking Core
//!
//! Turns per-frame facial landmarks into pointer intents:
//! - **Eye Geometry:** Lid openness, eye boxes, and pupil position per eye
//! - **Blink Classification:** Per-eye state machines for short, long, and double blinks
//! - **Gaze Mapping:** Smoothed, calibrated gaze mapped to bounded screen pixels
//! - **Gesture Dispatch:** Click, scroll, and move intents with cooldown policy
//!
//! This crate is pure computation with no I/O or platform dependencies.
//! It is driven synchronously once per frame; all timing compares against
//! the frame's own timestamp.

pub mod blink;
pub mod eye_geometry;
pub mod gaze;
pub mod gesture;
pub mod session;

pub use blink::{BlinkEvent, BlinkState, BlinkStateMachine, BlinkTiming};
pub use eye_geometry::{
    EyeBox, EyeGeometryAnalyzer, EyeMeasurement, FaceMeasurement, PupilEstimate, PupilSource,
};
pub use gaze::{GazeDecision, GazeMapper, GazeSettings, RelativeGaze};
pub use gesture::{GestureDispatcher, GesturePolicy};
pub use session::{Eye, FrameOutcome, TrackingSession};
