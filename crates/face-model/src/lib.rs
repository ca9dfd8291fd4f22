//! EyeMouse Face Model
//!
//! Defines the data contracts that cross the tracking core's boundary:
//! - **Landmarks:** 3-D facial keypoints and timestamped landmark frames
//! - **Intents:** Pointer actions decided by the core for an actuator
//!
//! Landmark `x`/`y` are pixels in the source camera frame; `z` is the
//! landmark model's relative depth. Streams are JSONL, one record per line,
//! with an optional `#`-prefixed header line.

pub mod intent;
pub mod landmark;

pub use intent::*;
pub use landmark::*;
