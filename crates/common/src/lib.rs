//! EyeMouse Common Utilities
//!
//! Shared infrastructure for all EyeMouse crates:
//! - Error types and result aliases
//! - Session clock and frame-rate limiting
//! - Tracing/logging initialization
//! - Configuration loading, tuning tables, and landmark layout

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
