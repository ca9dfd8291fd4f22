//! Error types shared across EyeMouse crates.

use std::path::PathBuf;

/// Top-level error type for EyeMouse operations.
#[derive(Debug, thiserror::Error)]
pub enum EyemouseError {
    #[error("Tracking error: {message}")]
    Tracking { message: String },

    #[error("Calibration error: {message}")]
    Calibration { message: String },

    #[error("Landmark stream error: {message}")]
    Landmarks { message: String },

    #[error("Actuator error: {message}")]
    Actuator { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using EyemouseError.
pub type EyemouseResult<T> = Result<T, EyemouseError>;

impl EyemouseError {
    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking {
            message: msg.into(),
        }
    }

    pub fn calibration(msg: impl Into<String>) -> Self {
        Self::Calibration {
            message: msg.into(),
        }
    }

    pub fn landmarks(msg: impl Into<String>) -> Self {
        Self::Landmarks {
            message: msg.into(),
        }
    }

    pub fn actuator(msg: impl Into<String>) -> Self {
        Self::Actuator {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
