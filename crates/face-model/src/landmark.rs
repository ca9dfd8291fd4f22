//! Landmark types for the EyeMouse frame stream.
//!
//! A landmark stream is JSONL: an optional `# {header}` line followed by
//! one [`LandmarkFrame`] per line. Points are written as compact
//! `[x, y, z]` triples since a refined face mesh carries 478 of them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Monotonic timestamp in nanoseconds since tracking start.
pub type TimestampNs = u64;

/// A single facial keypoint: pixel `x`/`y` and relative depth `z`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Projection onto the image plane.
    pub fn xy(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

impl From<[f64; 3]> for LandmarkPoint {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<LandmarkPoint> for [f64; 3] {
    fn from(p: LandmarkPoint) -> Self {
        [p.x, p.y, p.z]
    }
}

/// A point in frame pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Landmarks detected in one camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monotonic nanoseconds since tracking start, sampled once per frame.
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    /// Positional landmark sequence, `None` when no face was detected.
    #[serde(default)]
    pub landmarks: Option<Vec<LandmarkPoint>>,
}

impl LandmarkFrame {
    /// A frame with a detected face.
    pub fn face(timestamp_ns: TimestampNs, landmarks: Vec<LandmarkPoint>) -> Self {
        Self {
            timestamp_ns,
            landmarks: Some(landmarks),
        }
    }

    /// A frame in which the landmark model found no face.
    pub fn no_face(timestamp_ns: TimestampNs) -> Self {
        Self {
            timestamp_ns,
            landmarks: None,
        }
    }

    /// Timestamp as fractional seconds since tracking start.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }

    /// Number of landmarks, zero without a face.
    pub fn landmark_count(&self) -> usize {
        self.landmarks.as_ref().map_or(0, Vec::len)
    }
}

/// Header written as the first (`#`-prefixed) line of a landmark stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Landmark model that produced the stream (e.g. "mediapipe-face-mesh").
    pub source: String,

    /// Camera frame dimensions in pixels.
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Errors raised while reading or writing JSONL streams.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error on line {line}: {source}")]
    ParseError {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Serialize error: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Parse a landmark stream, returning its header (if any) and frames.
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn parse_landmark_stream(
    jsonl: &str,
) -> Result<(Option<LandmarkStreamHeader>, Vec<LandmarkFrame>), StreamError> {
    let mut header = None;
    let mut frames = Vec::new();

    for (idx, raw) in jsonl.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if header.is_none() && frames.is_empty() {
                header = serde_json::from_str(comment.trim()).ok();
            }
            continue;
        }
        let frame = serde_json::from_str(line).map_err(|source| StreamError::ParseError {
            line: idx + 1,
            source,
        })?;
        frames.push(frame);
    }

    Ok((header, frames))
}

/// Parse landmark frames from JSONL, ignoring header/comment lines.
pub fn parse_frames(jsonl: &str) -> Result<Vec<LandmarkFrame>, StreamError> {
    parse_landmark_stream(jsonl).map(|(_, frames)| frames)
}

/// Read a landmark stream from disk.
pub fn load_landmark_stream(
    path: impl AsRef<Path>,
) -> Result<(Option<LandmarkStreamHeader>, Vec<LandmarkFrame>), StreamError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| StreamError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_landmark_stream(&content)
}

/// Serialize a landmark stream to JSONL, header first when given.
pub fn serialize_landmark_stream(
    header: Option<&LandmarkStreamHeader>,
    frames: &[LandmarkFrame],
) -> Result<String, StreamError> {
    let mut output = String::new();
    if let Some(header) = header {
        output.push_str("# ");
        output.push_str(&serde_json::to_string(header)?);
        output.push('\n');
    }
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}
