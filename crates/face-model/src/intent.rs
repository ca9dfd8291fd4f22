//! Actuation intents decided by the tracking core.
//!
//! Intents are fire-and-forget: the core never observes whether the
//! actuator honoured them.

use serde::{Deserialize, Serialize};

use crate::landmark::{StreamError, TimestampNs};

/// A pointer action for the actuator sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActuationIntent {
    /// Move the pointer to absolute screen pixels.
    MoveTo { x: i32, y: i32 },
    LeftClick,
    RightClick,
    DoubleClick,
    /// Scroll by a signed amount; positive scrolls up.
    Scroll { amount: i32 },
}

impl ActuationIntent {
    /// Whether this intent is a button press of any kind.
    pub fn is_click(&self) -> bool {
        matches!(
            self,
            Self::LeftClick | Self::RightClick | Self::DoubleClick
        )
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MoveTo { .. } => "move_to",
            Self::LeftClick => "left_click",
            Self::RightClick => "right_click",
            Self::DoubleClick => "double_click",
            Self::Scroll { .. } => "scroll",
        }
    }
}

/// An intent stamped with the frame time that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRecord {
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    #[serde(flatten)]
    pub intent: ActuationIntent,
}

impl IntentRecord {
    pub fn new(timestamp_ns: TimestampNs, intent: ActuationIntent) -> Self {
        Self {
            timestamp_ns,
            intent,
        }
    }
}

/// Header written as the first (`#`-prefixed) line of an intent log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentStreamHeader {
    pub schema_version: String,

    /// Wall-clock time tracking started (ISO 8601).
    pub epoch_wall: String,

    /// Screen the targets were computed for.
    pub screen_width: u32,
    pub screen_height: u32,
}

/// Parse intent records from JSONL (one JSON object per line).
pub fn parse_intents(jsonl: &str) -> Result<Vec<IntentRecord>, StreamError> {
    jsonl
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| StreamError::ParseError {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Serialize intent records to JSONL format.
pub fn serialize_intents(records: &[IntentRecord]) -> Result<String, StreamError> {
    let mut output = String::new();
    for record in records {
        output.push_str(&serde_json::to_string(record)?);
        output.push('\n');
    }
    Ok(output)
}
