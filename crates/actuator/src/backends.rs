//! Landmark source and actuator backend implementations.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use eyemouse_common::config::ScreenConfig;
use eyemouse_common::error::{EyemouseError, EyemouseResult};
use eyemouse_face_model::{
    load_landmark_stream, ActuationIntent, IntentRecord, LandmarkFrame, LandmarkStreamHeader,
    TimestampNs,
};

use crate::writer::IntentWriter;
use crate::{Actuator, CapturedFrame, LandmarkSource};

/// Replays recorded landmark frames in order.
pub struct ReplaySource {
    header: Option<LandmarkStreamHeader>,
    frames: VecDeque<LandmarkFrame>,
}

impl ReplaySource {
    pub fn new(frames: Vec<LandmarkFrame>) -> Self {
        Self {
            header: None,
            frames: frames.into(),
        }
    }

    /// Load a JSONL landmark stream from disk.
    pub fn open(path: &Path) -> EyemouseResult<Self> {
        if !path.exists() {
            return Err(EyemouseError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let (header, frames) = load_landmark_stream(path)
            .map_err(|e| EyemouseError::landmarks(format!("{}: {e}", path.display())))?;
        tracing::debug!(frames = frames.len(), path = %path.display(), "Loaded landmark stream");
        Ok(Self {
            header,
            frames: frames.into(),
        })
    }

    pub fn header(&self) -> Option<&LandmarkStreamHeader> {
        self.header.as_ref()
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ReplaySource {
    fn poll(&mut self) -> EyemouseResult<Option<CapturedFrame>> {
        Ok(self.frames.pop_front().map(CapturedFrame::landmarks_only))
    }

    fn name(&self) -> &str {
        "replay"
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Source that never produces a frame and never finishes.
#[derive(Debug, Default)]
pub struct StubSource;

impl LandmarkSource for StubSource {
    fn poll(&mut self) -> EyemouseResult<Option<CapturedFrame>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Reports every intent as a tracing record.
#[derive(Debug, Default)]
pub struct LoggingActuator;

impl Actuator for LoggingActuator {
    fn move_to(&mut self, x: i32, y: i32) -> EyemouseResult<()> {
        tracing::debug!(x, y, "Move pointer");
        Ok(())
    }

    fn left_click(&mut self) -> EyemouseResult<()> {
        tracing::info!("Left click");
        Ok(())
    }

    fn right_click(&mut self) -> EyemouseResult<()> {
        tracing::info!("Right click");
        Ok(())
    }

    fn double_click(&mut self) -> EyemouseResult<()> {
        tracing::info!("Double click");
        Ok(())
    }

    fn scroll(&mut self, amount: i32) -> EyemouseResult<()> {
        tracing::info!(amount, "Scroll");
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}

/// Keeps every intent in memory. Clones share the same record list.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    records: Arc<Mutex<Vec<IntentRecord>>>,
    current_ns: TimestampNs,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the intents recorded so far.
    pub fn records(&self) -> Vec<IntentRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Recorded intents without their timestamps.
    pub fn intents(&self) -> Vec<ActuationIntent> {
        self.records().into_iter().map(|r| r.intent).collect()
    }

    fn record(&mut self, intent: ActuationIntent) -> EyemouseResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| EyemouseError::actuator("recording lock poisoned"))?;
        records.push(IntentRecord::new(self.current_ns, intent));
        Ok(())
    }
}

impl Actuator for RecordingActuator {
    fn move_to(&mut self, x: i32, y: i32) -> EyemouseResult<()> {
        self.record(ActuationIntent::MoveTo { x, y })
    }

    fn left_click(&mut self) -> EyemouseResult<()> {
        self.record(ActuationIntent::LeftClick)
    }

    fn right_click(&mut self) -> EyemouseResult<()> {
        self.record(ActuationIntent::RightClick)
    }

    fn double_click(&mut self) -> EyemouseResult<()> {
        self.record(ActuationIntent::DoubleClick)
    }

    fn scroll(&mut self, amount: i32) -> EyemouseResult<()> {
        self.record(ActuationIntent::Scroll { amount })
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn begin_frame(&mut self, timestamp_ns: TimestampNs) {
        self.current_ns = timestamp_ns;
    }
}

/// Writes every intent to a JSONL intent log.
pub struct IntentLogActuator {
    writer: IntentWriter,
    current_ns: TimestampNs,
}

impl IntentLogActuator {
    pub fn new(writer: IntentWriter) -> Self {
        Self {
            writer,
            current_ns: 0,
        }
    }

    pub fn intents_written(&self) -> u64 {
        self.writer.intents_written()
    }

    fn write(&mut self, intent: ActuationIntent) -> EyemouseResult<()> {
        self.writer
            .write_intent(&IntentRecord::new(self.current_ns, intent))
    }
}

impl Actuator for IntentLogActuator {
    fn move_to(&mut self, x: i32, y: i32) -> EyemouseResult<()> {
        self.write(ActuationIntent::MoveTo { x, y })
    }

    fn left_click(&mut self) -> EyemouseResult<()> {
        self.write(ActuationIntent::LeftClick)
    }

    fn right_click(&mut self) -> EyemouseResult<()> {
        self.write(ActuationIntent::RightClick)
    }

    fn double_click(&mut self) -> EyemouseResult<()> {
        self.write(ActuationIntent::DoubleClick)
    }

    fn scroll(&mut self, amount: i32) -> EyemouseResult<()> {
        self.write(ActuationIntent::Scroll { amount })
    }

    fn name(&self) -> &str {
        "intent-log"
    }

    fn begin_frame(&mut self, timestamp_ns: TimestampNs) {
        self.current_ns = timestamp_ns;
    }

    fn flush(&mut self) -> EyemouseResult<()> {
        self.writer.flush()
    }
}

/// Forwards to another actuator, dropping moves near the screen edges.
///
/// A target must lie strictly inside `margin` pixels of every edge.
pub struct SafeMarginActuator<A> {
    inner: A,
    width: i32,
    height: i32,
    margin: i32,
    moves_dropped: u64,
}

impl<A: Actuator> SafeMarginActuator<A> {
    pub fn new(inner: A, screen: &ScreenConfig) -> Self {
        Self {
            inner,
            width: i32::try_from(screen.width).unwrap_or(i32::MAX),
            height: i32::try_from(screen.height).unwrap_or(i32::MAX),
            margin: i32::try_from(screen.safe_margin).unwrap_or(i32::MAX),
            moves_dropped: 0,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn moves_dropped(&self) -> u64 {
        self.moves_dropped
    }

    fn is_safe(&self, x: i32, y: i32) -> bool {
        let m = self.margin;
        m < x && x < self.width.saturating_sub(m) && m < y && y < self.height.saturating_sub(m)
    }
}

impl<A: Actuator> Actuator for SafeMarginActuator<A> {
    fn move_to(&mut self, x: i32, y: i32) -> EyemouseResult<()> {
        if !self.is_safe(x, y) {
            self.moves_dropped += 1;
            tracing::warn!(x, y, margin = self.margin, "Pointer move into screen edge prevented");
            return Ok(());
        }
        self.inner.move_to(x, y)
    }

    fn left_click(&mut self) -> EyemouseResult<()> {
        self.inner.left_click()
    }

    fn right_click(&mut self) -> EyemouseResult<()> {
        self.inner.right_click()
    }

    fn double_click(&mut self) -> EyemouseResult<()> {
        self.inner.double_click()
    }

    fn scroll(&mut self, amount: i32) -> EyemouseResult<()> {
        self.inner.scroll(amount)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn begin_frame(&mut self, timestamp_ns: TimestampNs) {
        self.inner.begin_frame(timestamp_ns);
    }

    fn flush(&mut self) -> EyemouseResult<()> {
        self.inner.flush()
    }
}

/// Pick the actuator for a run: an intent log when `intent_log` is given,
/// otherwise tracing output. Both are wrapped in the edge guard.
pub fn build_actuator(
    screen: &ScreenConfig,
    intent_log: Option<IntentWriter>,
) -> Box<dyn Actuator> {
    match intent_log {
        Some(writer) => {
            tracing::info!(path = %writer.path().display(), "Writing intents to log");
            Box::new(SafeMarginActuator::new(IntentLogActuator::new(writer), screen))
        }
        None => Box::new(SafeMarginActuator::new(LoggingActuator, screen)),
    }
}
