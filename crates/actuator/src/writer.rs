//! Append-only intent log writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use eyemouse_common::error::{EyemouseError, EyemouseResult};
use eyemouse_face_model::{IntentRecord, IntentStreamHeader};

/// Flush to disk after this many intents.
const FLUSH_EVERY: u64 = 1000;

/// Writes intents to a JSONL file, header first.
pub struct IntentWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    intents_written: u64,
}

impl IntentWriter {
    /// Create (or truncate) the log and write the header line.
    pub fn create(path: PathBuf, header: &IntentStreamHeader) -> EyemouseResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| EyemouseError::actuator(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            intents_written: 0,
        })
    }

    pub fn write_intent(&mut self, record: &IntentRecord) -> EyemouseResult<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| EyemouseError::actuator(format!("Failed to write intent: {e}")))?;
        self.intents_written += 1;

        if self.intents_written % FLUSH_EVERY == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> EyemouseResult<()> {
        self.writer
            .flush()
            .map_err(|e| EyemouseError::actuator(format!("Failed to flush intents: {e}")))
    }

    pub fn intents_written(&self) -> u64 {
        self.intents_written
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for IntentWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
