//! Wake/sleep phrase handling for the activation flag.
//!
//! Speech recognition happens elsewhere; this module only sees the
//! transcribed text.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use eyemouse_common::config::ActivationConfig;

/// What a transcribed phrase asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationCommand {
    Wake,
    Sleep,
}

/// Sets or clears a shared activation flag from transcribed phrases.
#[derive(Debug, Clone)]
pub struct ActivationListener {
    wake_phrase: String,
    sleep_phrase: String,
    active: Arc<AtomicBool>,
}

impl ActivationListener {
    pub fn new(config: &ActivationConfig, active: Arc<AtomicBool>) -> Self {
        Self {
            wake_phrase: config.wake_phrase.to_lowercase(),
            sleep_phrase: config.sleep_phrase.to_lowercase(),
            active,
        }
    }

    /// Match a transcript against the phrases, case-insensitively.
    ///
    /// The wake phrase is checked first.
    pub fn classify(&self, transcript: &str) -> Option<ActivationCommand> {
        let text = transcript.to_lowercase();
        if !self.wake_phrase.is_empty() && text.contains(&self.wake_phrase) {
            Some(ActivationCommand::Wake)
        } else if !self.sleep_phrase.is_empty() && text.contains(&self.sleep_phrase) {
            Some(ActivationCommand::Sleep)
        } else {
            None
        }
    }

    /// Apply a transcript to the flag, returning the command it carried.
    pub fn hear(&self, transcript: &str) -> Option<ActivationCommand> {
        let command = self.classify(transcript)?;
        match command {
            ActivationCommand::Wake => {
                tracing::info!(phrase = %self.wake_phrase, "Activating eye tracking");
                self.active.store(true, Ordering::SeqCst);
            }
            ActivationCommand::Sleep => {
                tracing::info!(phrase = %self.sleep_phrase, "Deactivating eye tracking");
                self.active.store(false, Ordering::SeqCst);
            }
        }
        Some(command)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Feed every line of `reader` through [`hear`](Self::hear) until EOF.
    ///
    /// Returns the number of lines that carried a command.
    pub async fn listen<R>(&self, reader: R) -> std::io::Result<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut commands = 0;
        while let Some(line) = lines.next_line().await? {
            tracing::debug!(transcript = %line, "Heard phrase");
            if self.hear(&line).is_some() {
                commands += 1;
            }
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener() -> ActivationListener {
        ActivationListener::new(&ActivationConfig::default(), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_phrases_toggle_flag() {
        let l = listener();
        assert_eq!(l.hear("okay WAKE UP please"), Some(ActivationCommand::Wake));
        assert!(l.is_active());
        assert_eq!(l.hear("time to go to sleep"), Some(ActivationCommand::Sleep));
        assert!(!l.is_active());
    }

    #[test]
    fn test_unrelated_speech_is_ignored() {
        let l = listener();
        l.hear("wake up");
        assert_eq!(l.hear("what's the weather"), None);
        assert!(l.is_active());
    }

    #[test]
    fn test_wake_checked_first() {
        let l = listener();
        assert_eq!(
            l.classify("go to sleep then wake up"),
            Some(ActivationCommand::Wake)
        );
    }

    #[tokio::test]
    async fn test_listen_reads_lines() {
        let l = listener();
        let input: &[u8] = b"hello\nwake up\nstill here\ngo to sleep\nwake up now\n";
        let commands = l.listen(input).await.unwrap();
        assert_eq!(commands, 3);
        assert!(l.is_active());
    }
}
