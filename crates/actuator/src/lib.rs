//! EyeMouse Actuator
//!
//! Connects the tracking core to the outside world. A [`LandmarkSource`]
//! delivers frames, a [`TrackingSession`] turns them into intents, and an
//! [`Actuator`] carries the intents out. Backends:
//!
//! - **Replay:** Landmark frames from a JSONL stream
//! - **Logging:** Intents as tracing records
//! - **Intent log:** Append-only JSONL for later inspection
//! - **Safe margin:** Drops pointer moves that would hit a screen edge
//!
//! The [`FrameLoop`] only feeds the core while the shared activation flag
//! is set; an [`activation::ActivationListener`] flips that flag from
//! transcribed wake/sleep phrases.

pub mod activation;
pub mod backends;
pub mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::GrayImage;

use eyemouse_common::clock::{FrameClock, RateController};
use eyemouse_common::error::{EyemouseError, EyemouseResult};
use eyemouse_face_model::{ActuationIntent, LandmarkFrame, TimestampNs};
use eyemouse_tracking_core::TrackingSession;

/// Pause between polls while inactive.
const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Pause when the source has nothing ready yet.
const POLL_BACKOFF: Duration = Duration::from_millis(1);

/// Consecutive source errors after which the loop gives up.
const MAX_SOURCE_ERRORS: u32 = 100;

/// One frame from a landmark provider.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: LandmarkFrame,
    /// Grayscale camera image for the darkest-pixel pupil fallback.
    pub gray: Option<GrayImage>,
}

impl CapturedFrame {
    pub fn landmarks_only(frame: LandmarkFrame) -> Self {
        Self { frame, gray: None }
    }
}

/// Trait for landmark providers.
pub trait LandmarkSource: Send {
    /// Poll for the next frame. Returns `None` if no frame is ready.
    fn poll(&mut self) -> EyemouseResult<Option<CapturedFrame>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Whether the source will never produce another frame.
    fn is_exhausted(&self) -> bool;
}

/// Trait for pointer actuators. All calls are fire-and-forget.
pub trait Actuator: Send {
    fn move_to(&mut self, x: i32, y: i32) -> EyemouseResult<()>;

    fn left_click(&mut self) -> EyemouseResult<()>;

    fn right_click(&mut self) -> EyemouseResult<()>;

    fn double_click(&mut self) -> EyemouseResult<()>;

    /// Positive amounts scroll up.
    fn scroll(&mut self, amount: i32) -> EyemouseResult<()>;

    /// Actuator name for logging.
    fn name(&self) -> &str;

    /// Timestamp of the frame whose intents follow.
    fn begin_frame(&mut self, _timestamp_ns: TimestampNs) {}

    /// Flush any buffered output.
    fn flush(&mut self) -> EyemouseResult<()> {
        Ok(())
    }

    /// Dispatch a single intent to the matching call.
    fn apply(&mut self, intent: &ActuationIntent) -> EyemouseResult<()> {
        match *intent {
            ActuationIntent::MoveTo { x, y } => self.move_to(x, y),
            ActuationIntent::LeftClick => self.left_click(),
            ActuationIntent::RightClick => self.right_click(),
            ActuationIntent::DoubleClick => self.double_click(),
            ActuationIntent::Scroll { amount } => self.scroll(amount),
        }
    }
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames_received: u64,
    pub frames_processed: u64,
    /// Frames discarded while inactive.
    pub frames_inactive: u64,
    pub frames_throttled: u64,
    /// Frames with no face or too few landmarks.
    pub frames_without_face: u64,
    pub intents_dispatched: u64,
    pub actuator_errors: u64,
}

/// Drives a tracking session from a source into an actuator.
pub struct FrameLoop {
    source: Box<dyn LandmarkSource>,
    actuator: Box<dyn Actuator>,
    session: TrackingSession,
    clock: FrameClock,
    rate: RateController,
    active: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
    stats: LoopStats,
}

impl FrameLoop {
    pub fn new(
        source: Box<dyn LandmarkSource>,
        actuator: Box<dyn Actuator>,
        session: TrackingSession,
        start_active: bool,
    ) -> Self {
        Self {
            source,
            actuator,
            session,
            clock: FrameClock::start(),
            rate: RateController::new(0),
            active: Arc::new(AtomicBool::new(start_active)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            stats: LoopStats::default(),
        }
    }

    /// Drop frames arriving faster than `hz` (frame time). Zero disables.
    pub fn with_max_rate(mut self, hz: u32) -> Self {
        self.rate = RateController::new(hz);
        self
    }

    /// Share an activation flag owned elsewhere, e.g. by a listener task.
    pub fn with_activation_flag(mut self, active: Arc<AtomicBool>) -> Self {
        self.active = active;
        self
    }

    /// Run until the stop flag is set or the source is exhausted.
    pub async fn run(&mut self) -> EyemouseResult<LoopStats> {
        tracing::info!(
            source = %self.source.name(),
            actuator = %self.actuator.name(),
            active = self.is_active(),
            "Frame loop started"
        );

        let mut source_errors = 0;
        while !self.stop_flag.load(Ordering::Relaxed) {
            if self.source.is_exhausted() {
                tracing::debug!("Landmark source exhausted");
                break;
            }

            let polled = self.source.poll();
            if polled.is_ok() {
                source_errors = 0;
            }
            match polled {
                Ok(Some(captured)) => {
                    self.stats.frames_received += 1;
                    if !self.is_active() {
                        self.stats.frames_inactive += 1;
                        tokio::time::sleep(IDLE_SLEEP).await;
                        continue;
                    }
                    self.handle_frame(&captured);
                    // A source that always has a frame ready must not starve
                    // the listener and signal tasks.
                    tokio::task::yield_now().await;
                }
                Ok(None) => {
                    let pause = if self.is_active() {
                        POLL_BACKOFF
                    } else {
                        IDLE_SLEEP
                    };
                    tokio::time::sleep(pause).await;
                }
                Err(e) => {
                    source_errors += 1;
                    tracing::warn!(error = %e, consecutive = source_errors, "Landmark source error");
                    if source_errors >= MAX_SOURCE_ERRORS {
                        self.actuator.flush()?;
                        return Err(EyemouseError::tracking(format!(
                            "landmark source '{}' failed {source_errors} times in a row: {e}",
                            self.source.name()
                        )));
                    }
                }
            }
        }

        self.actuator.flush()?;
        tracing::info!(
            frames = self.stats.frames_received,
            processed = self.stats.frames_processed,
            inactive = self.stats.frames_inactive,
            intents = self.stats.intents_dispatched,
            elapsed_secs = self.clock.elapsed_secs(),
            "Frame loop stopped"
        );
        Ok(self.stats)
    }

    fn handle_frame(&mut self, captured: &CapturedFrame) {
        let timestamp_ns = captured.frame.timestamp_ns;
        if !self.rate.should_tick(timestamp_ns) {
            self.stats.frames_throttled += 1;
            return;
        }

        let Some(outcome) = self.session.process(&captured.frame, captured.gray.as_ref()) else {
            self.stats.frames_without_face += 1;
            return;
        };
        self.stats.frames_processed += 1;

        if outcome.intents.is_empty() {
            return;
        }
        self.actuator.begin_frame(timestamp_ns);
        for intent in &outcome.intents {
            match self.actuator.apply(intent) {
                Ok(()) => self.stats.intents_dispatched += 1,
                Err(e) => {
                    self.stats.actuator_errors += 1;
                    tracing::warn!(error = %e, intent = intent.label(), "Actuator call failed");
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Get the activation flag for external coordination.
    pub fn activation_flag(&self) -> Arc<AtomicBool> {
        self.active.clone()
    }

    /// Set the stop flag. The current frame always completes.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TrackingSession {
        &mut self.session
    }
}
