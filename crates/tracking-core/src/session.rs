//! Per-frame pipeline tying the core components together.

use image::GrayImage;

use eyemouse_common::config::{AppConfig, Calibration};
use eyemouse_common::error::EyemouseResult;
use eyemouse_face_model::{ActuationIntent, LandmarkFrame, LandmarkPoint};

use crate::blink::{BlinkEvent, BlinkState, BlinkStateMachine, BlinkTiming};
use crate::eye_geometry::{EyeGeometryAnalyzer, FaceMeasurement};
use crate::gaze::{GazeDecision, GazeMapper, GazeSettings, RelativeGaze};
use crate::gesture::{GestureDispatcher, GesturePolicy};

/// Which eye, from the subject's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Eye {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one processed frame produced.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub timestamp_secs: f64,
    pub left: BlinkEvent,
    pub right: BlinkEvent,
    pub measurement: FaceMeasurement,
    /// `None` when no pupil estimate was available this frame.
    pub gaze: Option<GazeDecision>,
    pub intents: Vec<ActuationIntent>,
}

/// One tracking session: exactly one blink state per eye, one gaze mapper.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    analyzer: EyeGeometryAnalyzer,
    left: BlinkStateMachine,
    right: BlinkStateMachine,
    gaze: GazeMapper,
    dispatcher: GestureDispatcher,
    frames_processed: u64,
    frames_without_pupil_source: u64,
}

impl TrackingSession {
    pub fn new(config: &AppConfig) -> Self {
        let timing = BlinkTiming::from(&config.tracking);
        Self {
            analyzer: EyeGeometryAnalyzer::new(config.landmarks.clone(), &config.tuning),
            left: BlinkStateMachine::new(timing),
            right: BlinkStateMachine::new(timing),
            gaze: GazeMapper::new(config.calibration, GazeSettings::from_config(config)),
            dispatcher: GestureDispatcher::new(GesturePolicy::from(&config.tracking)),
            frames_processed: 0,
            frames_without_pupil_source: 0,
        }
    }

    /// Process one frame from a landmark stream.
    pub fn process(&mut self, frame: &LandmarkFrame, gray: Option<&GrayImage>) -> Option<FrameOutcome> {
        self.process_frame(frame.timestamp_secs(), frame.landmarks.as_deref(), gray)
    }

    /// Run the per-frame pipeline at time `now` (seconds, monotonic).
    ///
    /// Returns `None` without touching any state when no face was detected
    /// or the landmark set is too short for the configured layout.
    pub fn process_frame(
        &mut self,
        now: f64,
        landmarks: Option<&[LandmarkPoint]>,
        gray: Option<&GrayImage>,
    ) -> Option<FrameOutcome> {
        let landmarks = landmarks?;
        let Some(measurement) = self.analyzer.analyze(landmarks, gray) else {
            tracing::trace!(
                count = landmarks.len(),
                required = self.analyzer.layout().required_len(),
                "Landmark set too short, skipping frame"
            );
            return None;
        };

        let left = self.left.update(measurement.left.openness, now);
        let right = self.right.update(measurement.right.openness, now);
        for (eye, event) in [(Eye::Left, &left), (Eye::Right, &right)] {
            if event.blink_completed {
                tracing::debug!(
                    eye = %eye,
                    duration = event.duration,
                    long = event.is_long,
                    double = event.is_double,
                    "Blink completed"
                );
            }
        }

        if !self.analyzer.layout().has_iris(landmarks.len()) && gray.is_none() {
            if self.frames_without_pupil_source == 0 {
                tracing::warn!(
                    count = landmarks.len(),
                    "No iris landmarks and no camera image, gaze tracking is off until one arrives"
                );
            }
            self.frames_without_pupil_source += 1;
        }

        let gaze = measurement
            .pupils()
            .and_then(|(l, r)| self.gaze.map(RelativeGaze::from(&l), RelativeGaze::from(&r)));

        let intents = self.dispatcher.dispatch(&left, &right, gaze.as_ref(), now);
        self.frames_processed += 1;

        Some(FrameOutcome {
            timestamp_secs: now,
            left,
            right,
            measurement,
            gaze,
            intents,
        })
    }

    /// Replace gaze calibration; effective from the next frame.
    pub fn calibrate(&mut self, calibration: Calibration) -> EyemouseResult<()> {
        self.gaze.calibrate(calibration)
    }

    pub fn blink_state(&self, eye: Eye) -> &BlinkState {
        match eye {
            Eye::Left => self.left.state(),
            Eye::Right => self.right.state(),
        }
    }

    pub fn gaze_mapper(&self) -> &GazeMapper {
        &self.gaze
    }

    pub fn gaze_mapper_mut(&mut self) -> &mut GazeMapper {
        &mut self.gaze
    }

    pub fn analyzer(&self) -> &EyeGeometryAnalyzer {
        &self.analyzer
    }

    /// Frames that reached the blink and gaze stages.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Frames that had neither iris landmarks nor an image for pupil search.
    pub fn frames_without_pupil_source(&self) -> u64 {
        self.frames_without_pupil_source
    }
}
