use image::{GrayImage, Luma};

use eyemouse_common::config::AppConfig;
use eyemouse_face_model::{ActuationIntent, LandmarkFrame, LandmarkPoint};
use eyemouse_tracking_core::eye_geometry::distance;
use eyemouse_tracking_core::{
    Eye, GazeMapper, GazeSettings, PupilSource, RelativeGaze, TrackingSession,
};

const FULL_MESH: usize = 478;
const NO_IRIS_MESH: usize = 468;

/// Half-height of an open synthetic eye; closed eyes shrink to a sliver.
const OPEN_HALF_HEIGHT: f64 = 10.0;
const CLOSED_HALF_HEIGHT: f64 = 0.004;

#[derive(Clone, Copy)]
struct EyePose {
    open: bool,
    /// Iris offset from the eye center in pixels.
    dx: f64,
    dy: f64,
}

const OPEN: EyePose = EyePose {
    open: true,
    dx: 0.0,
    dy: 0.0,
};
const CLOSED: EyePose = EyePose {
    open: false,
    dx: 0.0,
    dy: 0.0,
};

struct EyeIndices {
    contour: [usize; 6],
    iris: [usize; 4],
    center: (f64, f64),
}

// Contour order: outer corner, two upper lid points, inner corner, two lower.
const LEFT: EyeIndices = EyeIndices {
    contour: [362, 385, 387, 263, 373, 380],
    iris: [474, 475, 476, 477],
    center: (300.0, 200.0),
};
const RIGHT: EyeIndices = EyeIndices {
    contour: [33, 160, 158, 133, 153, 144],
    iris: [469, 470, 471, 472],
    center: (200.0, 200.0),
};

fn place_eye(points: &mut [LandmarkPoint], eye: &EyeIndices, pose: EyePose) {
    let (cx, cy) = eye.center;
    let h = if pose.open {
        OPEN_HALF_HEIGHT
    } else {
        CLOSED_HALF_HEIGHT
    };
    let outline = [
        (cx - 20.0, cy),
        (cx - 7.0, cy - h),
        (cx + 7.0, cy - h),
        (cx + 20.0, cy),
        (cx + 7.0, cy + h),
        (cx - 7.0, cy + h),
    ];
    for (&idx, &(x, y)) in eye.contour.iter().zip(outline.iter()) {
        points[idx] = LandmarkPoint::new(x, y, 0.0);
    }

    let (px, py) = (cx + pose.dx, cy + pose.dy);
    let ring = [(px + 1.0, py), (px, py - 1.0), (px - 1.0, py), (px, py + 1.0)];
    for (&idx, &(x, y)) in eye.iris.iter().zip(ring.iter()) {
        if idx < points.len() {
            points[idx] = LandmarkPoint::new(x, y, 0.0);
        }
    }
}

fn face(len: usize, left: EyePose, right: EyePose) -> Vec<LandmarkPoint> {
    let mut points = vec![LandmarkPoint::default(); len];
    place_eye(&mut points, &LEFT, left);
    place_eye(&mut points, &RIGHT, right);
    points
}

fn run(session: &mut TrackingSession, t: f64, left: EyePose, right: EyePose) -> Vec<ActuationIntent> {
    let points = face(FULL_MESH, left, right);
    session
        .process_frame(t, Some(&points), None)
        .map(|outcome| outcome.intents)
        .unwrap_or_default()
}

fn clicks(intents: &[ActuationIntent]) -> Vec<ActuationIntent> {
    intents.iter().copied().filter(ActuationIntent::is_click).collect()
}

#[test]
fn reference_gaze_frame_moves_to_clamped_target() {
    let mut session = TrackingSession::new(&AppConfig::default());
    // Box 40x20: relative = 2 * offset / dim * 2, so these offsets give
    // (0.2, 0.1) and (0.3, 0.2) with no rounding beyond the literals'.
    let left = EyePose {
        open: true,
        dx: 2.0,
        dy: 0.5,
    };
    let right = EyePose {
        open: true,
        dx: 3.0,
        dy: 1.0,
    };
    let points = face(FULL_MESH, left, right);
    let outcome = session.process_frame(0.0, Some(&points), None).unwrap();

    let pupil = outcome.measurement.left.pupil.unwrap();
    assert_eq!(pupil.source, PupilSource::Iris);
    assert_eq!((pupil.relative_x, pupil.relative_y), (0.2, 0.1));
    let pupil = outcome.measurement.right.pupil.unwrap();
    assert_eq!((pupil.relative_x, pupil.relative_y), (0.3, 0.2));

    assert_eq!(outcome.intents, vec![ActuationIntent::MoveTo { x: 1920, y: 1026 }]);
}

#[test]
fn centered_gaze_holds_position() {
    let mut session = TrackingSession::new(&AppConfig::default());
    let outcome = session
        .process_frame(0.0, Some(&face(FULL_MESH, OPEN, OPEN)), None)
        .unwrap();
    let gaze = outcome.gaze.unwrap();
    assert!(!gaze.moved);
    assert_eq!((gaze.target_x, gaze.target_y), (960, 540));
    assert!(outcome.intents.is_empty());
}

#[test]
fn long_blink_with_both_eyes_right_clicks() {
    let mut session = TrackingSession::new(&AppConfig::default());
    assert!(run(&mut session, 1.0, OPEN, OPEN).is_empty());
    assert!(run(&mut session, 1.1, CLOSED, CLOSED).is_empty());
    assert!(run(&mut session, 1.8, CLOSED, CLOSED).is_empty());
    assert!(session.blink_state(Eye::Left).closed);

    let intents = run(&mut session, 2.3, OPEN, OPEN);
    assert_eq!(intents, vec![ActuationIntent::RightClick]);
    assert_eq!(session.blink_state(Eye::Left).last_blink_end, Some(2.3));
}

#[test]
fn left_blink_clicks_then_double_blink_double_clicks() {
    let mut session = TrackingSession::new(&AppConfig::default());
    run(&mut session, 5.0, OPEN, OPEN);

    // A closed left eye with the right open is a wink, so it scrolls up.
    let closing = run(&mut session, 5.1, CLOSED, OPEN);
    assert_eq!(closing, vec![ActuationIntent::Scroll { amount: 2 }]);
    assert_eq!(clicks(&run(&mut session, 5.25, OPEN, OPEN)), vec![ActuationIntent::LeftClick]);

    run(&mut session, 5.4, CLOSED, OPEN);
    assert_eq!(
        clicks(&run(&mut session, 5.55, OPEN, OPEN)),
        vec![ActuationIntent::DoubleClick]
    );
}

#[test]
fn cooldown_blocks_clicks_but_not_scroll() {
    let mut session = TrackingSession::new(&AppConfig::default());
    run(&mut session, 0.0, CLOSED, CLOSED);
    assert_eq!(run(&mut session, 1.2, OPEN, OPEN), vec![ActuationIntent::RightClick]);

    // Quick left blink inside the cooldown: scroll keeps working, no click.
    let intents = run(&mut session, 1.3, CLOSED, OPEN);
    assert_eq!(intents, vec![ActuationIntent::Scroll { amount: 2 }]);
    assert!(clicks(&run(&mut session, 1.4, OPEN, OPEN)).is_empty());
}

#[test]
fn right_wink_scrolls_down_every_frame() {
    let mut session = TrackingSession::new(&AppConfig::default());
    for step in 0..5 {
        let intents = run(&mut session, step as f64 * 0.033, OPEN, CLOSED);
        assert_eq!(intents, vec![ActuationIntent::Scroll { amount: -2 }]);
    }
}

#[test]
fn no_face_frames_leave_state_untouched() {
    let mut session = TrackingSession::new(&AppConfig::default());
    run(&mut session, 0.0, CLOSED, OPEN);
    let before = *session.blink_state(Eye::Left);

    let frame = LandmarkFrame::no_face(500_000_000);
    assert!(session.process(&frame, None).is_none());
    assert_eq!(*session.blink_state(Eye::Left), before);
    assert_eq!(session.frames_processed(), 1);
}

fn gray_frame_with_pupils(left: (u32, u32), right: (u32, u32)) -> GrayImage {
    GrayImage::from_fn(400, 300, |x, y| {
        let near = |(px, py): (u32, u32)| x.abs_diff(px) <= 3 && y.abs_diff(py) <= 3;
        if near(left) || near(right) {
            Luma([0u8])
        } else {
            Luma([200u8])
        }
    })
}

#[test]
fn darkest_pixel_fallback_without_iris() {
    let mut session = TrackingSession::new(&AppConfig::default());
    let points = face(NO_IRIS_MESH, OPEN, OPEN);
    let gray = gray_frame_with_pupils((308, 200), (208, 200));

    let outcome = session.process_frame(0.0, Some(&points), Some(&gray)).unwrap();
    let (left, right) = outcome.measurement.pupils().unwrap();
    assert_eq!(left.source, PupilSource::DarkestPixel);
    assert_eq!(right.source, PupilSource::DarkestPixel);
    assert!(left.relative_x > 0.0);
    assert!(right.relative_x > 0.0);
    assert!(outcome.gaze.is_some());
}

#[test]
fn partial_iris_falls_back_for_both_eyes() {
    let mut session = TrackingSession::new(&AppConfig::default());
    // Right iris (469..=472) present, left iris (474..=477) cut off.
    let points = face(474, OPEN, OPEN);
    let gray = gray_frame_with_pupils((300, 200), (200, 200));

    let outcome = session.process_frame(0.0, Some(&points), Some(&gray)).unwrap();
    let (left, right) = outcome.measurement.pupils().unwrap();
    assert_eq!(left.source, PupilSource::DarkestPixel);
    assert_eq!(right.source, PupilSource::DarkestPixel);
}

#[test]
fn off_frame_contour_vertex_is_tolerated() {
    let mut session = TrackingSession::new(&AppConfig::default());
    let mut points = face(NO_IRIS_MESH, OPEN, OPEN);
    points[362] = LandmarkPoint::new(-1e19, 100.0, 0.0);
    let gray = GrayImage::from_pixel(64, 64, Luma([128u8]));

    let outcome = session.process_frame(0.0, Some(&points), Some(&gray)).unwrap();
    assert!(outcome.gaze.is_none());
    assert!(outcome.intents.is_empty());
}

#[test]
fn without_iris_or_image_blinks_still_classify() {
    let mut session = TrackingSession::new(&AppConfig::default());
    let closed = face(NO_IRIS_MESH, CLOSED, OPEN);
    let open = face(NO_IRIS_MESH, OPEN, OPEN);

    let outcome = session.process_frame(0.0, Some(&closed), None).unwrap();
    assert!(outcome.gaze.is_none());
    assert_eq!(outcome.intents, vec![ActuationIntent::Scroll { amount: 2 }]);

    let outcome = session.process_frame(0.2, Some(&open), None).unwrap();
    assert!(outcome.left.blink_completed);
    assert_eq!(outcome.intents, vec![ActuationIntent::LeftClick]);
    assert!(!session.gaze_mapper().has_previous_sample());
    assert_eq!(session.frames_without_pupil_source(), 2);
}

#[test]
fn calibration_takes_effect_on_next_frame() {
    let mut config = AppConfig::default();
    config.tracking.smoothing_factor = 0.0;
    let mut session = TrackingSession::new(&config);
    let pose = EyePose {
        open: true,
        dx: 2.0,
        dy: 0.0,
    };

    let before = session
        .process_frame(0.0, Some(&face(FULL_MESH, pose, pose)), None)
        .unwrap();
    assert!(before.gaze.unwrap().moved);

    let mut calibration = *session.gaze_mapper().calibration();
    calibration.center_x = before.gaze.unwrap().norm_x * calibration.range_x;
    session.calibrate(calibration).unwrap();

    let after = session
        .process_frame(0.1, Some(&face(FULL_MESH, pose, pose)), None)
        .unwrap();
    assert!(!after.gaze.unwrap().moved);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = LandmarkPoint> {
        (-1e4..1e4f64, -1e4..1e4f64, -1.0..1.0f64).prop_map(|(x, y, z)| LandmarkPoint::new(x, y, z))
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(a in point(), b in point()) {
            prop_assert_eq!(distance(&a, &b), distance(&b, &a));
            prop_assert_eq!(distance(&a, &a), 0.0);
        }

        #[test]
        fn dead_zone_never_moves(x in -0.006..0.006f64, y in -0.006..0.006f64) {
            // Per-eye x/2 gives a normalized offset of 3x, at most 0.018.
            let mut mapper = GazeMapper::new(Default::default(), GazeSettings::default());
            let gaze = RelativeGaze::new(x / 2.0, y / 2.0);
            let decision = mapper.map(gaze, gaze).unwrap();
            prop_assert!(!decision.moved);
        }

        #[test]
        fn targets_stay_on_screen(
            lx in -2.0..2.0f64, ly in -2.0..2.0f64,
            rx in -2.0..2.0f64, ry in -2.0..2.0f64,
            sensitivity in 0.0..40.0f64,
        ) {
            let mut mapper = GazeMapper::new(Default::default(), GazeSettings::default());
            mapper.set_sensitivity(sensitivity);
            let d = mapper.map(RelativeGaze::new(lx, ly), RelativeGaze::new(rx, ry)).unwrap();
            prop_assert!((0..=1920).contains(&d.target_x));
            prop_assert!((0..=1080).contains(&d.target_y));
        }
    }
}
