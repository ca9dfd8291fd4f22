//! Replay a landmark stream through the tracking pipeline.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use eyemouse_actuator::activation::ActivationListener;
use eyemouse_actuator::backends::{build_actuator, ReplaySource};
use eyemouse_actuator::writer::IntentWriter;
use eyemouse_actuator::FrameLoop;
use eyemouse_common::clock::FrameClock;
use eyemouse_face_model::IntentStreamHeader;
use eyemouse_tracking_core::TrackingSession;

pub async fn run(
    config: Option<PathBuf>,
    path: PathBuf,
    intents: Option<PathBuf>,
    inactive: bool,
    listen: bool,
    max_fps: u32,
) -> anyhow::Result<()> {
    let cfg = super::load_config(config.as_deref())?;

    let source = ReplaySource::open(&path)
        .map_err(|e| anyhow::anyhow!("Failed to open landmark stream: {e}"))?;
    let frame_count = source.remaining();

    let clock = FrameClock::start();
    let writer = match &intents {
        Some(out) => {
            let header = IntentStreamHeader {
                schema_version: "1.0".to_string(),
                epoch_wall: clock.epoch_wall().to_string(),
                screen_width: cfg.screen.width,
                screen_height: cfg.screen.height,
            };
            Some(
                IntentWriter::create(out.clone(), &header)
                    .map_err(|e| anyhow::anyhow!("Failed to create intent log: {e}"))?,
            )
        }
        None => None,
    };

    // With --listen the wake phrase decides, unless the config starts active.
    let start_active = !inactive && (!listen || cfg.activation.start_active);

    println!("Replaying {} frames from {}", frame_count, path.display());
    println!("  Screen: {}x{}", cfg.screen.width, cfg.screen.height);
    println!("  Active: {start_active}");
    if let Some(out) = &intents {
        println!("  Intent log: {}", out.display());
    }
    println!();

    let mut frame_loop = FrameLoop::new(
        Box::new(source),
        build_actuator(&cfg.screen, writer),
        TrackingSession::new(&cfg),
        start_active,
    )
    .with_max_rate(max_fps);

    if listen {
        let listener = ActivationListener::new(&cfg.activation, frame_loop.activation_flag());
        println!(
            "Listening on stdin: say \"{}\" or \"{}\"",
            cfg.activation.wake_phrase, cfg.activation.sleep_phrase
        );
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            if let Err(e) = listener.listen(stdin).await {
                tracing::warn!(error = %e, "Activation listener stopped");
            }
        });
    }

    let stop = frame_loop.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.store(true, Ordering::SeqCst);
        }
    });

    let stats = frame_loop.run().await?;

    println!("Replay finished:");
    println!("  Frames received: {}", stats.frames_received);
    println!("  Frames processed: {}", stats.frames_processed);
    println!("  Skipped while inactive: {}", stats.frames_inactive);
    println!("  Throttled: {}", stats.frames_throttled);
    println!("  Without face: {}", stats.frames_without_face);
    println!("  Intents dispatched: {}", stats.intents_dispatched);
    let blind = frame_loop.session().frames_without_pupil_source();
    if blind > 0 {
        println!("  Without iris or image (no gaze): {blind}");
    }
    if stats.actuator_errors > 0 {
        println!("  Actuator errors: {}", stats.actuator_errors);
    }

    Ok(())
}
