//! Validate a landmark stream.

use std::path::PathBuf;

use eyemouse_common::config::LandmarkLayout;
use eyemouse_face_model::{load_landmark_stream, LandmarkFrame};

/// Counts and problems found in a landmark stream.
#[derive(Debug, Default, PartialEq)]
struct StreamReport {
    frames: usize,
    with_face: usize,
    without_face: usize,
    with_iris: usize,
    issues: Vec<String>,
}

fn inspect(frames: &[LandmarkFrame], layout: &LandmarkLayout) -> StreamReport {
    let required = layout.required_len();
    let mut report = StreamReport {
        frames: frames.len(),
        ..Default::default()
    };

    let mut previous_ns = None;
    for (idx, frame) in frames.iter().enumerate() {
        if let Some(prev) = previous_ns {
            if frame.timestamp_ns < prev {
                report.issues.push(format!(
                    "frame {idx}: timestamp {} goes backwards (previous {prev})",
                    frame.timestamp_ns
                ));
            }
        }
        previous_ns = Some(frame.timestamp_ns);

        let Some(points) = &frame.landmarks else {
            report.without_face += 1;
            continue;
        };
        report.with_face += 1;

        if points.len() < required {
            report.issues.push(format!(
                "frame {idx}: {} landmarks, layout needs {required}",
                points.len()
            ));
            continue;
        }
        if layout.has_iris(points.len()) {
            report.with_iris += 1;
        }
        if let Some(bad) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            report
                .issues
                .push(format!("frame {idx}: landmark {bad} is not finite"));
        }
    }

    report
}

pub fn run(config: Option<PathBuf>, path: PathBuf) -> anyhow::Result<()> {
    println!("Validating landmark stream: {}", path.display());

    let cfg = super::load_config(config.as_deref())?;
    let (header, frames) = load_landmark_stream(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load landmark stream: {e}"))?;

    if let Some(header) = &header {
        println!(
            "  Source: {} (schema {}, {}x{})",
            header.source, header.schema_version, header.frame_width, header.frame_height
        );
    } else {
        println!("  Source: unknown (no header)");
    }

    let report = inspect(&frames, &cfg.landmarks);
    println!("  Frames: {}", report.frames);
    println!("  With face: {}", report.with_face);
    println!("  Without face: {}", report.without_face);
    println!("  With iris points: {}", report.with_iris);
    if let (Some(first), Some(last)) = (frames.first(), frames.last()) {
        println!(
            "  Duration: {:.2}s",
            last.timestamp_secs() - first.timestamp_secs()
        );
    }

    if report.issues.is_empty() {
        println!("\nLandmark stream is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &report.issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Affected frames will be skipped during tracking.",
            report.issues.len()
        );
    }

    Ok(())
}
