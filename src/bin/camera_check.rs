//! camera_check - report which camera candidates actually deliver frames
//!
//! Tries every configured `(index, backend)` candidate the same way
//! `CameraSession::open` does (buffer depth, then warm-up reads) and prints
//! one line per candidate. Exits non-zero when none of them work.

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use gesture_runner::{
    BackendHint, CameraCandidate, CameraDriver, RunnerConfig, SyntheticConfig, SyntheticDriver,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CameraKind {
    Synthetic,
    V4l2,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Camera driver to probe with.
    #[arg(long, value_enum, default_value_t = CameraKind::V4l2)]
    camera: CameraKind,
    /// Probe only these device indices (any backend) instead of the configured list.
    #[arg(long = "index")]
    indices: Vec<u32>,
    /// Config file (.toml or .json); defaults to $GESTURE_CONFIG.
    #[arg(long, env = "GESTURE_CONFIG")]
    config: Option<PathBuf>,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    candidate: CameraCandidate,
    opened: bool,
    buffer_depth_applied: bool,
    /// Reads needed to get the first frame, if one arrived.
    first_frame_after: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    elapsed_ms: u128,
    error: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => RunnerConfig::load_from(path)?,
        None => RunnerConfig::load()?,
    };
    let candidates: Vec<CameraCandidate> = if args.indices.is_empty() {
        config.session.candidates.clone()
    } else {
        args.indices
            .iter()
            .map(|index| CameraCandidate::new(*index, BackendHint::Any))
            .collect()
    };

    let mut driver = build_driver(args.camera, &config)?;
    let reports: Vec<ProbeReport> = candidates
        .into_iter()
        .map(|candidate| probe(driver.as_mut(), candidate, &config))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match (report.first_frame_after, report.width, report.height) {
                (Some(reads), Some(width), Some(height)) => log::info!(
                    "{}: ok, {}x{} after {} read(s) in {} ms",
                    report.candidate,
                    width,
                    height,
                    reads,
                    report.elapsed_ms
                ),
                _ => log::warn!(
                    "{}: unusable ({})",
                    report.candidate,
                    report.error.as_deref().unwrap_or("no frame")
                ),
            }
        }
    }

    if reports.iter().any(|report| report.first_frame_after.is_some()) {
        Ok(())
    } else {
        Err(anyhow!("no camera candidate produced a frame"))
    }
}

fn probe(
    driver: &mut dyn CameraDriver,
    candidate: CameraCandidate,
    config: &RunnerConfig,
) -> ProbeReport {
    let started = Instant::now();
    let mut report = ProbeReport {
        candidate,
        opened: false,
        buffer_depth_applied: false,
        first_frame_after: None,
        width: None,
        height: None,
        elapsed_ms: 0,
        error: None,
    };

    let mut device = match driver.open(candidate) {
        Ok(device) => device,
        Err(err) => {
            report.error = Some(format!("{:#}", err));
            report.elapsed_ms = started.elapsed().as_millis();
            return report;
        }
    };
    report.opened = true;
    report.buffer_depth_applied = device
        .set_buffer_depth(config.session.buffer_depth)
        .is_ok();

    for attempt in 1..=config.session.warmup_reads {
        match device.read() {
            Ok(frame) => {
                report.first_frame_after = Some(attempt);
                report.width = Some(frame.width);
                report.height = Some(frame.height);
                break;
            }
            Err(err) => report.error = Some(format!("{:#}", err)),
        }
    }
    if report.first_frame_after.is_some() {
        report.error = None;
    }

    device.release();
    report.elapsed_ms = started.elapsed().as_millis();
    report
}

fn build_driver(kind: CameraKind, config: &RunnerConfig) -> Result<Box<dyn CameraDriver>> {
    match kind {
        CameraKind::Synthetic => Ok(Box::new(SyntheticDriver::new(SyntheticConfig {
            width: config.capture.width,
            height: config.capture.height,
        }))),
        CameraKind::V4l2 => v4l2_driver(config),
    }
}

#[cfg(feature = "capture-v4l2")]
fn v4l2_driver(config: &RunnerConfig) -> Result<Box<dyn CameraDriver>> {
    use gesture_runner::{V4l2Config, V4l2Driver};
    Ok(Box::new(V4l2Driver::new(V4l2Config {
        target_fps: config.capture.target_fps,
        width: config.capture.width,
        height: config.capture.height,
    })))
}

#[cfg(not(feature = "capture-v4l2"))]
fn v4l2_driver(_config: &RunnerConfig) -> Result<Box<dyn CameraDriver>> {
    Err(anyhow!(
        "camera_check was built without V4L2 support (enable the capture-v4l2 feature)"
    ))
}
