//! gesture_probe - run the gesture control loop without the game
//!
//! This binary:
//! 1. Loads `RunnerConfig` (file + environment overrides)
//! 2. Opens a camera (synthetic pattern or a local V4L2 device)
//! 3. Feeds frames to a scripted hand detector that tours every gesture
//! 4. Logs label changes and periodic camera health, or prints one JSON
//!    `Controls` object per tick with `--json`
//! 5. Releases camera and detector on Ctrl-C or after `--frames` ticks

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use gesture_runner::{
    CameraDriver, Frame, GestureController, GestureLabel, RunnerConfig, ScriptedDetector,
    SyntheticConfig, SyntheticDriver,
};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CameraKind {
    /// Moving gradient pattern, no hardware needed.
    Synthetic,
    /// Local webcam through V4L2 (requires the capture-v4l2 feature).
    V4l2,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Camera driver to use.
    #[arg(long, value_enum, default_value_t = CameraKind::Synthetic)]
    camera: CameraKind,
    /// Stop after this many ticks (0 runs until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    frames: u64,
    /// Tick rate; overrides the configured camera fps.
    #[arg(long)]
    fps: Option<u32>,
    /// Print one JSON controls object per tick instead of log lines.
    #[arg(long)]
    json: bool,
    /// Config file (.toml or .json); defaults to $GESTURE_CONFIG.
    #[arg(long, env = "GESTURE_CONFIG")]
    config: Option<PathBuf>,
    /// Save the last preview frame here on exit (requires the snapshot feature).
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Ticks each scripted gesture is held for.
    #[arg(long, default_value_t = 45)]
    hold_frames: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => RunnerConfig::load_from(path)?,
        None => RunnerConfig::load()?,
    };
    if let Some(fps) = args.fps {
        if fps == 0 {
            return Err(anyhow!("fps must be >= 1"));
        }
        config.capture.target_fps = fps;
    }

    let driver = build_driver(args.camera, &config)?;
    let detector = Box::new(ScriptedDetector::gesture_tour(args.hold_frames));
    let mut controller = GestureController::from_config(&config, driver, detector)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    let tick_interval = Duration::from_secs_f64(1.0 / config.capture.target_fps as f64);
    let mut last_health_log = Instant::now();
    let mut last_label = GestureLabel::Idle;
    let mut last_preview: Option<Frame> = None;

    log::info!(
        "gesture_probe running: camera={:?} fps={} selection={:?}",
        args.camera,
        config.capture.target_fps,
        config.detection.selection
    );

    while args.frames == 0 || controller.ticks() < args.frames {
        if rx.try_recv().is_ok() {
            log::info!("shutdown signal received, stopping...");
            break;
        }
        let started = Instant::now();

        let out = controller.tick();
        if args.json {
            println!("{}", serde_json::to_string(&out.controls)?);
        } else if out.controls.label != last_label {
            log::info!(
                "gesture {} -> {} (direction={})",
                last_label,
                out.controls.label,
                out.controls.direction.value()
            );
        }
        last_label = out.controls.label;
        if out.preview.is_some() {
            last_preview = out.preview;
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let stats = controller.session_stats();
            log::info!(
                "camera health={} state={} frames={} read_failures={} reopens={}",
                controller.session().is_healthy(),
                stats.state,
                stats.frames_captured,
                stats.read_failures,
                stats.forced_reopens
            );
            last_health_log = Instant::now();
        }

        if let Some(remaining) = tick_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    controller.release();

    if let Some(path) = args.snapshot.as_deref() {
        match last_preview {
            Some(frame) => save_snapshot(frame, path)?,
            None => log::warn!("no preview frame captured; snapshot skipped"),
        }
    }
    Ok(())
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
        "gesture_probe was built without V4L2 support (enable the capture-v4l2 feature)"
    ))
}

#[cfg(feature = "snapshot")]
fn save_snapshot(frame: Frame, path: &std::path::Path) -> Result<()> {
    use anyhow::Context;
    let (width, height) = (frame.width, frame.height);
    let image = image::RgbImage::from_raw(width, height, frame.into_pixels())
        .ok_or_else(|| anyhow!("preview buffer does not match {}x{}", width, height))?;
    image
        .save(path)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    log::info!("snapshot written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "snapshot"))]
fn save_snapshot(_frame: Frame, _path: &std::path::Path) -> Result<()> {
    Err(anyhow!(
        "gesture_probe was built without snapshot support (enable the snapshot feature)"
    ))
}
