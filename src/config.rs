use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::capture::{default_candidates, BackendHint, CameraCandidate};
use crate::classifier::GestureThresholds;
use crate::detect::{DetectionPolicy, HandSelection};
use crate::overlay::OverlayStyle;
use crate::session::{
    SessionConfig, DEFAULT_BUFFER_DEPTH, DEFAULT_REOPEN_AFTER_FAILURES, DEFAULT_WARMUP_READS,
};

pub const CONFIG_ENV: &str = "GESTURE_CONFIG";

const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_CAPTURE_WIDTH: u32 = 640;
const DEFAULT_CAPTURE_HEIGHT: u32 = 480;
const DEFAULT_PREVIEW_WIDTH: u32 = 240;
const DEFAULT_PREVIEW_HEIGHT: u32 = 180;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RunnerConfigFile {
    camera: Option<CameraConfigFile>,
    gestures: Option<GestureThresholds>,
    detection: Option<DetectionConfigFile>,
    preview: Option<PreviewConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    index: Option<u32>,
    candidates: Option<Vec<CameraCandidate>>,
    warmup_reads: Option<u32>,
    buffer_depth: Option<u32>,
    reopen_after_failures: Option<u32>,
    closed_retry_ticks: Option<u32>,
    mirror: Option<bool>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectionConfigFile {
    min_confidence: Option<f32>,
    selection: Option<HandSelection>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PreviewConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    overlay: Option<bool>,
}

/// Everything the runner needs before the loop starts.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub session: SessionConfig,
    pub capture: CaptureSettings,
    pub thresholds: GestureThresholds,
    pub detection: DetectionPolicy,
    pub preview: PreviewSettings,
}

/// Requested device format. Drivers treat these as hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    pub width: u32,
    pub height: u32,
    /// `None` disables skeleton drawing.
    pub overlay: Option<OverlayStyle>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        // An empty file section resolves to the built-in defaults.
        Self::from_file(RunnerConfigFile::default())
    }
}

impl RunnerConfig {
    /// Read `GESTURE_CONFIG` (if set), then environment overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a specific file, ignoring `GESTURE_CONFIG` but still honouring
    /// the other environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: RunnerConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let candidates = match (camera.candidates, camera.index) {
            (Some(candidates), _) => candidates,
            (None, Some(index)) => vec![CameraCandidate::new(index, BackendHint::Any)],
            (None, None) => default_candidates(),
        };
        let session = SessionConfig {
            candidates,
            warmup_reads: camera.warmup_reads.unwrap_or(DEFAULT_WARMUP_READS),
            buffer_depth: camera.buffer_depth.unwrap_or(DEFAULT_BUFFER_DEPTH),
            reopen_after_failures: camera
                .reopen_after_failures
                .unwrap_or(DEFAULT_REOPEN_AFTER_FAILURES),
            closed_retry_ticks: camera.closed_retry_ticks.unwrap_or(1),
            mirror: camera.mirror.unwrap_or(true),
        };
        let capture = CaptureSettings {
            target_fps: camera.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            width: camera.width.unwrap_or(DEFAULT_CAPTURE_WIDTH),
            height: camera.height.unwrap_or(DEFAULT_CAPTURE_HEIGHT),
        };

        let defaults = DetectionPolicy::default();
        let detection = file.detection.unwrap_or_default();
        let detection = DetectionPolicy {
            min_confidence: detection.min_confidence.unwrap_or(defaults.min_confidence),
            selection: detection.selection.unwrap_or(defaults.selection),
        };

        let preview = file.preview.unwrap_or_default();
        let preview = PreviewSettings {
            width: preview.width.unwrap_or(DEFAULT_PREVIEW_WIDTH),
            height: preview.height.unwrap_or(DEFAULT_PREVIEW_HEIGHT),
            overlay: preview
                .overlay
                .unwrap_or(true)
                .then(OverlayStyle::default),
        };

        Self {
            session,
            capture,
            thresholds: file.gestures.unwrap_or_default(),
            detection,
            preview,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(index) = env_parse::<u32>("GESTURE_CAMERA_INDEX")? {
            self.session.candidates = vec![CameraCandidate::new(index, BackendHint::Any)];
        }
        if let Some(count) = env_parse::<u32>("GESTURE_REOPEN_AFTER")? {
            self.session.reopen_after_failures = count;
        }
        if let Some(reads) = env_parse::<u32>("GESTURE_WARMUP_READS")? {
            self.session.warmup_reads = reads;
        }
        if let Some(fps) = env_parse::<u32>("GESTURE_TARGET_FPS")? {
            self.capture.target_fps = fps;
        }
        if let Some(selection) = env_parse::<HandSelection>("GESTURE_HAND_SELECTION")? {
            self.detection.selection = selection;
        }
        if let Some(confidence) = env_parse::<f32>("GESTURE_MIN_CONFIDENCE")? {
            self.detection.min_confidence = confidence;
        }
        if let Some(mirror) = env_parse::<bool>("GESTURE_MIRROR")? {
            self.session.mirror = mirror;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate().context("invalid camera settings")?;
        self.thresholds
            .validate()
            .context("invalid gesture thresholds")?;
        self.detection
            .validate()
            .context("invalid detection settings")?;
        if self.capture.target_fps == 0 {
            return Err(anyhow!("target_fps must be greater than zero"));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(anyhow!("capture size must be non-zero"));
        }
        if self.preview.width == 0 || self.preview.height == 0 {
            return Err(anyhow!("preview size must be non-zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<RunnerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

/// Parse an environment override. Unset or blank means no override.
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{} has invalid value '{}': {}", name, value, e)),
        _ => Ok(None),
    }
}
