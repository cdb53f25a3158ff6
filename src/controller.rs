//! Per-tick orchestration: camera frame in, `Controls` out.
//!
//! `GestureController` exclusively owns the camera session and the hand
//! detector. Each `tick()` runs one read, at most one detection and one
//! classification, and never fails: every unhappy path collapses into
//! `Controls::NEUTRAL`. `release()` tears down the camera first and the
//! detector second, exactly once, and also runs on drop.

use anyhow::{Context, Result};

use crate::capture::CameraDriver;
use crate::classifier::GestureClassifier;
use crate::config::RunnerConfig;
use crate::controls::Controls;
use crate::detect::{DetectionPolicy, HandDetector};
use crate::frame::Frame;
use crate::landmarks::HandPose;
use crate::overlay::{draw_skeleton, OverlayStyle};
use crate::session::{CameraSession, FrameRead, SessionStats};

/// What one tick hands to the rest of the game.
#[derive(Debug)]
pub struct TickOutput {
    pub controls: Controls,
    /// Camera frame for the preview panel, annotated when a hand was found.
    pub preview: Option<Frame>,
    /// The hand that drove `controls`, if any.
    pub hand: Option<HandPose>,
}

impl TickOutput {
    fn neutral(preview: Option<Frame>) -> Self {
        Self {
            controls: Controls::NEUTRAL,
            preview,
            hand: None,
        }
    }
}

pub struct GestureController {
    session: CameraSession,
    detector: Box<dyn HandDetector>,
    classifier: GestureClassifier,
    policy: DetectionPolicy,
    overlay: Option<OverlayStyle>,
    preview_size: Option<(u32, u32)>,
    last_controls: Controls,
    ticks: u64,
    released: bool,
}

impl GestureController {
    pub fn new(
        session: CameraSession,
        detector: Box<dyn HandDetector>,
        classifier: GestureClassifier,
        policy: DetectionPolicy,
    ) -> Self {
        Self {
            session,
            detector,
            classifier,
            policy,
            overlay: None,
            preview_size: None,
            last_controls: Controls::NEUTRAL,
            ticks: 0,
            released: false,
        }
    }

    /// Build a controller from loaded settings and warm the detector up.
    pub fn from_config(
        config: &RunnerConfig,
        driver: Box<dyn CameraDriver>,
        mut detector: Box<dyn HandDetector>,
    ) -> Result<Self> {
        detector
            .warm_up()
            .with_context(|| format!("hand detector '{}' failed to warm up", detector.name()))?;
        let session = CameraSession::new(driver, config.session.clone());
        let mut controller = Self::new(
            session,
            detector,
            GestureClassifier::new(config.thresholds),
            config.detection,
        )
        .with_preview_size(config.preview.width, config.preview.height);
        controller.overlay = config.preview.overlay;
        Ok(controller)
    }

    /// Draw the hand skeleton on preview frames.
    pub fn with_overlay(mut self, style: OverlayStyle) -> Self {
        self.overlay = Some(style);
        self
    }

    /// Downscale preview frames to a fixed panel size.
    pub fn with_preview_size(mut self, width: u32, height: u32) -> Self {
        self.preview_size = Some((width, height));
        self
    }

    /// Run one camera read and classification.
    pub fn tick(&mut self) -> TickOutput {
        if self.released {
            return TickOutput::neutral(None);
        }
        self.ticks += 1;

        let frame = match self.session.read_frame() {
            FrameRead::Ready(frame) => frame,
            FrameRead::Unavailable(_) => {
                self.record(Controls::NEUTRAL);
                return TickOutput::neutral(None);
            }
        };

        let hand = match self.detector.process(&frame) {
            Ok(detections) => self.policy.pick(&detections),
            Err(err) => {
                log::debug!(
                    "GestureController: detector '{}' failed on tick {}: {:#}",
                    self.detector.name(),
                    self.ticks,
                    err
                );
                None
            }
        };

        let controls = hand
            .as_ref()
            .map_or(Controls::NEUTRAL, |pose| self.classifier.classify(pose));
        self.record(controls);

        let mut preview = self.fit_preview(frame);
        if let (Some(style), Some(pose)) = (self.overlay.as_ref(), hand.as_ref()) {
            draw_skeleton(&mut preview, pose, style);
        }

        TickOutput {
            controls,
            preview: Some(preview),
            hand,
        }
    }

    fn fit_preview(&self, frame: Frame) -> Frame {
        let Some((width, height)) = self.preview_size else {
            return frame;
        };
        if frame.width == width && frame.height == height {
            return frame;
        }
        match frame.resized(width, height) {
            Ok(resized) => resized,
            Err(err) => {
                log::debug!("GestureController: preview resize failed: {:#}", err);
                frame
            }
        }
    }

    fn record(&mut self, controls: Controls) {
        if controls.label != self.last_controls.label {
            log::debug!(
                "GestureController: {} -> {}",
                self.last_controls.label,
                controls.label
            );
        }
        self.last_controls = controls;
    }

    /// Controls produced by the most recent tick.
    pub fn last_controls(&self) -> Controls {
        self.last_controls
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    pub fn session_stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release the camera, then the detector. Later calls do nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.session.release();
        self.detector.close();
        self.last_controls = Controls::NEUTRAL;
        log::info!(
            "GestureController: released camera and detector after {} ticks",
            self.ticks
        );
    }
}

impl Drop for GestureController {
    fn drop(&mut self) {
        self.release();
    }
}
