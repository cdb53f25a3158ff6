//! Gesture Runner control pipeline
//!
//! Turns a live webcam feed into discrete game controls for a side-scrolling
//! runner. A player steers with one hand: move left/right, jump, crouch, and
//! attack with a fist.
//!
//! # Architecture
//!
//! One game tick runs three stages, synchronously and in order:
//!
//! 1. **Capture**: `CameraSession` reads a mirrored RGB frame, or reports the
//!    camera unavailable. It self-heals: dead candidates are skipped during
//!    open, and a run of failed reads forces a reopen.
//! 2. **Detect**: an external `HandDetector` reports zero or more hand
//!    landmark sets; `DetectionPolicy` picks exactly one.
//! 3. **Classify**: `GestureClassifier` maps the 21 landmarks to `Controls`.
//!
//! `GestureController` owns the camera and the detector and is the only
//! thing the game loop talks to. Every failure path yields
//! `Controls::NEUTRAL`; the game never sees an error mid-loop.
//!
//! # Module Structure
//!
//! - `landmarks`: hand landmark indices, `Landmark`, `HandPose`
//! - `controls`: `Controls`, `Direction`, `GestureLabel`, keyboard merge
//! - `classifier`: thresholds and the pure landmark-to-controls rules
//! - `frame`: owned RGB frames
//! - `capture`: camera drivers (synthetic, V4L2) and pixel normalization
//! - `session`: camera lifecycle state machine
//! - `detect`: detector trait, hand selection, scripted detector
//! - `overlay`: skeleton drawing for the preview panel
//! - `controller`: per-tick orchestration
//! - `config`: `RunnerConfig` file and environment loading

pub mod capture;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod controls;
pub mod detect;
pub mod frame;
pub mod landmarks;
pub mod overlay;
pub mod session;

pub use capture::{
    default_candidates, BackendHint, CameraCandidate, CameraDriver, CaptureDevice, PixelFormat,
    SyntheticConfig, SyntheticDriver, SyntheticRig,
};
#[cfg(feature = "capture-v4l2")]
pub use capture::{V4l2Config, V4l2Driver};
pub use classifier::{open_finger_count, GestureClassifier, GestureThresholds};
pub use config::RunnerConfig;
pub use controller::{GestureController, TickOutput};
pub use controls::{Controls, Direction, GestureLabel, KeyboardInput, PlayerIntent};
pub use detect::{
    CannedGesture, DetectionPolicy, DetectorProbe, HandDetection, HandDetector, HandSelection,
    ScriptedDetector, ScriptedStep,
};
pub use frame::Frame;
pub use landmarks::{HandPose, Landmark, LANDMARK_COUNT};
pub use overlay::{draw_skeleton, OverlayStyle};
pub use session::{
    CameraSession, FrameRead, SessionConfig, SessionState, SessionStats, Unavailable,
};
