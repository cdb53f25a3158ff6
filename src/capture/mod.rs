//! Camera capture drivers.
//!
//! This module provides the narrow interface the camera session talks to:
//! - `CameraDriver`: opens a device for one `(index, backend)` candidate
//! - `CaptureDevice`: an open handle that yields frames until released
//! - `SyntheticDriver`: in-process driver (tests, demos, `stub` camera)
//! - `V4l2Driver`: local V4L2 devices (feature: capture-v4l2)
//!
//! Drivers produce RGB `Frame`s. Retry, warm-up and reconnect policy live in
//! `CameraSession`, not here: a driver reports failure and moves on.

pub mod normalize;
pub mod synthetic;
#[cfg(feature = "capture-v4l2")]
pub mod v4l2;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::frame::Frame;

pub use normalize::PixelFormat;
pub use synthetic::{SyntheticConfig, SyntheticDriver, SyntheticRig};
#[cfg(feature = "capture-v4l2")]
pub use v4l2::{V4l2Config, V4l2Driver};

/// Capture API preference for a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendHint {
    /// Let the driver choose.
    Any,
    DirectShow,
    MediaFoundation,
    V4l2,
}

impl fmt::Display for BackendHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendHint::Any => "any",
            BackendHint::DirectShow => "dshow",
            BackendHint::MediaFoundation => "msmf",
            BackendHint::V4l2 => "v4l2",
        };
        f.write_str(name)
    }
}

/// One `(device index, backend)` pair tried by `CameraSession::open`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraCandidate {
    pub index: u32,
    pub backend: BackendHint,
}

impl CameraCandidate {
    pub const fn new(index: u32, backend: BackendHint) -> Self {
        Self { index, backend }
    }
}

impl fmt::Display for CameraCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera {} ({})", self.index, self.backend)
    }
}

/// Candidate list in priority order for the current platform.
///
/// Windows cameras frequently refuse the default backend, so DirectShow and
/// Media Foundation are tried first there. Every platform then falls back to
/// index 0 and index 1 with whatever backend the driver picks.
pub fn default_candidates() -> Vec<CameraCandidate> {
    let mut candidates = Vec::with_capacity(4);
    if cfg!(windows) {
        candidates.push(CameraCandidate::new(0, BackendHint::DirectShow));
        candidates.push(CameraCandidate::new(0, BackendHint::MediaFoundation));
    }
    candidates.push(CameraCandidate::new(0, BackendHint::Any));
    candidates.push(CameraCandidate::new(1, BackendHint::Any));
    candidates
}

/// An open capture handle.
pub trait CaptureDevice: Send {
    /// Limit the number of frames the driver queues internally.
    fn set_buffer_depth(&mut self, frames: u32) -> Result<()>;

    /// Read the next frame. Errors are per-read; the handle stays usable.
    fn read(&mut self) -> Result<Frame>;

    /// Give the device back to the OS. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Opens capture devices.
pub trait CameraDriver: Send {
    /// Driver identifier for logs.
    fn name(&self) -> &'static str;

    /// Try to open the device described by `candidate`.
    fn open(&mut self, candidate: CameraCandidate) -> Result<Box<dyn CaptureDevice>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_candidates_end_with_index_fallbacks() {
        let candidates = default_candidates();
        let tail = &candidates[candidates.len() - 2..];
        assert_eq!(tail[0], CameraCandidate::new(0, BackendHint::Any));
        assert_eq!(tail[1], CameraCandidate::new(1, BackendHint::Any));
        assert_eq!(candidates[0].index, 0);
    }

    #[test]
    fn candidate_display_names_backend() {
        let candidate = CameraCandidate::new(0, BackendHint::MediaFoundation);
        assert_eq!(candidate.to_string(), "camera 0 (msmf)");
    }
}
