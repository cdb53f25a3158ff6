//! Synthetic capture driver.
//!
//! `SyntheticDriver` stands in for a webcam in tests and demos. A shared
//! `SyntheticRig` handle scripts its behaviour from the outside:
//! - which candidates open (all by default)
//! - how many upcoming reads fail
//! - counters for opens, reads and releases
//!
//! The rig is shared through an `Arc<Mutex<_>>` so a test can keep scripting
//! after the driver has been moved into a `CameraSession`.

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{CameraCandidate, CameraDriver, CaptureDevice};
use crate::frame::Frame;

/// Configuration for a synthetic driver.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
        }
    }
}

#[derive(Debug, Default)]
struct RigState {
    /// `None` means every candidate opens.
    available: Option<Vec<CameraCandidate>>,
    pending_failures: u32,
    open_attempts: Vec<CameraCandidate>,
    opened: u64,
    reads: u64,
    failed_reads: u64,
    releases: u64,
    buffer_depth: Option<u32>,
}

/// Shared control handle for a `SyntheticDriver`.
#[derive(Clone, Debug, Default)]
pub struct SyntheticRig {
    state: Arc<Mutex<RigState>>,
}

impl SyntheticRig {
    fn lock(&self) -> MutexGuard<'_, RigState> {
        // Plain counters; a poisoned lock still holds consistent data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Restrict which candidates open. An empty list makes every open fail.
    pub fn set_available(&self, candidates: Vec<CameraCandidate>) {
        self.lock().available = Some(candidates);
    }

    /// Let every candidate open again.
    pub fn allow_all(&self) {
        self.lock().available = None;
    }

    /// Make the next `count` reads fail (across devices).
    pub fn fail_next_reads(&self, count: u32) {
        self.lock().pending_failures += count;
    }

    pub fn pending_failures(&self) -> u32 {
        self.lock().pending_failures
    }

    /// Every candidate `open` was called with, in order.
    pub fn open_attempts(&self) -> Vec<CameraCandidate> {
        self.lock().open_attempts.clone()
    }

    /// Successful opens.
    pub fn opened(&self) -> u64 {
        self.lock().opened
    }

    pub fn reads(&self) -> u64 {
        self.lock().reads
    }

    pub fn failed_reads(&self) -> u64 {
        self.lock().failed_reads
    }

    /// Device handles released (repeat releases of one handle count once).
    pub fn releases(&self) -> u64 {
        self.lock().releases
    }

    pub fn buffer_depth(&self) -> Option<u32> {
        self.lock().buffer_depth
    }
}

/// Synthetic camera driver.
pub struct SyntheticDriver {
    config: SyntheticConfig,
    rig: SyntheticRig,
}

impl SyntheticDriver {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            rig: SyntheticRig::default(),
        }
    }

    /// Handle for scripting and observing this driver.
    pub fn rig(&self) -> SyntheticRig {
        self.rig.clone()
    }
}

impl Default for SyntheticDriver {
    fn default() -> Self {
        Self::new(SyntheticConfig::default())
    }
}

impl CameraDriver for SyntheticDriver {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn open(&mut self, candidate: CameraCandidate) -> Result<Box<dyn CaptureDevice>> {
        let mut state = self.rig.lock();
        state.open_attempts.push(candidate);
        if let Some(available) = &state.available {
            if !available.contains(&candidate) {
                return Err(anyhow!("synthetic {} is not available", candidate));
            }
        }
        state.opened += 1;
        drop(state);

        log::debug!("SyntheticDriver: opened {}", candidate);
        Ok(Box::new(SyntheticDevice {
            config: self.config.clone(),
            rig: self.rig.clone(),
            frame_count: 0,
            released: false,
        }))
    }
}

struct SyntheticDevice {
    config: SyntheticConfig,
    rig: SyntheticRig,
    frame_count: u64,
    released: bool,
}

impl SyntheticDevice {
    /// Diagonal gradient that drifts one pixel per frame.
    fn generate_synthetic_pixels(&self) -> Vec<u8> {
        let (w, h) = (self.config.width as u64, self.config.height as u64);
        let mut pixels = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let shade = ((x + y + self.frame_count) % 256) as u8;
                pixels.extend_from_slice(&[shade, (y % 256) as u8, 255 - shade]);
            }
        }
        pixels
    }
}

impl CaptureDevice for SyntheticDevice {
    fn set_buffer_depth(&mut self, frames: u32) -> Result<()> {
        self.rig.lock().buffer_depth = Some(frames);
        Ok(())
    }

    fn read(&mut self) -> Result<Frame> {
        if self.released {
            return Err(anyhow!("synthetic device already released"));
        }
        {
            let mut state = self.rig.lock();
            state.reads += 1;
            if state.pending_failures > 0 {
                state.pending_failures -= 1;
                state.failed_reads += 1;
                return Err(anyhow!("synthetic read failure"));
            }
        }
        self.frame_count += 1;
        Frame::from_rgb(
            self.generate_synthetic_pixels(),
            self.config.width,
            self.config.height,
        )
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.rig.lock().releases += 1;
    }
}

impl Drop for SyntheticDevice {
    fn drop(&mut self) {
        self.release();
    }
}
