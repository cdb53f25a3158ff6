//! Camera lifecycle and self-healing.
//!
//! `CameraSession` owns at most one open capture device and hands out one
//! frame per call, or says the camera is unavailable this tick. It never
//! returns an error to the game loop:
//!
//! - `open()` probes candidates in priority order. A candidate only counts
//!   once it has produced a real frame within the warm-up budget; drivers
//!   that report "open" but never deliver are released and skipped.
//! - While open, each failed read bumps a consecutive-failure counter
//!   (`Degraded`). Reaching the threshold forces a full `open()` cycle and
//!   resets the counter whatever the outcome.
//! - While closed, `read_frame()` retries `open()` on a tick cadence.
//! - `release()` is idempotent and also runs on drop.

use serde::Serialize;
use std::fmt;

use crate::capture::{default_candidates, CameraCandidate, CameraDriver, CaptureDevice};
use crate::frame::Frame;

pub const DEFAULT_WARMUP_READS: u32 = 4;
pub const DEFAULT_BUFFER_DEPTH: u32 = 1;
pub const DEFAULT_REOPEN_AFTER_FAILURES: u32 = 20;

/// Tuning for a `CameraSession`.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Devices to try, highest priority first.
    pub candidates: Vec<CameraCandidate>,
    /// Reads allowed per candidate before it is written off.
    pub warmup_reads: u32,
    /// Internal driver queue depth. 1 keeps frames fresh.
    pub buffer_depth: u32,
    /// Consecutive read failures that force a reopen.
    pub reopen_after_failures: u32,
    /// While closed, attempt `open()` once every this many `read_frame` calls.
    pub closed_retry_ticks: u32,
    /// Flip frames horizontally so the preview behaves like a mirror.
    pub mirror: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            warmup_reads: DEFAULT_WARMUP_READS,
            buffer_depth: DEFAULT_BUFFER_DEPTH,
            reopen_after_failures: DEFAULT_REOPEN_AFTER_FAILURES,
            closed_retry_ticks: 1,
            mirror: true,
        }
    }
}

impl SessionConfig {
    /// Raise zero counts to 1 so the state machine always makes progress.
    fn clamped(mut self) -> Self {
        let original = (
            self.warmup_reads,
            self.reopen_after_failures,
            self.closed_retry_ticks,
        );
        self.warmup_reads = self.warmup_reads.max(1);
        self.reopen_after_failures = self.reopen_after_failures.max(1);
        self.closed_retry_ticks = self.closed_retry_ticks.max(1);
        if original
            != (
                self.warmup_reads,
                self.reopen_after_failures,
                self.closed_retry_ticks,
            )
        {
            log::warn!(
                "CameraSession: zero counts in session config raised to 1 (warmup_reads={}, reopen_after_failures={}, closed_retry_ticks={})",
                original.0,
                original.1,
                original.2
            );
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.candidates.is_empty() {
            anyhow::bail!("at least one camera candidate is required");
        }
        if self.warmup_reads == 0 {
            anyhow::bail!("warmup_reads must be greater than zero");
        }
        if self.reopen_after_failures == 0 {
            anyhow::bail!("reopen_after_failures must be greater than zero");
        }
        if self.closed_retry_ticks == 0 {
            anyhow::bail!("closed_retry_ticks must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No device held.
    Closed,
    /// Device held, last read succeeded.
    Open,
    /// Device held, recent reads failing but below the reopen threshold.
    Degraded,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::Open => "open",
            SessionState::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// Why no frame was produced this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unavailable {
    /// No candidate could be opened (or the retry cadence skipped this tick).
    NoDevice,
    /// A device is held but this read failed.
    ReadFailed,
}

/// Result of one `read_frame` call.
#[derive(Debug)]
pub enum FrameRead {
    Ready(Frame),
    Unavailable(Unavailable),
}

impl FrameRead {
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            FrameRead::Ready(frame) => Some(frame),
            FrameRead::Unavailable(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FrameRead::Ready(_))
    }
}

/// Counters for health logging.
#[derive(Clone, Debug, Serialize)]
pub struct SessionStats {
    pub state: SessionState,
    pub active: Option<CameraCandidate>,
    pub frames_captured: u64,
    pub read_failures: u64,
    pub consecutive_failures: u32,
    pub open_attempts: u64,
    pub successful_opens: u64,
    pub forced_reopens: u64,
}

struct ActiveDevice {
    candidate: CameraCandidate,
    handle: Box<dyn CaptureDevice>,
}

pub struct CameraSession {
    driver: Box<dyn CameraDriver>,
    config: SessionConfig,
    device: Option<ActiveDevice>,
    consecutive_failures: u32,
    closed_ticks: u32,
    /// Set after a failed `open()` so "no camera" is logged once per outage.
    outage_logged: bool,
    frames_captured: u64,
    read_failures: u64,
    open_attempts: u64,
    successful_opens: u64,
    forced_reopens: u64,
}

impl CameraSession {
    /// Create a closed session. Nothing is opened until `open()` or the
    /// first `read_frame()`. Zero counts in `config` are treated as 1.
    pub fn new(driver: Box<dyn CameraDriver>, config: SessionConfig) -> Self {
        Self {
            driver,
            config: config.clamped(),
            device: None,
            consecutive_failures: 0,
            closed_ticks: 0,
            outage_logged: false,
            frames_captured: 0,
            read_failures: 0,
            open_attempts: 0,
            successful_opens: 0,
            forced_reopens: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Release any held device, then probe candidates until one yields a
    /// frame. Returns whether a device is now held.
    pub fn open(&mut self) -> bool {
        self.release();
        self.open_attempts += 1;

        let candidates = self.config.candidates.clone();
        for candidate in candidates {
            let mut handle = match self.driver.open(candidate) {
                Ok(handle) => handle,
                Err(err) => {
                    log::debug!("CameraSession: {} did not open: {:#}", candidate, err);
                    continue;
                }
            };

            if let Err(err) = handle.set_buffer_depth(self.config.buffer_depth) {
                log::debug!(
                    "CameraSession: {} ignored buffer depth {}: {:#}",
                    candidate,
                    self.config.buffer_depth,
                    err
                );
            }

            if self.warm_up(candidate, handle.as_mut()) {
                log::info!(
                    "CameraSession: opened {} via {} driver",
                    candidate,
                    self.driver.name()
                );
                self.device = Some(ActiveDevice { candidate, handle });
                self.consecutive_failures = 0;
                self.closed_ticks = 0;
                self.outage_logged = false;
                self.successful_opens += 1;
                return true;
            }

            log::debug!(
                "CameraSession: {} opened but produced no frame in {} reads",
                candidate,
                self.config.warmup_reads
            );
            handle.release();
        }

        if !self.outage_logged {
            log::warn!(
                "CameraSession: no camera available ({} candidates tried); will keep retrying",
                self.config.candidates.len()
            );
            self.outage_logged = true;
        }
        false
    }

    fn warm_up(&self, candidate: CameraCandidate, handle: &mut dyn CaptureDevice) -> bool {
        for attempt in 1..=self.config.warmup_reads {
            match handle.read() {
                Ok(_) => return true,
                Err(err) => log::debug!(
                    "CameraSession: warm-up read {}/{} on {} failed: {:#}",
                    attempt,
                    self.config.warmup_reads,
                    candidate,
                    err
                ),
            }
        }
        false
    }

    /// One frame, or the reason there is none this tick.
    pub fn read_frame(&mut self) -> FrameRead {
        if self.device.is_none() {
            let due = self.closed_ticks % self.config.closed_retry_ticks == 0;
            self.closed_ticks = self.closed_ticks.wrapping_add(1);
            if !due || !self.open() {
                return FrameRead::Unavailable(Unavailable::NoDevice);
            }
        }

        let Some(active) = self.device.as_mut() else {
            return FrameRead::Unavailable(Unavailable::NoDevice);
        };

        match active.handle.read() {
            Ok(mut frame) => {
                self.consecutive_failures = 0;
                self.frames_captured += 1;
                if self.config.mirror {
                    frame.mirror_horizontal();
                }
                FrameRead::Ready(frame)
            }
            Err(err) => {
                self.read_failures += 1;
                self.consecutive_failures += 1;
                log::debug!(
                    "CameraSession: read failed on {} ({}/{}): {:#}",
                    active.candidate,
                    self.consecutive_failures,
                    self.config.reopen_after_failures,
                    err
                );
                if self.consecutive_failures >= self.config.reopen_after_failures {
                    log::warn!(
                        "CameraSession: {} consecutive read failures on {}; reopening",
                        self.consecutive_failures,
                        active.candidate
                    );
                    self.forced_reopens += 1;
                    self.open();
                    self.consecutive_failures = 0;
                }
                FrameRead::Unavailable(Unavailable::ReadFailed)
            }
        }
    }

    /// Give the device back. Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(mut active) = self.device.take() {
            active.handle.release();
            log::debug!("CameraSession: released {}", active.candidate);
        }
        self.consecutive_failures = 0;
    }

    pub fn state(&self) -> SessionState {
        match (&self.device, self.consecutive_failures) {
            (None, _) => SessionState::Closed,
            (Some(_), 0) => SessionState::Open,
            (Some(_), _) => SessionState::Degraded,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn active_candidate(&self) -> Option<CameraCandidate> {
        self.device.as_ref().map(|active| active.candidate)
    }

    /// Healthy while a device is held and the last read succeeded.
    pub fn is_healthy(&self) -> bool {
        self.state() == SessionState::Open
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            state: self.state(),
            active: self.active_candidate(),
            frames_captured: self.frames_captured,
            read_failures: self.read_failures,
            consecutive_failures: self.consecutive_failures,
            open_attempts: self.open_attempts,
            successful_opens: self.successful_opens,
            forced_reopens: self.forced_reopens,
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
