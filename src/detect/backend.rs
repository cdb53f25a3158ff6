use anyhow::Result;

use crate::detect::result::HandDetection;
use crate::frame::Frame;

/// Hand landmark detector trait.
///
/// Detection itself is an external capability (a landmark model, a hardware
/// tracker, a test script). The controller only needs zero or more landmark
/// sets per frame and a way to free the detector's resources.
pub trait HandDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB frame.
    ///
    /// Implementations must treat the frame as read-only and must not retain
    /// it past the call. Points are normalized to the frame as given (already
    /// mirrored).
    fn process(&mut self, frame: &Frame) -> Result<Vec<HandDetection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release detector resources. Called once by the owning controller.
    fn close(&mut self) {}
}
