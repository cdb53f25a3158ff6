mod backend;
mod backends;
mod result;
mod selection;

pub use backend::HandDetector;
pub use backends::{
    upright_hand, CannedGesture, DetectorProbe, ScriptedDetector, ScriptedStep,
};
pub use result::HandDetection;
pub use selection::{DetectionPolicy, HandSelection};
