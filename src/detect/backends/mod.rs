pub mod scripted;

pub use scripted::{upright_hand, CannedGesture, DetectorProbe, ScriptedDetector, ScriptedStep};
