use serde::{Deserialize, Serialize};

use crate::landmarks::{HandPose, Landmark};

/// One hand as reported by a detector.
///
/// `landmarks` is unchecked; `pose()` is the validated view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub landmarks: Vec<Landmark>,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
}

impl HandDetection {
    pub fn new(landmarks: Vec<Landmark>, confidence: f32) -> Self {
        Self {
            landmarks,
            confidence,
        }
    }

    pub fn from_pose(pose: &HandPose, confidence: f32) -> Self {
        Self::new(pose.landmarks().to_vec(), confidence)
    }

    /// `None` when the landmark set is malformed.
    pub fn pose(&self) -> Option<HandPose> {
        HandPose::from_points(&self.landmarks)
    }
}
