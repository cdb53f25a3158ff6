//! Which hand drives the controls when the detector reports several.
//!
//! Only one hand ever drives the player. Detectors report hands in their own
//! order, which is not meaningful, so the tie-break is an explicit policy.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::result::HandDetection;
use crate::landmarks::HandPose;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSelection {
    /// First hand in detector order.
    First,
    /// Most confident hand; ties keep detector order.
    #[default]
    HighestConfidence,
    /// Hand with the largest landmark bounding box (closest to the camera).
    LargestArea,
}

impl FromStr for HandSelection {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(HandSelection::First),
            "highest_confidence" | "confidence" => Ok(HandSelection::HighestConfidence),
            "largest_area" | "largest" => Ok(HandSelection::LargestArea),
            other => Err(anyhow!(
                "unknown hand selection '{}' (expected first, highest_confidence or largest_area)",
                other
            )),
        }
    }
}

/// Filtering and selection applied to raw detections each tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionPolicy {
    /// Detections below this confidence are ignored.
    pub min_confidence: f32,
    pub selection: HandSelection,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            selection: HandSelection::default(),
        }
    }
}

impl DetectionPolicy {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(anyhow!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            ));
        }
        Ok(())
    }

    /// Pick the hand that drives this tick.
    ///
    /// Malformed and low-confidence detections are dropped before selection,
    /// so a bad first result never hides a good second one.
    pub fn pick(&self, detections: &[HandDetection]) -> Option<HandPose> {
        let mut best: Option<(HandPose, f32)> = None;
        for detection in detections {
            if detection.confidence.is_nan() || detection.confidence < self.min_confidence {
                continue;
            }
            let Some(pose) = detection.pose() else {
                log::debug!(
                    "DetectionPolicy: dropping malformed hand ({} landmarks)",
                    detection.landmarks.len()
                );
                continue;
            };
            let score = match self.selection {
                HandSelection::First => return Some(pose),
                HandSelection::HighestConfidence => detection.confidence,
                HandSelection::LargestArea => pose.bounding_area(),
            };
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((pose, score));
            }
        }
        best.map(|(pose, _)| pose)
    }
}
