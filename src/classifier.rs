//! Hand pose → control vector classification.
//!
//! `GestureClassifier` is a pure function over one `HandPose`. It keeps no
//! state between calls beyond its thresholds, so the same pose always yields
//! the same `Controls`. No smoothing is applied: a hand hovering on a
//! threshold can flip the label from one tick to the next.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::controls::{Controls, Direction};
use crate::landmarks::{
    HandPose, Landmark, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP,
    RING_PIP, RING_TIP,
};

/// `(tip, pip)` pairs for the four non-thumb fingers.
pub const FINGER_JOINTS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

/// Tunable classification thresholds (normalized frame units).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GestureThresholds {
    /// Index tip x below this steers left.
    pub left_x: f32,
    /// Index tip x above this steers right.
    pub right_x: f32,
    /// Index tip y below this (hand raised) jumps.
    pub jump_tip_y: f32,
    /// Wrist y above this (hand lowered) crouches.
    pub crouch_wrist_y: f32,
    /// Open fingers required for jump and crouch.
    pub min_open_fingers: u8,
    /// At or below this many open fingers the hand is a fist.
    pub max_fist_fingers: u8,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            left_x: 0.38,
            right_x: 0.62,
            jump_tip_y: 0.27,
            crouch_wrist_y: 0.72,
            min_open_fingers: 2,
            max_fist_fingers: 1,
        }
    }
}

impl GestureThresholds {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("left_x", self.left_x),
            ("right_x", self.right_x),
            ("jump_tip_y", self.jump_tip_y),
            ("crouch_wrist_y", self.crouch_wrist_y),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!(
                    "threshold {} must be within [0, 1], got {}",
                    name,
                    value
                ));
            }
        }
        if self.left_x > self.right_x {
            return Err(anyhow!(
                "left_x ({}) must not exceed right_x ({})",
                self.left_x,
                self.right_x
            ));
        }
        let fingers = FINGER_JOINTS.len() as u8;
        if self.min_open_fingers > fingers || self.max_fist_fingers > fingers {
            return Err(anyhow!("finger counts must be at most {}", fingers));
        }
        Ok(())
    }
}

/// True when the finger's tip sits above its pip joint in image space.
pub fn finger_open(pose: &HandPose, tip: usize, pip: usize) -> bool {
    pose.landmark(tip).y < pose.landmark(pip).y
}

/// Number of extended non-thumb fingers, `0..=4`.
pub fn open_finger_count(pose: &HandPose) -> u8 {
    FINGER_JOINTS
        .iter()
        .filter(|(tip, pip)| finger_open(pose, *tip, *pip))
        .count() as u8
}

#[derive(Clone, Debug, Default)]
pub struct GestureClassifier {
    thresholds: GestureThresholds,
}

impl GestureClassifier {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    /// Steering from the index tip x-coordinate. The band between the two
    /// thresholds (inclusive) is a dead zone.
    pub fn direction(&self, index_tip_x: f32) -> Direction {
        if index_tip_x < self.thresholds.left_x {
            Direction::Left
        } else if index_tip_x > self.thresholds.right_x {
            Direction::Right
        } else {
            Direction::Neutral
        }
    }

    pub fn classify(&self, pose: &HandPose) -> Controls {
        let t = &self.thresholds;
        let open = open_finger_count(pose);
        let index_tip = pose.index_tip();
        let wrist = pose.wrist();

        let direction = self.direction(index_tip.x);
        let jump = index_tip.y < t.jump_tip_y && open >= t.min_open_fingers;
        let crouch = wrist.y > t.crouch_wrist_y && open >= t.min_open_fingers;
        let attack = open <= t.max_fist_fingers;

        Controls::from_signals(direction, jump, crouch, attack)
    }

    /// Classify a raw detector point list. Malformed input counts as no hand.
    pub fn classify_points(&self, points: &[Landmark]) -> Controls {
        match HandPose::from_points(points) {
            Some(pose) => self.classify(&pose),
            None => Controls::NEUTRAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::GestureLabel;
    use crate::landmarks::{LANDMARK_COUNT, WRIST};

    /// Pose with `open` fingers extended (index first), index tip at
    /// `(tip_x, tip_y)` and the wrist at `wrist_y`.
    fn pose(open: usize, tip_x: f32, tip_y: f32, wrist_y: f32) -> HandPose {
        let mut points = [Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        points[WRIST] = Landmark::new(0.5, wrist_y);
        for (finger, (tip, pip)) in FINGER_JOINTS.iter().enumerate() {
            let (tip_y_f, pip_y) = if finger == 0 {
                if finger < open {
                    (tip_y, tip_y + 0.05)
                } else {
                    (tip_y, tip_y - 0.05)
                }
            } else if finger < open {
                (0.40, 0.45)
            } else {
                (0.50, 0.45)
            };
            points[*tip] = Landmark::new(0.5, tip_y_f);
            points[*pip] = Landmark::new(0.5, pip_y);
        }
        points[INDEX_TIP].x = tip_x;
        HandPose::new(points).expect("finite test pose")
    }

    fn classifier() -> GestureClassifier {
        GestureClassifier::default()
    }

    #[test]
    fn open_count_tracks_extended_fingers() {
        for open in 0..=4 {
            let p = pose(open, 0.5, 0.5, 0.5);
            assert_eq!(open_finger_count(&p), open as u8);
        }
    }

    #[test]
    fn classify_is_repeatable() {
        let c = classifier();
        let p = pose(3, 0.7, 0.2, 0.8);
        let first = c.classify(&p);
        for _ in 0..10 {
            assert_eq!(c.classify(&p), first);
        }
    }

    #[test]
    fn direction_boundaries_are_strict() {
        let c = classifier();
        assert_eq!(c.direction(0.38), Direction::Neutral);
        assert_eq!(c.direction(0.379_99), Direction::Left);
        assert_eq!(c.direction(0.62), Direction::Neutral);
        assert_eq!(c.direction(0.620_001), Direction::Right);
        assert_eq!(c.direction(0.5), Direction::Neutral);
    }

    #[test]
    fn closed_fist_attacks_anywhere() {
        let c = classifier();
        for (x, tip_y, wrist_y) in [(0.1, 0.1, 0.9), (0.9, 0.5, 0.5), (0.5, 0.2, 0.8)] {
            let controls = c.classify(&pose(0, x, tip_y, wrist_y));
            assert!(controls.attack);
            assert!(!controls.jump);
            assert!(!controls.crouch);
            assert_eq!(controls.label, GestureLabel::Attack);
        }
    }

    #[test]
    fn one_open_finger_still_attacks() {
        let controls = classifier().classify(&pose(1, 0.5, 0.2, 0.5));
        assert!(controls.attack);
        assert!(!controls.jump);
        assert_eq!(controls.label, GestureLabel::Attack);
    }

    #[test]
    fn raised_open_hand_jumps() {
        let controls = classifier().classify(&pose(3, 0.5, 0.20, 0.50));
        assert!(controls.jump);
        assert!(!controls.crouch);
        assert!(!controls.attack);
        assert_eq!(controls.direction, Direction::Neutral);
        assert_eq!(controls.label, GestureLabel::Jump);
    }

    #[test]
    fn lowered_hand_crouch_beats_move() {
        let controls = classifier().classify(&pose(4, 0.1, 0.50, 0.80));
        assert!(controls.crouch);
        assert!(!controls.jump);
        assert_eq!(controls.direction, Direction::Left);
        assert_eq!(controls.label, GestureLabel::Crouch);
    }

    #[test]
    fn open_hand_off_centre_moves() {
        let controls = classifier().classify(&pose(4, 0.8, 0.5, 0.5));
        assert_eq!(controls.direction, Direction::Right);
        assert_eq!(controls.label, GestureLabel::Move);
    }

    #[test]
    fn centred_open_hand_is_idle() {
        let controls = classifier().classify(&pose(4, 0.5, 0.5, 0.5));
        assert_eq!(controls, Controls::NEUTRAL);
    }

    #[test]
    fn malformed_points_are_neutral() {
        let c = classifier();
        let short = vec![Landmark::new(0.1, 0.1); LANDMARK_COUNT - 1];
        assert_eq!(c.classify_points(&short), Controls::NEUTRAL);
        assert_eq!(c.classify_points(&[]), Controls::NEUTRAL);
    }

    #[test]
    fn nan_landmarks_are_neutral_not_attack() {
        let c = classifier();
        let mut points = [Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        points[INDEX_TIP] = Landmark::new(0.5, f32::NAN);
        assert!(HandPose::new(points).is_none());
        assert_eq!(c.classify_points(&points), Controls::NEUTRAL);
    }

    #[test]
    fn custom_thresholds_move_the_dead_zone() {
        let c = GestureClassifier::new(GestureThresholds {
            left_x: 0.2,
            right_x: 0.8,
            ..GestureThresholds::default()
        });
        assert_eq!(c.direction(0.3), Direction::Neutral);
        assert_eq!(c.direction(0.7), Direction::Neutral);
        assert_eq!(c.direction(0.1), Direction::Left);
    }

    #[test]
    fn thresholds_validate() {
        assert!(GestureThresholds::default().validate().is_ok());
        let inverted = GestureThresholds {
            left_x: 0.7,
            right_x: 0.3,
            ..GestureThresholds::default()
        };
        assert!(inverted.validate().is_err());
        let out_of_range = GestureThresholds {
            jump_tip_y: 1.5,
            ..GestureThresholds::default()
        };
        assert!(out_of_range.validate().is_err());
        let too_many = GestureThresholds {
            min_open_fingers: 5,
            ..GestureThresholds::default()
        };
        assert!(too_many.validate().is_err());
    }
}
