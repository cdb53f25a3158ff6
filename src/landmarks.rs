//! Hand landmark model.
//!
//! A `HandPose` is the 21-point hand skeleton reported by the landmark
//! detector for one hand in one frame. Coordinates are normalized to the
//! mirrored camera frame: `(0, 0)` is top-left, `y` grows downward.
//!
//! The landmark array is private and both public constructors reject
//! NaN/infinite coordinates, so every `HandPose` holds exactly
//! `LANDMARK_COUNT` finite points.

use serde::{Deserialize, Serialize};

/// Number of landmarks in a hand pose.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Skeleton edges used by the preview overlay.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC),
    (THUMB_CMC, THUMB_MCP),
    (THUMB_MCP, THUMB_IP),
    (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP),
    (INDEX_MCP, INDEX_PIP),
    (INDEX_PIP, INDEX_DIP),
    (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP),
    (MIDDLE_MCP, MIDDLE_PIP),
    (MIDDLE_PIP, MIDDLE_DIP),
    (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP),
    (RING_MCP, RING_PIP),
    (RING_PIP, RING_DIP),
    (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP),
    (WRIST, PINKY_MCP),
    (PINKY_MCP, PINKY_PIP),
    (PINKY_PIP, PINKY_DIP),
    (PINKY_DIP, PINKY_TIP),
];

/// A single normalized 2D keypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Full landmark set for one detected hand in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandPose {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandPose {
    /// `None` when any coordinate is NaN/infinite.
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Option<Self> {
        if !landmarks.iter().all(Landmark::is_finite) {
            return None;
        }
        Some(Self { landmarks })
    }

    /// Wrap points the crate generated itself from finite constants.
    pub(crate) fn from_finite(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        debug_assert!(landmarks.iter().all(Landmark::is_finite));
        Self { landmarks }
    }

    /// Build a pose from a detector point list.
    ///
    /// Returns `None` when the list does not hold exactly `LANDMARK_COUNT`
    /// points or any coordinate is NaN/infinite.
    pub fn from_points(points: &[Landmark]) -> Option<Self> {
        let landmarks: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Self::new(landmarks)
    }

    pub fn landmark(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[WRIST]
    }

    pub fn index_tip(&self) -> Landmark {
        self.landmarks[INDEX_TIP]
    }

    /// Axis-aligned bounds as `(min, max)` corners.
    pub fn bounds(&self) -> (Landmark, Landmark) {
        let mut min = self.landmarks[0];
        let mut max = self.landmarks[0];
        for point in &self.landmarks[1..] {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        (min, max)
    }

    /// Area of the bounding box in normalized units.
    pub fn bounding_area(&self) -> f32 {
        let (min, max) = self.bounds();
        (max.x - min.x) * (max.y - min.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(count: usize) -> Vec<Landmark> {
        (0..count)
            .map(|i| Landmark::new(i as f32 / 40.0, 1.0 - i as f32 / 40.0))
            .collect()
    }

    #[test]
    fn from_points_requires_exact_count() {
        assert!(HandPose::from_points(&points(LANDMARK_COUNT)).is_some());
        assert!(HandPose::from_points(&points(LANDMARK_COUNT - 1)).is_none());
        assert!(HandPose::from_points(&points(LANDMARK_COUNT + 1)).is_none());
        assert!(HandPose::from_points(&[]).is_none());
    }

    #[test]
    fn from_points_rejects_non_finite_coordinates() {
        let mut pts = points(LANDMARK_COUNT);
        pts[INDEX_TIP].x = f32::NAN;
        assert!(HandPose::from_points(&pts).is_none());
    }

    #[test]
    fn new_rejects_non_finite_coordinates() {
        let mut pts = [Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        assert!(HandPose::new(pts).is_some());
        pts[INDEX_TIP].y = f32::INFINITY;
        assert!(HandPose::new(pts).is_none());
        pts[INDEX_TIP] = Landmark::new(f32::NAN, 0.5);
        assert!(HandPose::new(pts).is_none());
    }

    #[test]
    fn bounds_cover_all_points() {
        let pose = HandPose::from_points(&points(LANDMARK_COUNT)).unwrap();
        let (min, max) = pose.bounds();
        assert_eq!(min.x, 0.0);
        assert_eq!(max.x, 20.0 / 40.0);
        assert_eq!(min.y, 1.0 - 20.0 / 40.0);
        assert_eq!(max.y, 1.0);
        assert!((pose.bounding_area() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn connections_stay_in_range() {
        for (a, b) in HAND_CONNECTIONS {
            assert!(a < LANDMARK_COUNT && b < LANDMARK_COUNT);
        }
    }
}
