//! Skeleton overlay for the camera preview panel.

use crate::frame::Frame;
use crate::landmarks::{HandPose, Landmark, HAND_CONNECTIONS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayStyle {
    pub bone_rgb: [u8; 3],
    pub joint_rgb: [u8; 3],
    /// Joint marker half-width in pixels.
    pub joint_radius: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            bone_rgb: [255, 255, 255],
            joint_rgb: [220, 40, 40],
            joint_radius: 2,
        }
    }
}

/// Draw the hand skeleton onto `frame`. Off-frame parts are clipped.
pub fn draw_skeleton(frame: &mut Frame, pose: &HandPose, style: &OverlayStyle) {
    for (a, b) in HAND_CONNECTIONS {
        let from = to_pixel(frame, pose.landmark(a));
        let to = to_pixel(frame, pose.landmark(b));
        draw_line(frame, from, to, style.bone_rgb);
    }
    let r = style.joint_radius as i64;
    for landmark in pose.landmarks() {
        let (cx, cy) = to_pixel(frame, *landmark);
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                frame.put_pixel(x, y, style.joint_rgb);
            }
        }
    }
}

fn to_pixel(frame: &Frame, point: Landmark) -> (i64, i64) {
    let x = (point.x * frame.width as f32).round();
    let y = (point.y * frame.height as f32).round();
    // Clamp far outliers so the line walk stays bounded.
    let limit = 4.0 * frame.width.max(frame.height) as f32;
    (
        x.clamp(-limit, limit) as i64,
        y.clamp(-limit, limit) as i64,
    )
}

/// Bresenham line.
fn draw_line(frame: &mut Frame, from: (i64, i64), to: (i64, i64), rgb: [u8; 3]) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        frame.put_pixel(x, y, rgb);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
