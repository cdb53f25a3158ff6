use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::detect::backend::HandDetector;
use crate::detect::result::HandDetection;
use crate::frame::Frame;
use crate::landmarks::{HandPose, Landmark, LANDMARK_COUNT, WRIST};

/// What the scripted detector reports for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptedStep {
    NoHand,
    Hands(Vec<HandDetection>),
    Fail(String),
}

impl ScriptedStep {
    /// One confident hand showing `gesture`.
    pub fn gesture(gesture: CannedGesture) -> Self {
        ScriptedStep::Hands(vec![HandDetection::from_pose(&gesture.pose(), 0.95)])
    }
}

/// Counters shared with a `ScriptedDetector` after it has been boxed.
#[derive(Clone, Debug, Default)]
pub struct DetectorProbe {
    processed: Arc<AtomicU64>,
    closes: Arc<AtomicU64>,
}

impl DetectorProbe {
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Detector that replays scripted results.
///
/// Queued steps are consumed one per frame. Once the queue is empty the
/// detector loops over its cycle, or reports no hand when there is none.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    queue: VecDeque<ScriptedStep>,
    cycle: Vec<ScriptedStep>,
    cursor: usize,
    probe: DetectorProbe,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loop over `steps` forever.
    pub fn cycling(steps: Vec<ScriptedStep>) -> Self {
        Self {
            cycle: steps,
            ..Self::default()
        }
    }

    /// Demo tour: each canned gesture held for `hold_frames` frames.
    pub fn gesture_tour(hold_frames: usize) -> Self {
        let steps = CannedGesture::ALL
            .iter()
            .flat_map(|g| std::iter::repeat(ScriptedStep::gesture(*g)).take(hold_frames.max(1)))
            .collect();
        Self::cycling(steps)
    }

    pub fn push(&mut self, step: ScriptedStep) {
        self.queue.push_back(step);
    }

    pub fn probe(&self) -> DetectorProbe {
        self.probe.clone()
    }

    fn next_step(&mut self) -> ScriptedStep {
        if let Some(step) = self.queue.pop_front() {
            return step;
        }
        if self.cycle.is_empty() {
            return ScriptedStep::NoHand;
        }
        let step = self.cycle[self.cursor % self.cycle.len()].clone();
        self.cursor = (self.cursor + 1) % self.cycle.len();
        step
    }
}

impl HandDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn process(&mut self, _frame: &Frame) -> Result<Vec<HandDetection>> {
        self.probe.processed.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            ScriptedStep::NoHand => Ok(Vec::new()),
            ScriptedStep::Hands(hands) => Ok(hands),
            ScriptedStep::Fail(reason) => Err(anyhow!("scripted detector failure: {}", reason)),
        }
    }

    fn close(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ----------------------------------------------------------------------------
// Canned poses
// ----------------------------------------------------------------------------

/// Poses that land squarely in each gesture class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CannedGesture {
    Idle,
    Left,
    Right,
    Jump,
    Crouch,
    Fist,
}

impl CannedGesture {
    pub const ALL: [CannedGesture; 6] = [
        CannedGesture::Idle,
        CannedGesture::Left,
        CannedGesture::Right,
        CannedGesture::Jump,
        CannedGesture::Crouch,
        CannedGesture::Fist,
    ];

    pub fn pose(self) -> HandPose {
        const OPEN: [bool; 4] = [true; 4];
        let points = match self {
            CannedGesture::Idle => hand_points(0.5, 0.6, OPEN),
            CannedGesture::Left => hand_points(0.2, 0.6, OPEN),
            CannedGesture::Right => hand_points(0.8, 0.6, OPEN),
            CannedGesture::Jump => hand_points(0.5, 0.45, OPEN),
            CannedGesture::Crouch => hand_points(0.5, 0.85, OPEN),
            CannedGesture::Fist => hand_points(0.5, 0.6, [false; 4]),
        };
        HandPose::from_finite(points)
    }
}

/// Upright hand with its wrist at `(center_x, wrist_y)`.
///
/// `open` lists index, middle, ring and pinky. An open finger's tip sits
/// 0.26 above the wrist; a curled one folds back below its pip joint.
/// `None` when the wrist position is not finite.
pub fn upright_hand(center_x: f32, wrist_y: f32, open: [bool; 4]) -> Option<HandPose> {
    HandPose::new(hand_points(center_x, wrist_y, open))
}

fn hand_points(center_x: f32, wrist_y: f32, open: [bool; 4]) -> [Landmark; LANDMARK_COUNT] {
    let mut points = [Landmark::default(); LANDMARK_COUNT];
    points[WRIST] = Landmark::new(center_x, wrist_y);

    let thumb = [(0.04, 0.03), (0.07, 0.06), (0.09, 0.09), (0.11, 0.11)];
    for (i, (dx, dy)) in thumb.iter().enumerate() {
        points[1 + i] = Landmark::new(center_x - dx, wrist_y - dy);
    }

    let finger_x = [-0.03, 0.0, 0.03, 0.06];
    for (finger, dx) in finger_x.iter().enumerate() {
        let base = 5 + finger * 4;
        let x = center_x + dx;
        let (dip, tip) = if open[finger] {
            (0.22, 0.26)
        } else {
            (0.15, 0.13)
        };
        points[base] = Landmark::new(x, wrist_y - 0.12);
        points[base + 1] = Landmark::new(x, wrist_y - 0.18);
        points[base + 2] = Landmark::new(x, wrist_y - dip);
        points[base + 3] = Landmark::new(x, wrist_y - tip);
    }
    points
}
