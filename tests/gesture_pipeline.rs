use anyhow::Result;
use std::sync::{Arc, Mutex};

use gesture_runner::{
    CameraSession, CannedGesture, Controls, DetectionPolicy, Direction, Frame, GestureClassifier,
    GestureController, GestureLabel, HandDetection, HandDetector, HandSelection, KeyboardInput,
    Landmark, PlayerIntent, RunnerConfig, ScriptedDetector, ScriptedStep, SessionConfig,
    SyntheticConfig, SyntheticDriver, SyntheticRig,
};

fn driver() -> (SyntheticDriver, SyntheticRig) {
    let driver = SyntheticDriver::new(SyntheticConfig {
        width: 64,
        height: 48,
    });
    let rig = driver.rig();
    (driver, rig)
}

fn controller_with(
    detector: Box<dyn HandDetector>,
    policy: DetectionPolicy,
) -> (GestureController, SyntheticRig) {
    let (driver, rig) = driver();
    let session = CameraSession::new(Box::new(driver), SessionConfig::default());
    let controller =
        GestureController::new(session, detector, GestureClassifier::default(), policy);
    (controller, rig)
}

fn scripted(steps: Vec<ScriptedStep>) -> ScriptedDetector {
    let mut detector = ScriptedDetector::new();
    for step in steps {
        detector.push(step);
    }
    detector
}

#[test]
fn no_hand_tick_is_exactly_neutral() {
    let (mut controller, _rig) =
        controller_with(Box::new(ScriptedDetector::new()), DetectionPolicy::default());
    let out = controller.tick();
    assert_eq!(
        out.controls,
        Controls {
            direction: Direction::Neutral,
            jump: false,
            crouch: false,
            attack: false,
            label: GestureLabel::Idle,
        }
    );
    assert!(out.hand.is_none());
    assert!(out.preview.is_some());
}

#[test]
fn camera_unavailable_skips_detector() {
    let detector = ScriptedDetector::cycling(vec![ScriptedStep::gesture(CannedGesture::Fist)]);
    let probe = detector.probe();
    let (mut controller, rig) = controller_with(Box::new(detector), DetectionPolicy::default());
    rig.set_available(vec![]);

    for _ in 0..3 {
        let out = controller.tick();
        assert_eq!(out.controls, Controls::NEUTRAL);
        assert!(out.preview.is_none());
    }
    assert_eq!(probe.processed(), 0);

    rig.allow_all();
    let out = controller.tick();
    assert_eq!(out.controls.label, GestureLabel::Attack);
    assert_eq!(probe.processed(), 1);
}

#[test]
fn gesture_tour_produces_every_label() {
    let (mut controller, _rig) = controller_with(
        Box::new(ScriptedDetector::gesture_tour(1)),
        DetectionPolicy::default(),
    );
    let labels: Vec<GestureLabel> = (0..CannedGesture::ALL.len())
        .map(|_| controller.tick().controls.label)
        .collect();
    assert_eq!(
        labels,
        [
            GestureLabel::Idle,
            GestureLabel::Move,
            GestureLabel::Move,
            GestureLabel::Jump,
            GestureLabel::Crouch,
            GestureLabel::Attack,
        ]
    );
}

#[test]
fn malformed_and_weak_detections_are_neutral() {
    let malformed = HandDetection::new(vec![Landmark::new(0.1, 0.1); 20], 0.99);
    let weak = HandDetection::from_pose(&CannedGesture::Fist.pose(), 0.2);
    let (mut controller, _rig) = controller_with(
        Box::new(scripted(vec![
            ScriptedStep::Hands(vec![malformed]),
            ScriptedStep::Hands(vec![weak]),
        ])),
        DetectionPolicy::default(),
    );
    assert_eq!(controller.tick().controls, Controls::NEUTRAL);
    assert_eq!(controller.tick().controls, Controls::NEUTRAL);
}

#[test]
fn non_finite_landmarks_are_neutral() {
    let mut landmarks = CannedGesture::Fist.pose().landmarks().to_vec();
    landmarks[8] = Landmark::new(f32::NAN, 0.4);
    let nan_fist = HandDetection::new(landmarks, 0.99);
    let (mut controller, _rig) = controller_with(
        Box::new(scripted(vec![ScriptedStep::Hands(vec![nan_fist])])),
        DetectionPolicy::default(),
    );
    let out = controller.tick();
    assert_eq!(out.controls, Controls::NEUTRAL);
    assert!(out.hand.is_none());
}

#[test]
fn most_confident_hand_drives_controls() {
    let hands = vec![
        HandDetection::from_pose(&CannedGesture::Left.pose(), 0.8),
        HandDetection::from_pose(&CannedGesture::Right.pose(), 0.97),
    ];
    let (mut controller, _rig) = controller_with(
        Box::new(scripted(vec![ScriptedStep::Hands(hands.clone())])),
        DetectionPolicy::default(),
    );
    assert_eq!(controller.tick().controls.direction, Direction::Right);

    let first = DetectionPolicy {
        selection: HandSelection::First,
        ..DetectionPolicy::default()
    };
    let (mut controller, _rig) =
        controller_with(Box::new(scripted(vec![ScriptedStep::Hands(hands)])), first);
    assert_eq!(controller.tick().controls.direction, Direction::Left);
}

#[test]
fn keyboard_merges_with_gesture() {
    let (mut controller, _rig) = controller_with(
        Box::new(scripted(vec![
            ScriptedStep::gesture(CannedGesture::Jump),
            ScriptedStep::gesture(CannedGesture::Right),
        ])),
        DetectionPolicy::default(),
    );
    let keys = KeyboardInput {
        direction: Direction::Left,
        attack: true,
        ..KeyboardInput::default()
    };

    let jump = PlayerIntent::combine(&controller.tick().controls, &keys);
    assert_eq!(jump.direction, Direction::Left);
    assert!(jump.jump && jump.attack && !jump.crouch);

    let right = PlayerIntent::combine(&controller.tick().controls, &keys);
    assert_eq!(right.direction, Direction::Right);
}

/// Records how many camera releases had happened when `close` ran.
struct OrderCheckingDetector {
    rig: SyntheticRig,
    releases_at_close: Arc<Mutex<Vec<u64>>>,
}

impl HandDetector for OrderCheckingDetector {
    fn name(&self) -> &'static str {
        "order-check"
    }

    fn process(&mut self, _frame: &Frame) -> Result<Vec<HandDetection>> {
        Ok(Vec::new())
    }

    fn close(&mut self) {
        self.releases_at_close
            .lock()
            .unwrap()
            .push(self.rig.releases());
    }
}

#[test]
fn release_closes_camera_then_detector_once() {
    let (driver, rig) = driver();
    let releases_at_close = Arc::new(Mutex::new(Vec::new()));
    let detector = OrderCheckingDetector {
        rig: rig.clone(),
        releases_at_close: releases_at_close.clone(),
    };
    let session = CameraSession::new(Box::new(driver), SessionConfig::default());
    let mut controller = GestureController::new(
        session,
        Box::new(detector),
        GestureClassifier::default(),
        DetectionPolicy::default(),
    );

    controller.tick();
    controller.release();
    controller.release();
    drop(controller);

    assert_eq!(rig.releases(), 1);
    assert_eq!(*releases_at_close.lock().unwrap(), vec![1]);
}

#[test]
fn drop_releases_without_explicit_call() {
    let detector = ScriptedDetector::new();
    let probe = detector.probe();
    let (mut controller, rig) = controller_with(Box::new(detector), DetectionPolicy::default());
    controller.tick();
    drop(controller);
    assert_eq!(rig.releases(), 1);
    assert_eq!(probe.closes(), 1);
}

#[test]
fn from_config_applies_preview_and_policy() -> Result<()> {
    let mut config = RunnerConfig::default();
    config.preview.width = 32;
    config.preview.height = 24;
    config.detection.min_confidence = 0.99;

    let (driver, _rig) = driver();
    let detector = scripted(vec![ScriptedStep::gesture(CannedGesture::Fist)]);
    let mut controller = GestureController::from_config(&config, Box::new(driver), Box::new(detector))?;

    let out = controller.tick();
    // Canned detections report 0.95, below the configured floor.
    assert_eq!(out.controls, Controls::NEUTRAL);
    let preview = out.preview.expect("preview");
    assert_eq!((preview.width, preview.height), (32, 24));
    Ok(())
}
