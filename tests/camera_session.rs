use gesture_runner::{
    BackendHint, CameraCandidate, CameraSession, FrameRead, SessionConfig, SessionState,
    SyntheticConfig, SyntheticDriver, SyntheticRig, Unavailable,
};

fn candidates() -> Vec<CameraCandidate> {
    vec![
        CameraCandidate::new(0, BackendHint::DirectShow),
        CameraCandidate::new(0, BackendHint::MediaFoundation),
        CameraCandidate::new(0, BackendHint::Any),
        CameraCandidate::new(1, BackendHint::Any),
    ]
}

fn session(config: SessionConfig) -> (CameraSession, SyntheticRig) {
    let driver = SyntheticDriver::new(SyntheticConfig {
        width: 16,
        height: 12,
    });
    let rig = driver.rig();
    (CameraSession::new(Box::new(driver), config), rig)
}

fn default_session() -> (CameraSession, SyntheticRig) {
    session(SessionConfig {
        candidates: candidates(),
        ..SessionConfig::default()
    })
}

#[test]
fn nineteen_failures_then_success_does_not_reopen() {
    let (mut session, rig) = default_session();
    assert!(session.open());
    assert_eq!(rig.opened(), 1);

    rig.fail_next_reads(19);
    for _ in 0..19 {
        assert!(matches!(
            session.read_frame(),
            FrameRead::Unavailable(Unavailable::ReadFailed)
        ));
    }
    assert_eq!(session.consecutive_failures(), 19);
    assert_eq!(session.state(), SessionState::Degraded);

    assert!(session.read_frame().is_ready());
    assert_eq!(session.consecutive_failures(), 0);
    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(session.stats().forced_reopens, 0);
    assert_eq!(rig.opened(), 1);
}

#[test]
fn twentieth_failure_forces_reopen_and_resets_counter() {
    let (mut session, rig) = default_session();
    assert!(session.open());

    rig.fail_next_reads(20);
    for _ in 0..20 {
        assert!(!session.read_frame().is_ready());
    }

    let stats = session.stats();
    assert_eq!(stats.forced_reopens, 1);
    assert_eq!(stats.consecutive_failures, 0);
    assert_eq!(stats.read_failures, 20);
    assert_eq!(rig.opened(), 2);
    assert_eq!(rig.releases(), 1);
    assert_eq!(session.state(), SessionState::Open);
    assert!(session.read_frame().is_ready());
}

#[test]
fn failed_reopen_leaves_session_closed_then_recovers() {
    let (mut session, rig) = default_session();
    assert!(session.open());

    rig.fail_next_reads(20);
    rig.set_available(vec![]);
    for _ in 0..20 {
        session.read_frame();
    }
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.consecutive_failures(), 0);

    assert!(matches!(
        session.read_frame(),
        FrameRead::Unavailable(Unavailable::NoDevice)
    ));

    // Camera plugged back in: the next tick opens and reads in one go.
    rig.allow_all();
    assert!(session.read_frame().is_ready());
    assert_eq!(session.state(), SessionState::Open);
}

#[test]
fn open_walks_candidates_in_priority_order() {
    let (mut session, rig) = default_session();
    rig.set_available(vec![CameraCandidate::new(1, BackendHint::Any)]);

    assert!(session.open());
    assert_eq!(rig.open_attempts(), candidates());
    assert_eq!(
        session.active_candidate(),
        Some(CameraCandidate::new(1, BackendHint::Any))
    );
}

#[test]
fn no_device_yields_unavailable_every_tick() {
    let (mut session, rig) = default_session();
    rig.set_available(vec![]);

    for _ in 0..3 {
        assert!(matches!(
            session.read_frame(),
            FrameRead::Unavailable(Unavailable::NoDevice)
        ));
    }
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.is_healthy());
    assert_eq!(session.stats().open_attempts, 3);
    assert_eq!(rig.open_attempts().len(), 12);
}

#[test]
fn release_twice_without_error() {
    let (mut session, rig) = default_session();
    session.release();
    session.release();
    assert_eq!(rig.releases(), 0);

    assert!(session.open());
    session.release();
    session.release();
    assert_eq!(rig.releases(), 1);
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn frames_are_mirrored_unless_disabled() {
    let (mut mirrored, _rig) = default_session();
    let (mut plain, _rig2) = session(SessionConfig {
        candidates: candidates(),
        mirror: false,
        ..SessionConfig::default()
    });

    let a = mirrored.read_frame().into_frame().expect("frame");
    let b = plain.read_frame().into_frame().expect("frame");
    assert_eq!(a.pixel(0, 0), b.pixel(15, 0));
    assert_eq!(a.pixel(15, 5), b.pixel(0, 5));
}

#[test]
fn zero_retry_cadence_reads_without_panicking() {
    let (mut session, rig) = session(SessionConfig {
        candidates: candidates(),
        closed_retry_ticks: 0,
        warmup_reads: 0,
        ..SessionConfig::default()
    });
    rig.set_available(vec![]);
    assert!(matches!(
        session.read_frame(),
        FrameRead::Unavailable(Unavailable::NoDevice)
    ));

    rig.allow_all();
    assert!(session.read_frame().is_ready());
    assert_eq!(session.state(), SessionState::Open);
}
