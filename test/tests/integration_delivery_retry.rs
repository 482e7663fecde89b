/// Integration tests for reliable sends the transport fails to hand off

use std::time::Duration;

use dewdrop_peer::{PeerError, SessionState};
use dewdrop_shared::{MessageKind, Payload, PeerId};
use dewdrop_test::TestSession;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Transient failures are retried and delivery order is kept
#[test]
fn transient_failure_is_retried_in_order() {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2"]);
    session.network.fail_next_sends(&PeerId::from("G:1"), 2);
    session.establish();

    assert_eq!(
        session.peer("G:2").orchestrator.state(),
        SessionState::ClientAwaitingSync
    );

    session.tick_n(5, Duration::from_millis(200));

    assert_eq!(
        session.peer("G:2").orchestrator.state(),
        SessionState::ClientActive
    );
    assert!(session.peer("G:1").errors().is_empty());

    let reliable_kinds: Vec<MessageKind> = session
        .network
        .sent()
        .iter()
        .filter(|packet| packet.from == PeerId::from("G:1"))
        .filter_map(|packet| packet.envelope())
        .filter(|envelope| !matches!(envelope.payload, Payload::SceneSnapshot(_)))
        .map(|envelope| envelope.kind())
        .collect();
    assert_eq!(
        reliable_kinds,
        vec![MessageKind::HostChange, MessageKind::SyncNodes]
    );
}

/// A send that keeps failing is given up on and reported
#[test]
fn persistent_failure_is_reported() {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2"]);
    session.network.fail_next_sends(&PeerId::from("G:1"), usize::MAX);
    session.establish();

    session.tick_n(10, Duration::from_millis(500));

    let errors = session.peer("G:1").errors();
    assert!(
        errors.iter().any(|error| matches!(
            error,
            PeerError::DeliveryFailed {
                kind: MessageKind::HostChange,
                attempts: 5,
                ..
            }
        )),
        "expected a delivery failure in {:?}",
        errors
    );
    assert_eq!(
        session.peer("G:2").orchestrator.state(),
        SessionState::ClientAwaitingSync
    );
}
