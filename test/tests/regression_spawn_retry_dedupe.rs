/// Regression: a spawn request re-sent before the host's answer arrived used
/// to spawn the object twice. The host now answers a known spawn key from its
/// ledger instead of instantiating again.

use std::time::Duration;

use dewdrop_shared::{MessageKind, NodeKind, Payload, PeerId};
use dewdrop_test::{RecordedEvent, TestSession};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn retried_request_spawns_once() {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2", "G:3"]);
    session.establish();

    session
        .with_peer("G:2", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Player, now)
        })
        .unwrap();
    // retry timer fires before anything is delivered
    session.advance(Duration::from_millis(600));
    session.network.clear_log();
    session.pump();

    let requests = session
        .network
        .sent()
        .iter()
        .filter_map(|packet| packet.envelope())
        .filter(|envelope| envelope.kind() == MessageKind::SpawnRequest)
        .count();
    assert_eq!(requests, 0, "no request should be sent after the answer");

    for id in ["G:1", "G:2", "G:3"] {
        let peer = session.peer(id);
        assert_eq!(peer.world.count_kind(NodeKind::Player), 1, "{}", id);
        assert_eq!(
            peer.count(|event| matches!(event, RecordedEvent::Spawned { .. })),
            1,
            "{}",
            id
        );
    }
}

#[test]
fn duplicate_answer_goes_to_requester_only() {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2", "G:3"]);
    session.establish();

    session
        .with_peer("G:2", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Gun, now)
        })
        .unwrap();
    session.advance(Duration::from_millis(600));
    session.network.clear_log();
    session.pump();

    let answers: Vec<PeerId> = session
        .network
        .sent()
        .into_iter()
        .filter(|packet| {
            packet
                .envelope()
                .map_or(false, |envelope| matches!(envelope.payload, Payload::SyncNodes(_)))
        })
        .map(|packet| packet.to)
        .collect();
    assert_eq!(
        answers,
        vec![
            PeerId::from("G:2"),
            PeerId::from("G:3"),
            PeerId::from("G:2")
        ]
    );
    assert!(session.peer("G:2").errors().is_empty());
}
