/// Integration tests for host changes: migration when the host leaves,
/// conflicting host claims, and peers joining a running session

use std::time::Duration;

use dewdrop_peer::SessionState;
use dewdrop_shared::{NodeId, NodeKind, PeerId, Vec2};
use dewdrop_test::{assert_host_agreed, assert_node_synced, RecordedEvent, TestSession};

const TICK: Duration = Duration::from_millis(60);
const PLAYER: NodeId = NodeId::new(4);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Three peers with a player spawned by G:2 and one broadcast done
fn session_with_player() -> TestSession {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2", "G:3"]);
    session.establish();
    session
        .with_peer("G:2", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Player, now)
        })
        .unwrap();
    session.pump();
    session.tick(TICK);
    session
}

fn aborted(session: &TestSession) -> bool {
    session
        .peers
        .iter()
        .any(|peer| peer.count(|event| matches!(event, RecordedEvent::Aborted(_))) > 0)
}

/// The next lowest peer takes over and every id survives
#[test]
fn host_departure_elects_next_peer() {
    let mut session = session_with_player();
    let ids_before = session.peer("G:3").orchestrator.registry().ids();

    session.disconnect("G:1");

    assert!(session.peer("G:2").is_host());
    assert_host_agreed!(session, "G:2");
    assert_eq!(
        session.peer("G:3").orchestrator.state(),
        SessionState::ClientActive
    );
    assert_eq!(session.peer("G:2").orchestrator.registry().ids(), ids_before);
    assert_eq!(session.peer("G:3").orchestrator.registry().ids(), ids_before);
    assert!(!aborted(&session));
}

/// Nodes the old host owned pass to the new host, spawned objects keep
/// their owner
#[test]
fn migration_transfers_host_owned_nodes() {
    let mut session = session_with_player();
    session.disconnect("G:1");

    let registry = session.peer("G:2").orchestrator.registry();
    assert_eq!(
        registry.get(&NodeId::new(0)).unwrap().owner,
        PeerId::from("G:2")
    );
    assert_eq!(registry.get(&PLAYER).unwrap().owner, PeerId::from("G:2"));
    assert!(registry.iter().all(|node| node.owner != PeerId::from("G:1")));
}

/// The replayed spawn ledger does not spawn anything twice
#[test]
fn migration_does_not_duplicate_spawns() {
    let mut session = session_with_player();
    session.disconnect("G:1");

    for id in ["G:2", "G:3"] {
        let peer = session.peer(id);
        assert_eq!(peer.world.count_kind(NodeKind::Player), 1, "{}", id);
        assert_eq!(peer.spawns().len(), 1, "{}", id);
    }
}

/// The new host keeps minting ids above every id already in use and keeps
/// broadcasting state
#[test]
fn new_host_continues_the_session() {
    let mut session = session_with_player();
    let ids_before = session.peer("G:3").orchestrator.registry().ids();
    session.disconnect("G:1");

    session
        .with_peer("G:3", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Gun, now)
        })
        .unwrap();
    session.pump();

    let spawns = session.peer("G:3").spawns();
    let (_, gun_id, _) = spawns.last().cloned().unwrap();
    assert!(!ids_before.contains(&gun_id));
    assert_eq!(
        session.peer("G:2").orchestrator.registry().ids(),
        session.peer("G:3").orchestrator.registry().ids()
    );

    {
        let host = session.peer_mut("G:2");
        let player = host.node(PLAYER).unwrap();
        host.world.move_node(&player, Vec2::new(-20.0, 8.0));
    }
    session.tick(TICK);
    assert_node_synced!(session.peer("G:2"), session.peer("G:3"), PLAYER, 0.0);
}

/// A spawn request still pending when the host leaves is answered by the
/// requester itself if it becomes host
#[test]
fn pending_request_is_answered_by_new_host() {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2", "G:3"]);
    session.establish();

    session
        .with_peer("G:2", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Droplet, now)
        })
        .unwrap();
    // the host leaves before the request is delivered
    session.disconnect("G:1");

    assert!(session.peer("G:2").is_host());
    for id in ["G:2", "G:3"] {
        assert_eq!(
            session.peer(id).world.count_kind(NodeKind::Droplet),
            1,
            "{}",
            id
        );
    }
}

/// Competing claims from sessions that spawned nothing settle on the lowest
/// peer id
#[test]
fn host_conflict_resolves_to_lowest_id() {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2", "G:3"]);
    session.establish_only(&["G:2", "G:3"]);
    assert!(session.peer("G:2").is_host());

    session.connect("G:1");

    assert!(session.peer("G:1").is_host());
    assert!(!session.peer("G:2").is_host());
    assert_host_agreed!(session, "G:1");
    for id in ["G:2", "G:3"] {
        assert_eq!(
            session.peer(id).orchestrator.state(),
            SessionState::ClientActive,
            "{}",
            id
        );
    }
    assert!(!aborted(&session));
}

/// A joiner with a lower id does not displace a host that has already
/// minted ids, and its own spawns get fresh ones
#[test]
fn lower_joiner_follows_running_host() {
    init_logger();
    let mut session = TestSession::new(&["G:1", "G:2", "G:3"]);
    session.establish_only(&["G:2", "G:3"]);
    session
        .with_peer("G:3", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Player, now)
        })
        .unwrap();
    session.pump();

    session.connect("G:1");

    assert!(session.peer("G:2").is_host());
    assert!(!session.peer("G:1").is_host());
    assert_host_agreed!(session, "G:2");
    assert_eq!(
        session.peer("G:1").orchestrator.state(),
        SessionState::ClientActive
    );
    assert_eq!(session.peer("G:1").world.count_kind(NodeKind::Player), 1);

    session
        .with_peer("G:1", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Gun, now)
        })
        .unwrap();
    session.pump();

    let spawns = session.peer("G:1").spawns();
    let (owner, gun_id, _) = spawns.last().cloned().unwrap();
    assert_eq!(owner, Some(PeerId::from("G:1")));
    assert_eq!(gun_id, NodeId::new(7));

    let ids = session.peer("G:2").orchestrator.registry().ids();
    assert_eq!(ids, (0..8).map(NodeId::new).collect::<Vec<_>>());
    for id in ["G:1", "G:2", "G:3"] {
        let peer = session.peer(id);
        assert_eq!(peer.orchestrator.registry().ids(), ids, "{}", id);
        assert_eq!(peer.world.count_kind(NodeKind::Player), 1, "{}", id);
        // one carried by the player, one spawned on its own
        assert_eq!(peer.world.count_kind(NodeKind::Gun), 2, "{}", id);
        assert!(peer.errors().is_empty(), "{}: {:?}", id, peer.errors());
    }
    assert!(!aborted(&session));
}

/// A late joiner gets the scene, every spawned object and fresh state
#[test]
fn late_joiner_receives_full_state() {
    let mut session = session_with_player();
    {
        let host = session.peer_mut("G:1");
        let player = host.node(PLAYER).unwrap();
        host.world.move_node(&player, Vec2::new(50.0, 50.0));
    }
    session.tick(TICK);

    session.add_peer("G:4");
    assert_eq!(
        session.peer("G:4").orchestrator.state(),
        SessionState::ClientActive
    );
    assert_eq!(session.peer("G:4").world.count_kind(NodeKind::Player), 1);
    assert_eq!(
        session.peer("G:4").spawns()[0].0,
        Some(PeerId::from("G:2"))
    );
    assert_eq!(
        session.peer("G:4").orchestrator.registry().ids(),
        session.peer("G:1").orchestrator.registry().ids()
    );

    session.tick(TICK);
    assert_node_synced!(session.peer("G:1"), session.peer("G:4"), PLAYER, 0.0);
}
