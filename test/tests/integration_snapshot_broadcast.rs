/// Integration tests for the host's differential state broadcast and the
/// client's lastSeen reports

use std::time::Duration;

use dewdrop_peer::Direction;
use dewdrop_shared::{
    GameWorld, MessageKind, NodeId, NodeKind, Payload, PeerId, PlayerInput, Vec2,
};
use dewdrop_test::{assert_node_synced, Packet, RecordedEvent, TestSession};

const TICK: Duration = Duration::from_millis(60);
const FLOOR: NodeId = NodeId::new(1);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn established(ids: &[&str]) -> TestSession {
    init_logger();
    let mut session = TestSession::new(ids);
    session.establish();
    session
}

fn snapshots(packets: &[Packet]) -> Vec<Vec<NodeId>> {
    packets
        .iter()
        .filter_map(|packet| packet.envelope())
        .filter_map(|envelope| match envelope.payload {
            Payload::SceneSnapshot(snapshot) => {
                Some(snapshot.nodes.iter().map(|delta| delta.id).collect())
            }
            _ => None,
        })
        .collect()
}

fn move_on_host(session: &mut TestSession, id: NodeId, offset: Vec2) {
    let host = session.peer_mut("G:1");
    let node = host.node(id).unwrap();
    host.world.move_node(&node, offset);
}

/// A moved node ends up at the same place on every client
#[test]
fn moved_node_reaches_clients() {
    let mut session = established(&["G:1", "G:2", "G:3"]);
    session.tick(TICK);

    move_on_host(&mut session, FLOOR, Vec2::new(12.5, -3.0));
    session.tick(TICK);

    let client = session.peer("G:2");
    let floor = client.node(FLOOR).unwrap();
    assert_eq!(client.world.position(&floor), Some(Vec2::new(12.5, 397.0)));
    assert_node_synced!(session.peer("G:1"), session.peer("G:3"), FLOOR, 0.0);
}

/// The first broadcast carries every node, later ones only what changed
#[test]
fn only_changed_nodes_are_broadcast() {
    let mut session = established(&["G:1", "G:2"]);
    session.tick(TICK);
    assert_eq!(
        snapshots(&session.network.sent()),
        vec![vec![
            NodeId::new(0),
            NodeId::new(1),
            NodeId::new(2),
            NodeId::new(3)
        ]]
    );

    session.network.clear_log();
    move_on_host(&mut session, FLOOR, Vec2::new(1.0, 0.0));
    session.tick(TICK);

    let sent = session.network.sent();
    assert_eq!(snapshots(&sent), vec![vec![FLOOR]]);
    let delta = sent
        .iter()
        .filter_map(|packet| packet.envelope())
        .find_map(|envelope| match envelope.payload {
            Payload::SceneSnapshot(snapshot) => snapshot.nodes.into_iter().next(),
            _ => None,
        })
        .unwrap();
    assert!(delta.position.is_some());
    assert!(delta.rotation.is_none());
    assert!(delta.depth.is_none());
    assert!(delta.physics.is_none());
}

/// A quiet scene costs nothing
#[test]
fn unchanged_scene_sends_no_snapshot() {
    let mut session = established(&["G:1", "G:2"]);
    session.tick(TICK);
    session.network.clear_log();

    session.tick_n(5, TICK);

    assert!(snapshots(&session.network.sent()).is_empty());
}

/// Drift below the tolerance accumulates until it is worth sending
#[test]
fn small_drift_accumulates() {
    let mut session = established(&["G:1", "G:2"]);
    session.tick(TICK);
    session.network.clear_log();

    for _ in 0..3 {
        move_on_host(&mut session, FLOOR, Vec2::new(0.0004, 0.0));
        session.tick(TICK);
    }

    assert_eq!(snapshots(&session.network.sent()).len(), 1);
    assert_node_synced!(session.peer("G:1"), session.peer("G:2"), FLOOR, 0.001);
}

/// Spawned physics bodies are replicated with their physics state
#[test]
fn spawned_physics_reaches_clients() {
    let mut session = established(&["G:1", "G:2"]);
    session
        .with_peer("G:2", |peer, now| {
            peer.orchestrator
                .request_spawn(&mut peer.world, NodeKind::Player, now)
        })
        .unwrap();
    session.pump();
    session.tick(TICK);

    let player = NodeId::new(4);
    {
        let host = session.peer_mut("G:1");
        let node = host.node(player).unwrap();
        let mut physics = host.world.physics(&node).unwrap();
        physics.velocity = Vec2::new(3.0, 4.0);
        physics.angular_velocity = 0.5;
        host.world.set_physics(&node, physics);
        host.world.set_rotation(&node, 1.25);
    }
    session.tick(TICK);

    let client = session.peer("G:2");
    let node = client.node(player).unwrap();
    let physics = client.world.physics(&node).unwrap();
    assert_eq!(physics.velocity, Vec2::new(3.0, 4.0));
    assert_eq!(physics.angular_velocity, 0.5);
    assert_eq!(client.world.rotation(&node), Some(1.25));
}

/// A client that stops receiving snapshots is resent the full state
#[test]
fn lagging_client_triggers_full_resync() {
    let mut session = established(&["G:1", "G:2"]);
    session.tick(TICK);
    let registered = session.peer("G:1").orchestrator.registry().len();

    session.network.set_unreliable_loss(&PeerId::from("G:2"), true);
    session.network.clear_log();
    for _ in 0..40 {
        move_on_host(&mut session, FLOOR, Vec2::new(1.0, 0.0));
        session.tick(TICK);
    }

    let sent = session.network.sent();
    let reports = sent
        .iter()
        .filter_map(|packet| packet.envelope())
        .filter(|envelope| envelope.kind() == MessageKind::LastSeen)
        .count();
    assert!(reports > 0, "client never reported its last snapshot");
    assert!(
        snapshots(&sent)
            .iter()
            .any(|nodes| nodes.len() == registered),
        "host never resent the full state"
    );
}

/// Player input is surfaced on the host only
#[test]
fn player_input_reaches_host() {
    let mut session = established(&["G:1", "G:2", "G:3"]);
    let input = PlayerInput {
        movement: Vec2::new(1.0, 0.0),
        aim: Vec2::new(0.0, -1.0),
    };

    session
        .with_peer("G:2", |peer, now| {
            peer.orchestrator.send_player_input(input, now)
        })
        .unwrap();
    session.pump();

    let expected = RecordedEvent::PlayerInput(PeerId::from("G:2"), input);
    assert_eq!(session.peer("G:1").count(|event| *event == expected), 1);
    assert_eq!(session.peer("G:3").count(|event| *event == expected), 0);
}

/// The host's own input does not touch the network
#[test]
fn host_input_is_local() {
    let mut session = established(&["G:1", "G:2"]);
    session.network.clear_log();

    session
        .with_peer("G:1", |peer, now| {
            peer.orchestrator
                .send_player_input(PlayerInput::default(), now)
        })
        .unwrap();

    assert!(session.network.sent().is_empty());
    assert_eq!(
        session.peer("G:1").count(|event| matches!(event, RecordedEvent::PlayerInput(..))),
        1
    );
}

/// Outgoing traffic shows up in the host's activity stats
#[test]
fn activity_is_tracked() {
    let mut session = established(&["G:1", "G:2", "G:3"]);
    session.tick(TICK);

    let now = session.now;
    let host = session.peer("G:1");
    let sent = host
        .orchestrator
        .activity()
        .stats_within(Direction::Sent, Duration::from_secs(10), now);
    assert!(sent.count > 0);
    assert!(sent.largest_bytes >= sent.median_bytes);
    assert!(sent.total_bytes >= sent.largest_bytes);

    let received = session
        .peer("G:2")
        .orchestrator
        .activity()
        .stats_within(Direction::Received, Duration::from_secs(10), now);
    assert!(received.count > 0);
}

/// A client that missed the last change before the host went quiet is
/// brought up to date once its reports stop advancing
#[test]
fn lost_final_delta_is_resent() {
    let mut session = established(&["G:1", "G:2"]);
    session.tick(TICK);

    session.network.set_unreliable_loss(&PeerId::from("G:2"), true);
    move_on_host(&mut session, FLOOR, Vec2::new(5.0, 0.0));
    session.tick(TICK);
    session.network.set_unreliable_loss(&PeerId::from("G:2"), false);

    let client = session.peer("G:2");
    let floor = client.node(FLOOR).unwrap();
    assert_eq!(client.world.position(&floor), Some(Vec2::new(0.0, 400.0)));

    session.tick_n(40, TICK);

    assert_node_synced!(session.peer("G:1"), session.peer("G:2"), FLOOR, 0.0);
    assert!(session.peer("G:2").errors().is_empty());
}
