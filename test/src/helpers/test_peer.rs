use std::time::Instant;

use dewdrop_peer::{
    AbortReason, DespawnEvent, ErrorEvent, HostChangedEvent, PeerConnectedEvent,
    PeerDisconnectedEvent, PeerError, PlayerInputEvent, SceneSyncedEvent, SessionAbortedEvent,
    SessionConfig, SpawnEvent, SyncOrchestrator,
};
use dewdrop_shared::{NodeId, PeerId, PlayerInput};

use crate::{local_network::LocalNetwork, test_world::{TestEntity, TestWorld}};

/// Everything a peer's session reported, in the order it was read.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    Spawned {
        requester: Option<PeerId>,
        id: NodeId,
        node: TestEntity,
    },
    Despawned {
        id: NodeId,
        node: TestEntity,
    },
    HostChanged(PeerId),
    SceneSynced(PeerId),
    PlayerInput(PeerId, PlayerInput),
    Connected(PeerId),
    Disconnected(PeerId),
    Error(PeerError),
    Aborted(AbortReason),
}

/// One session participant: orchestrator, world and event log.
pub struct TestPeer {
    pub id: PeerId,
    pub orchestrator: SyncOrchestrator<TestEntity>,
    pub world: TestWorld,
    pub recorded: Vec<RecordedEvent>,
}

impl TestPeer {
    pub fn new(id: &str, config: SessionConfig, network: &LocalNetwork) -> Self {
        let id = PeerId::from(id);
        let transport = network.transport_for(&id);
        let orchestrator = SyncOrchestrator::new(config, id.clone(), Box::new(transport));
        network.register(&id, orchestrator.transport_handle());

        Self {
            id,
            orchestrator,
            world: TestWorld::with_level(),
            recorded: Vec::new(),
        }
    }

    pub fn receive(&mut self, now: Instant) {
        self.orchestrator.receive_all_messages(&mut self.world, now);
        self.record_events();
    }

    pub fn send(&mut self, now: Instant) {
        self.orchestrator.send_all_updates(&self.world, now);
        self.record_events();
    }

    pub fn record_events(&mut self) {
        let mut events = self.orchestrator.take_events();
        if events.is_empty() {
            return;
        }

        for peer in events.read::<PeerConnectedEvent>() {
            self.recorded.push(RecordedEvent::Connected(peer));
        }
        for peer in events.read::<PeerDisconnectedEvent>() {
            self.recorded.push(RecordedEvent::Disconnected(peer));
        }
        for host in events.read::<HostChangedEvent>() {
            self.recorded.push(RecordedEvent::HostChanged(host));
        }
        for host in events.read::<SceneSyncedEvent>() {
            self.recorded.push(RecordedEvent::SceneSynced(host));
        }
        for (requester, id, node) in events.read::<SpawnEvent>() {
            self.recorded.push(RecordedEvent::Spawned {
                requester,
                id,
                node,
            });
        }
        for (id, node) in events.read::<DespawnEvent>() {
            self.recorded.push(RecordedEvent::Despawned { id, node });
        }
        for (peer, input) in events.read::<PlayerInputEvent>() {
            self.recorded.push(RecordedEvent::PlayerInput(peer, input));
        }
        for error in events.read::<ErrorEvent>() {
            self.recorded.push(RecordedEvent::Error(error));
        }
        for reason in events.read::<SessionAbortedEvent>() {
            self.recorded.push(RecordedEvent::Aborted(reason));
        }
    }

    pub fn is_host(&self) -> bool {
        self.orchestrator.is_host()
    }

    pub fn host(&self) -> Option<PeerId> {
        self.orchestrator.host().cloned()
    }

    pub fn errors(&self) -> Vec<PeerError> {
        self.recorded
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::Error(error) => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn spawns(&self) -> Vec<(Option<PeerId>, NodeId, TestEntity)> {
        self.recorded
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::Spawned {
                    requester,
                    id,
                    node,
                } => Some((requester.clone(), *id, *node)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&RecordedEvent) -> bool) -> usize {
        self.recorded.iter().filter(|event| predicate(event)).count()
    }

    /// Local handle bound to `id`.
    pub fn node(&self, id: NodeId) -> Option<TestEntity> {
        self.orchestrator.registry().handle(&id)
    }
}
