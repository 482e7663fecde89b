use dewdrop_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    messages::MessageKind,
    types::{MessageIndex, NodeId, PeerId, Vec2},
    world::{delta::NodeDelta, node_kind::NodeKind},
};

/// Requester-scoped idempotency key of a spawn request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpawnKey {
    pub requester: PeerId,
    pub sequence: u16,
}

/// One entry of a `syncNodes` list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncNode {
    pub id: NodeId,
    /// Marks the root of a freshly spawned object
    pub spawn: bool,
    pub kind: NodeKind,
}

/// A peer's bid for the host role. `id_floor` is the id its registry would
/// mint next, so a session that has spawned more outranks a fresh one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostClaim {
    pub id_floor: u32,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct SceneSnapshot {
    pub nodes: Vec<NodeDelta>,
}

/// Identity assignment for a hierarchy. The first entry is the parent the
/// rest hangs from. When it is the scene root with no spawn entry, the list
/// is the whole scene in breadth-first order.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncNodes {
    pub nodes: Vec<SyncNode>,
    pub source_peer: Option<PeerId>,
    pub spawn_key: Option<SpawnKey>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub kind: NodeKind,
    pub key: SpawnKey,
}

impl SpawnRequest {
    pub fn requester(&self) -> &PeerId {
        &self.key.requester
    }
}

/// A client's report of the last `sceneSnapshot` it accepted from the
/// current host, `None` before the first one arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LastSeen {
    pub snapshot_index: Option<MessageIndex>,
}

/// Player controls sampled on a client.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PlayerInput {
    pub movement: Vec2,
    pub aim: Vec2,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct DespawnNodes {
    pub ids: Vec<NodeId>,
}

/// Body of an envelope. Each variant matches one [`MessageKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    HostChange(HostClaim),
    SceneSnapshot(SceneSnapshot),
    SyncNodes(SyncNodes),
    SpawnRequest(SpawnRequest),
    LastSeen(LastSeen),
    PlayerUpdate(PlayerInput),
    DespawnNodes(DespawnNodes),
    SyncRequest,
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::HostChange(_) => MessageKind::HostChange,
            Payload::SceneSnapshot(_) => MessageKind::SceneSnapshot,
            Payload::SyncNodes(_) => MessageKind::SyncNodes,
            Payload::SpawnRequest(_) => MessageKind::SpawnRequest,
            Payload::LastSeen(_) => MessageKind::LastSeen,
            Payload::PlayerUpdate(_) => MessageKind::PlayerUpdate,
            Payload::DespawnNodes(_) => MessageKind::DespawnNodes,
            Payload::SyncRequest => MessageKind::SyncRequest,
        }
    }

    pub(crate) fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Payload::HostChange(claim) => claim.id_floor.ser(writer),
            Payload::SyncRequest => {}
            Payload::SceneSnapshot(snapshot) => snapshot.nodes.ser(writer),
            Payload::SyncNodes(sync) => {
                sync.nodes.ser(writer);
                sync.source_peer.ser(writer);
                sync.spawn_key.ser(writer);
            }
            Payload::SpawnRequest(request) => {
                request.kind.ser(writer);
                request.key.ser(writer);
            }
            Payload::LastSeen(last_seen) => last_seen.snapshot_index.ser(writer),
            Payload::PlayerUpdate(input) => {
                input.movement.ser(writer);
                input.aim.ser(writer);
            }
            Payload::DespawnNodes(despawn) => despawn.ids.ser(writer),
        }
    }

    pub(crate) fn de(kind: MessageKind, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let payload = match kind {
            MessageKind::HostChange => Payload::HostChange(HostClaim {
                id_floor: u32::de(reader)?,
            }),
            MessageKind::SyncRequest => Payload::SyncRequest,
            MessageKind::SceneSnapshot => Payload::SceneSnapshot(SceneSnapshot {
                nodes: Vec::<NodeDelta>::de(reader)?,
            }),
            MessageKind::SyncNodes => Payload::SyncNodes(SyncNodes {
                nodes: Vec::<SyncNode>::de(reader)?,
                source_peer: Option::<PeerId>::de(reader)?,
                spawn_key: Option::<SpawnKey>::de(reader)?,
            }),
            MessageKind::SpawnRequest => Payload::SpawnRequest(SpawnRequest {
                kind: NodeKind::de(reader)?,
                key: SpawnKey::de(reader)?,
            }),
            MessageKind::LastSeen => Payload::LastSeen(LastSeen {
                snapshot_index: Option::<MessageIndex>::de(reader)?,
            }),
            MessageKind::PlayerUpdate => Payload::PlayerUpdate(PlayerInput {
                movement: Vec2::de(reader)?,
                aim: Vec2::de(reader)?,
            }),
            MessageKind::DespawnNodes => Payload::DespawnNodes(DespawnNodes {
                ids: Vec::<NodeId>::de(reader)?,
            }),
        };
        Ok(payload)
    }
}

impl Serde for SpawnKey {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.requester.ser(writer);
        self.sequence.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            requester: PeerId::de(reader)?,
            sequence: u16::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.requester.bit_length() + self.sequence.bit_length()
    }
}

impl Serde for SyncNode {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.id.ser(writer);
        self.spawn.ser(writer);
        self.kind.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: NodeId::de(reader)?,
            spawn: bool::de(reader)?,
            kind: NodeKind::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.id.bit_length() + self.spawn.bit_length() + self.kind.bit_length()
    }
}
