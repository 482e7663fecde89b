use crate::transport::Reliability;

/// Every message the session protocol exchanges. The tag values are part of
/// the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    HostChange,
    SceneSnapshot,
    SyncNodes,
    SpawnRequest,
    LastSeen,
    PlayerUpdate,
    DespawnNodes,
    SyncRequest,
}

impl MessageKind {
    pub fn reliability(&self) -> Reliability {
        match self {
            MessageKind::SceneSnapshot | MessageKind::LastSeen | MessageKind::PlayerUpdate => {
                Reliability::Unreliable
            }
            MessageKind::HostChange
            | MessageKind::SyncNodes
            | MessageKind::SpawnRequest
            | MessageKind::DespawnNodes
            | MessageKind::SyncRequest => Reliability::Reliable,
        }
    }

    /// Whether only the host may send this kind.
    pub fn is_host_only(&self) -> bool {
        matches!(
            self,
            MessageKind::SceneSnapshot | MessageKind::SyncNodes | MessageKind::DespawnNodes
        )
    }

    /// Whether only the host may receive this kind.
    pub fn is_host_bound(&self) -> bool {
        matches!(
            self,
            MessageKind::SpawnRequest
                | MessageKind::LastSeen
                | MessageKind::PlayerUpdate
                | MessageKind::SyncRequest
        )
    }

    pub fn to_tag(self) -> u8 {
        match self {
            MessageKind::HostChange => 0,
            MessageKind::SceneSnapshot => 1,
            MessageKind::SyncNodes => 2,
            MessageKind::SpawnRequest => 3,
            MessageKind::LastSeen => 4,
            MessageKind::PlayerUpdate => 5,
            MessageKind::DespawnNodes => 6,
            MessageKind::SyncRequest => 7,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(MessageKind::HostChange),
            1 => Some(MessageKind::SceneSnapshot),
            2 => Some(MessageKind::SyncNodes),
            3 => Some(MessageKind::SpawnRequest),
            4 => Some(MessageKind::LastSeen),
            5 => Some(MessageKind::PlayerUpdate),
            6 => Some(MessageKind::DespawnNodes),
            7 => Some(MessageKind::SyncRequest),
            _ => None,
        }
    }
}
