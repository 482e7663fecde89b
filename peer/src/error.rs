use thiserror::Error;

use dewdrop_shared::{
    EnvelopeError, MessageKind, PeerId, RegistryError, SpawnKey, SyncError, TransportError,
};

/// Non-fatal problems surfaced through `ErrorEvent`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// A message arrived that the local role must never receive, or from a
    /// peer that is not allowed to send it
    #[error("Protocol violation: {kind:?} from {from}: {reason}")]
    ProtocolViolation {
        kind: MessageKind,
        from: PeerId,
        reason: &'static str,
    },

    /// An operation needs a settled host and none is elected
    #[error("No host is elected. Wait for a HostChangedEvent before requesting spawns")]
    NoHost,

    /// A spawn request went unanswered for its whole attempt budget
    #[error("Spawn request {key:?} expired without an answer from the host")]
    SpawnRequestExpired { key: SpawnKey },

    /// A reliable message could not be delivered within the retry budget
    #[error("Reliable {kind:?} dropped after {attempts} attempts: {source}")]
    DeliveryFailed {
        kind: MessageKind,
        attempts: u32,
        source: TransportError,
    },

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Why a session was torn down
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    /// A protocol violation under `ViolationPolicy::AbortSession`
    #[error("Session aborted after {kind:?} from {from}: {reason}")]
    ProtocolViolation {
        kind: MessageKind,
        from: PeerId,
        reason: &'static str,
    },

    /// The host ran out of node ids
    #[error("Session aborted: node id space exhausted")]
    IdsExhausted,
}
