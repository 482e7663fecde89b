//! # Dewdrop Peer
//! One peer of a host-authoritative game session. Every peer runs the same
//! [`SyncOrchestrator`]: the elected host mints node ids, spawns objects on
//! request and broadcasts state deltas, the others bind those ids to their
//! own copy of the scene and apply what the host sends.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use dewdrop_shared::{
        BitReader, BitWrite, BitWriter, DiffConfig, GameWorld, NodeId, NodeKind, PeerId,
        PhysicsState, PlayerInput, RotationCompare, Serde, SerdeErr, SpawnKey, Transport,
        TransportError, Vec2, PROTOCOL_VERSION,
    };
}

mod activity_tracker;
mod error;
mod events;
mod outbox;
mod session;
mod spawn_requests;

pub use activity_tracker::{ActivityStats, ActivityTracker, Direction};
pub use error::{AbortReason, PeerError};
pub use events::{
    DespawnEvent, ErrorEvent, Event, Events, HostChangedEvent, PeerConnectedEvent,
    PeerDisconnectedEvent, PlayerInputEvent, SceneSyncedEvent, SessionAbortedEvent, SpawnEvent,
};
pub use outbox::{Destination, RetryConfig};
pub use session::{SessionConfig, SessionState, SyncOrchestrator, ViolationPolicy};
pub use spawn_requests::SpawnRetryConfig;
