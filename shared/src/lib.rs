//! # Dewdrop Shared
//! Protocol types, sequencing, node registry and snapshot diffing shared by
//! every dewdrop peer, whichever role it currently plays.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use dewdrop_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr, UnsignedVariableInteger};

mod backends;
mod host_election;
mod messages;
mod sequence_tracker;
mod transport;
mod types;
mod world;

pub use backends::Timer;
pub use host_election::{elect_host, outranks};
pub use messages::{
    envelope::{Envelope, SequenceMetadata, PROTOCOL_VERSION},
    error::EnvelopeError,
    message_kind::MessageKind,
    payloads::{
        DespawnNodes, HostClaim, LastSeen, Payload, PlayerInput, SceneSnapshot, SpawnKey, SpawnRequest,
        SyncNode, SyncNodes,
    },
};
pub use sequence_tracker::{SequenceState, SequenceTracker};
pub use transport::{PeerConnectionState, Reliability, Transport, TransportError};
pub use types::{MessageIndex, NodeId, PeerId, Vec2};
pub use world::{
    delta::{NodeDelta, PhysicsDelta},
    diff_config::{DiffConfig, RotationCompare},
    error::{RegistryError, SyncError},
    game_world::{breadth_first, breadth_first_excluding, GameWorld, PhysicsState},
    id_generator::IdGenerator,
    node_kind::NodeKind,
    node_registry::{NetworkedNode, NodeRegistry},
    snapshot::StateSnapshot,
};
