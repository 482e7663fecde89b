use thiserror::Error;

use crate::{types::NodeId, world::node_kind::NodeKind};

/// Errors raised by the [`NodeRegistry`](crate::NodeRegistry)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Only the host may mint node ids
    #[error("Cannot register a node without host authority. Use bind() for ids received from the host")]
    NotAuthority,

    /// Every node id in the session has been handed out
    #[error("Node id space exhausted after {last:?}. No more nodes can be registered this session")]
    IdsExhausted { last: Option<NodeId> },

    /// Referenced node id has no binding on this peer
    #[error("Node {id} is not registered on this peer")]
    UnknownNode { id: NodeId },
}

/// Errors raised while binding a received node list to the local hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Local traversal and received list have different lengths
    #[error("Local hierarchy has {local} nodes but the host sent {remote}. Bindings for this message were dropped")]
    TraversalMismatch { local: usize, remote: usize },

    /// Local node at a traversal position has a different kind than the host's
    #[error("Node {id} is a {remote:?} on the host but a {local:?} locally")]
    KindMismatch {
        id: NodeId,
        local: Option<NodeKind>,
        remote: NodeKind,
    },

    /// Spawn notification names a parent this peer does not know
    #[error("Parent node {id} is not registered on this peer")]
    UnknownParent { id: NodeId },

    /// Node list was empty or missing its spawned root
    #[error("Received node list is incomplete")]
    IncompleteNodeList,

    /// Game world refused to instantiate a kind
    #[error("Game world could not instantiate a {kind:?}")]
    InstantiateFailed { kind: NodeKind },

    /// No scene is loaded locally
    #[error("No scene root is loaded on this peer")]
    MissingScene,
}
