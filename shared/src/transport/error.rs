use thiserror::Error;

use crate::PeerId;

/// Errors reported by a [`Transport`](crate::Transport) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Destination peer is not currently reachable
    #[error("Peer {peer} is unreachable. The message was not handed to the network")]
    PeerUnreachable { peer: PeerId },

    /// The underlying session has been closed
    #[error("Transport session is closed. No further messages can be sent")]
    SessionClosed,

    /// Implementation-specific send failure
    #[error("Transport send failed: {reason}")]
    SendFailed { reason: String },
}
