mod error;

pub use error::TransportError;

use crate::PeerId;

/// Delivery class requested for an outgoing message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reliability {
    /// Ordered, guaranteed, FIFO per sender
    Reliable,
    /// Best effort, may be dropped or reordered
    Unreliable,
}

/// Connection status reported by the transport for a single peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerConnectionState {
    Connected,
    Disconnected,
    Unknown,
}

/// Outbound half of the peer transport. Inbound traffic is pushed through a
/// `TransportHandle` owned by the session instead, so implementations may
/// deliver from any thread.
pub trait Transport {
    fn send_reliable(&mut self, bytes: &[u8], to: &PeerId) -> Result<(), TransportError>;

    fn send_unreliable(&mut self, bytes: &[u8], to: &PeerId) -> Result<(), TransportError>;

    /// Sends to every connected peer except the local one.
    fn broadcast(&mut self, bytes: &[u8], reliability: Reliability) -> Result<(), TransportError>;

    /// Optional host candidate, for transports that know which peer has the
    /// best connectivity.
    fn suggest_host(&self, _peers: &[PeerId]) -> Option<PeerId> {
        None
    }
}
