use log::warn;
use smol::channel::{self, Receiver, Sender, TryRecvError};

use dewdrop_shared::{PeerConnectionState, PeerId};

/// Something the transport observed, queued for the session to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Received { from: PeerId, bytes: Box<[u8]> },
    PeerConnection { peer: PeerId, state: PeerConnectionState },
    PeersEstablished { peers: Vec<PeerId> },
}

/// Cloneable entry point for transport callbacks. Safe to call from any
/// thread; nothing is processed until the session drains its inbox.
#[derive(Clone)]
pub struct TransportHandle {
    sender: Sender<TransportEvent>,
}

impl TransportHandle {
    pub fn on_receive(&self, from: &PeerId, bytes: &[u8]) {
        self.push(TransportEvent::Received {
            from: from.clone(),
            bytes: bytes.into(),
        });
    }

    pub fn on_peer_connection_changed(&self, peer: &PeerId, state: PeerConnectionState) {
        self.push(TransportEvent::PeerConnection {
            peer: peer.clone(),
            state,
        });
    }

    pub fn on_peers_established(&self, peers: &[PeerId]) {
        self.push(TransportEvent::PeersEstablished {
            peers: peers.to_vec(),
        });
    }

    fn push(&self, event: TransportEvent) {
        if self.sender.try_send(event).is_err() {
            warn!("TransportHandle: session inbox is closed, dropping transport event");
        }
    }
}

pub struct TransportInbox {
    receiver: Receiver<TransportEvent>,
}

impl TransportInbox {
    pub fn unbounded() -> (TransportHandle, TransportInbox) {
        let (sender, receiver) = channel::unbounded();
        (TransportHandle { sender }, TransportInbox { receiver })
    }

    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => None,
        }
    }
}
