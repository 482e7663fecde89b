use std::time::{Duration, Instant};

use dewdrop_peer::SessionConfig;
use dewdrop_shared::PeerId;

use crate::{helpers::TestPeer, local_network::LocalNetwork};

/// Pump rounds before `pump` gives up on a session that never settles.
const MAX_PUMP_ROUNDS: usize = 64;

/// A full session on one in-memory network, driven by a manual clock.
pub struct TestSession {
    pub network: LocalNetwork,
    pub peers: Vec<TestPeer>,
    pub now: Instant,
    config: SessionConfig,
}

impl TestSession {
    pub fn new(ids: &[&str]) -> Self {
        Self::with_config(ids, SessionConfig::default())
    }

    pub fn with_config(ids: &[&str], config: SessionConfig) -> Self {
        let network = LocalNetwork::new();
        let peers = ids
            .iter()
            .map(|id| TestPeer::new(id, config.clone(), &network))
            .collect();

        Self {
            network,
            peers,
            now: Instant::now(),
            config,
        }
    }

    /// Connects every peer and runs the session until it is quiet.
    pub fn establish(&mut self) {
        let ids: Vec<PeerId> = self.peers.iter().map(|peer| peer.id.clone()).collect();
        self.network.establish(&ids);
        self.pump();
    }

    /// Connects only `ids`; the remaining peers join later with `connect`.
    pub fn establish_only(&mut self, ids: &[&str]) {
        let ids: Vec<PeerId> = ids.iter().map(|id| PeerId::from(*id)).collect();
        self.network.establish(&ids);
        self.pump();
    }

    /// Adds a new peer to an already running session.
    pub fn add_peer(&mut self, id: &str) {
        let peer = TestPeer::new(id, self.config.clone(), &self.network);
        let peer_id = peer.id.clone();
        self.peers.push(peer);
        self.network.connect(&peer_id);
        self.pump();
    }

    pub fn connect(&mut self, id: &str) {
        self.network.connect(&PeerId::from(id));
        self.pump();
    }

    /// Drops `id` from the network and from the session, returning it.
    pub fn disconnect(&mut self, id: &str) -> Option<TestPeer> {
        self.network.disconnect(&PeerId::from(id));
        let index = self.peers.iter().position(|peer| peer.id.as_str() == id)?;
        let peer = self.peers.remove(index);
        self.pump();
        Some(peer)
    }

    /// Delivers traffic and lets every peer process it until nothing is in
    /// flight.
    pub fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            for peer in self.peers.iter_mut() {
                peer.receive(self.now);
            }
            if self.network.deliver() == 0 {
                return;
            }
        }
        panic!("session did not settle after {} rounds", MAX_PUMP_ROUNDS);
    }

    /// Advances the clock and runs every peer's timers without delivering
    /// anything.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now += elapsed;
        for peer in self.peers.iter_mut() {
            peer.send(self.now);
        }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.advance(elapsed);
        self.pump();
    }

    pub fn tick_n(&mut self, count: usize, elapsed: Duration) {
        for _ in 0..count {
            self.tick(elapsed);
        }
    }

    pub fn peer(&self, id: &str) -> &TestPeer {
        self.peers
            .iter()
            .find(|peer| peer.id.as_str() == id)
            .unwrap_or_else(|| panic!("no test peer named {}", id))
    }

    pub fn peer_mut(&mut self, id: &str) -> &mut TestPeer {
        self.peers
            .iter_mut()
            .find(|peer| peer.id.as_str() == id)
            .unwrap_or_else(|| panic!("no test peer named {}", id))
    }

    /// Splits out one peer mutably together with the session clock.
    pub fn with_peer<R>(&mut self, id: &str, f: impl FnOnce(&mut TestPeer, Instant) -> R) -> R {
        let now = self.now;
        let output = f(self.peer_mut(id), now);
        self.peer_mut(id).record_events();
        output
    }
}
