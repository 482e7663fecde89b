use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use dewdrop_shared::{NodeId, NodeKind, PeerId, SpawnKey, SyncNodes};

/// Contains config properties for client spawn-request retries
#[derive(Clone, Debug)]
pub struct SpawnRetryConfig {
    /// Time to wait for the matching `syncNodes` before asking again
    pub interval: Duration,
    /// Requests sent, including the first, before giving up
    pub max_attempts: u32,
}

impl Default for SpawnRetryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 5,
        }
    }
}

struct PendingSpawn {
    kind: NodeKind,
    attempts: u32,
    last_sent: Instant,
}

pub enum SpawnRetry {
    Resend(SpawnKey, NodeKind),
    Expired(SpawnKey),
}

/// Requester side: mints keys and tracks requests still waiting for the
/// host's answer.
pub struct SpawnRequestTracker {
    config: SpawnRetryConfig,
    next_sequence: u16,
    pending: HashMap<SpawnKey, PendingSpawn>,
}

impl SpawnRequestTracker {
    pub fn new(config: SpawnRetryConfig) -> Self {
        Self {
            config,
            next_sequence: 0,
            pending: HashMap::new(),
        }
    }

    pub fn next_key(&mut self, requester: &PeerId) -> SpawnKey {
        let key = SpawnKey {
            requester: requester.clone(),
            sequence: self.next_sequence,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);
        key
    }

    pub fn track(&mut self, key: SpawnKey, kind: NodeKind, now: Instant) {
        self.pending.insert(
            key,
            PendingSpawn {
                kind,
                attempts: 1,
                last_sent: now,
            },
        );
    }

    /// Returns `true` if `key` was still pending.
    pub fn resolve(&mut self, key: &SpawnKey) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &SpawnKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Collects requests whose answer is overdue, marking them as re-sent.
    pub fn due(&mut self, now: Instant) -> Vec<SpawnRetry> {
        let mut output = Vec::new();
        let interval = self.config.interval;
        let max_attempts = self.config.max_attempts;

        self.pending.retain(|key, pending| {
            if now.saturating_duration_since(pending.last_sent) < interval {
                return true;
            }
            if pending.attempts >= max_attempts {
                output.push(SpawnRetry::Expired(key.clone()));
                return false;
            }
            pending.attempts += 1;
            pending.last_sent = now;
            output.push(SpawnRetry::Resend(key.clone(), pending.kind));
            true
        });

        output.sort_by_key(|retry| match retry {
            SpawnRetry::Resend(key, _) | SpawnRetry::Expired(key) => key.sequence,
        });
        output
    }

    /// Removes and returns every pending request, oldest first. Used when
    /// the local peer becomes host and must answer its own requests.
    pub fn drain_pending(&mut self) -> Vec<(SpawnKey, NodeKind)> {
        let mut output: Vec<(SpawnKey, NodeKind)> = self
            .pending
            .drain()
            .map(|(key, pending)| (key, pending.kind))
            .collect();
        output.sort_by_key(|(key, _)| key.sequence);
        output
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Every spawn this peer has seen, in spawn order. The host answers
/// duplicate requests from it, and any peer that becomes host replays it to
/// late joiners.
#[derive(Default)]
pub struct SpawnLedger {
    order: Vec<SpawnKey>,
    entries: HashMap<SpawnKey, SyncNodes>,
}

impl SpawnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SpawnKey) -> Option<&SyncNodes> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: SpawnKey, sync: SyncNodes) {
        if self.entries.insert(key.clone(), sync).is_none() {
            self.order.push(key);
        }
    }

    /// Id of the spawned root of every recorded spawn.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter_map(spawned_root)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncNodes> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Drops the entries whose spawned root is in `ids`.
    pub fn forget_roots(&mut self, ids: &[NodeId]) {
        let entries = &mut self.entries;
        self.order.retain(|key| {
            let keep = entries
                .get(key)
                .and_then(spawned_root)
                .map_or(false, |root| !ids.contains(&root));
            if !keep {
                entries.remove(key);
            }
            keep
        });
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

pub(crate) fn spawned_root(sync: &SyncNodes) -> Option<NodeId> {
    sync.nodes.get(1).filter(|node| node.spawn).map(|node| node.id)
}
