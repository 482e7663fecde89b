use std::{default::Default, time::Duration};

use dewdrop_shared::DiffConfig;

use crate::{outbox::RetryConfig, spawn_requests::SpawnRetryConfig};

/// What to do with a message the local role must never receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationPolicy {
    /// Log it, surface an `ErrorEvent` and carry on
    Drop,
    /// Tear the session down with a `SessionAbortedEvent`
    AbortSession,
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        cfg_if! {
            if #[cfg(debug_assertions)] {
                ViolationPolicy::AbortSession
            } else {
                ViolationPolicy::Drop
            }
        }
    }
}

/// Contains Config properties which will be used by a session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// How often the host diffs every node and broadcasts a `sceneSnapshot`
    pub broadcast_interval: Duration,
    /// How often a client reports the last snapshot index it accepted
    pub last_seen_interval: Duration,
    /// Snapshot indices a client may fall behind before the host resends
    /// full state
    pub max_snapshot_lag: u16,
    /// Consecutive reports naming the same outdated snapshot before the
    /// host resends full state. Covers a lost final delta of a scene that
    /// has since gone quiet
    pub max_stalled_reports: u32,
    /// Minimum time between two lag-triggered full-state resyncs
    pub resync_cooldown: Duration,
    /// Tolerances used when diffing snapshots
    pub diff: DiffConfig,
    /// Retry policy for reliable sends that fail
    pub retry: RetryConfig,
    /// Retry policy for spawn requests awaiting the host's answer
    pub spawn_retry: SpawnRetryConfig,
    /// Handling of role violations
    pub violation_policy: ViolationPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: Duration::from_millis(50),
            last_seen_interval: Duration::from_millis(250),
            max_snapshot_lag: 20,
            max_stalled_reports: 3,
            resync_cooldown: Duration::from_secs(1),
            diff: DiffConfig::default(),
            retry: RetryConfig::default(),
            spawn_retry: SpawnRetryConfig::default(),
            violation_policy: ViolationPolicy::default(),
        }
    }
}
