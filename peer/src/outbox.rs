use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use log::warn;

use dewdrop_shared::{MessageKind, Payload, PeerId, TransportError};

/// Contains config properties for reliable send retries
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Attempts, including the first, before a message is dropped
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further failure
    pub initial_backoff: Duration,
    /// Upper bound of the exponential delay, before jitter
    pub max_backoff: Duration,
    /// Random extra delay as a fraction of the backoff, in `0.0..=1.0`
    pub jitter: f32,
}

impl RetryConfig {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let base = self
            .initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff);
        let jitter = self.jitter.clamp(0.0, 1.0) * fastrand::f32();
        base + base.mul_f32(jitter)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
            jitter: 0.25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    All,
    Peer(PeerId),
}

struct OutboxEntry {
    destination: Destination,
    payload: Payload,
    attempts: u32,
    next_attempt: Option<Instant>,
}

/// A reliable message that exhausted its retry budget.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub destination: Destination,
    pub kind: MessageKind,
    pub attempts: u32,
    pub error: TransportError,
}

/// FIFO queue of reliable payloads. A failed head blocks everything behind
/// it, so a `hostChange` can never be overtaken by the messages it governs.
pub struct ReliableOutbox {
    config: RetryConfig,
    queue: VecDeque<OutboxEntry>,
}

impl ReliableOutbox {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, destination: Destination, payload: Payload) {
        self.queue.push_back(OutboxEntry {
            destination,
            payload,
            attempts: 0,
            next_attempt: None,
        });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Hands due payloads to `send` in order. Payloads are re-stamped by the
    /// caller on every attempt, so a retry is never rejected as stale.
    pub fn flush<F>(&mut self, now: Instant, mut send: F) -> Vec<DeliveryFailure>
    where
        F: FnMut(&Destination, &Payload) -> Result<(), TransportError>,
    {
        let mut failures = Vec::new();

        while let Some(entry) = self.queue.front_mut() {
            if let Some(next_attempt) = entry.next_attempt {
                if now < next_attempt {
                    break;
                }
            }

            let Err(error) = send(&entry.destination, &entry.payload) else {
                self.queue.pop_front();
                continue;
            };

            entry.attempts += 1;
            if entry.attempts >= self.config.max_attempts {
                let attempts = entry.attempts;
                if let Some(entry) = self.queue.pop_front() {
                    warn!(
                        "ReliableOutbox: dropping {:?} to {:?} after {} attempts",
                        entry.payload.kind(),
                        entry.destination,
                        attempts
                    );
                    failures.push(DeliveryFailure {
                        kind: entry.payload.kind(),
                        destination: entry.destination,
                        attempts,
                        error,
                    });
                }
                continue;
            }

            let delay = self.config.backoff(entry.attempts);
            warn!(
                "ReliableOutbox: {:?} send failed ({}), retrying in {:?}",
                entry.payload.kind(),
                error,
                delay
            );
            entry.next_attempt = Some(now + delay);
            break;
        }

        failures
    }

    /// Drops everything addressed to a departed peer.
    pub fn forget_peer(&mut self, peer: &PeerId) {
        self.queue
            .retain(|entry| entry.destination != Destination::Peer(peer.clone()));
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
