use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

const RETENTION: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// Summary of the datagrams recorded within a window.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ActivityStats {
    pub count: usize,
    pub mean_bytes: f32,
    pub median_bytes: usize,
    pub largest_bytes: usize,
    pub total_bytes: usize,
}

/// Time series of bytes moved by the session. Entries older than a minute
/// are pruned on every record.
pub struct ActivityTracker {
    sent: VecDeque<(Instant, usize)>,
    received: VecDeque<(Instant, usize)>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            sent: VecDeque::new(),
            received: VecDeque::new(),
        }
    }

    /// Records one datagram per recipient.
    pub fn record_sent(&mut self, now: Instant, bytes: usize, recipients: usize) {
        for _ in 0..recipients {
            self.sent.push_back((now, bytes));
        }
        self.prune(now);
    }

    pub fn record_received(&mut self, now: Instant, bytes: usize) {
        self.received.push_back((now, bytes));
        self.prune(now);
    }

    pub fn stats_within(&self, direction: Direction, window: Duration, now: Instant) -> ActivityStats {
        let series = match direction {
            Direction::Sent => &self.sent,
            Direction::Received => &self.received,
        };

        let mut sizes: Vec<usize> = series
            .iter()
            .filter(|(at, _)| now.saturating_duration_since(*at) <= window)
            .map(|(_, bytes)| *bytes)
            .collect();
        if sizes.is_empty() {
            return ActivityStats::default();
        }
        sizes.sort_unstable();

        let total: usize = sizes.iter().sum();
        ActivityStats {
            count: sizes.len(),
            mean_bytes: total as f32 / sizes.len() as f32,
            median_bytes: sizes[sizes.len() / 2],
            largest_bytes: sizes[sizes.len() - 1],
            total_bytes: total,
        }
    }

    fn prune(&mut self, now: Instant) {
        for series in [&mut self.sent, &mut self.received] {
            while let Some((at, _)) = series.front() {
                if now.saturating_duration_since(*at) <= RETENTION {
                    break;
                }
                series.pop_front();
            }
        }
    }

    pub fn clear(&mut self) {
        self.sent.clear();
        self.received.clear();
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}
