use std::time::{Duration, Instant};

/// Interval timer polled from the owner's update loop. It never blocks and
/// never fires by itself.
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            last: now,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn ringing(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.duration
    }

    /// Returns `true` and restarts the interval if the timer has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.ringing(now) {
            self.last = now;
            return true;
        }
        false
    }
}
