//! Timing helpers for the simulator loops.
//!
//! These use `std::time` which is not available in `no_std`, so they live
//! here rather than in the common crate.

use std::time::{Duration, Instant};

use gauge_common::clock::Clock;

/// Convert a configured period to a `Duration`.
#[inline]
pub fn period(ms: u32) -> Duration { Duration::from_millis(u64::from(ms)) }

/// Milliseconds since the simulator started.
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    pub fn new() -> Self { Self { start: Instant::now() } }
}

impl Default for StdClock {
    fn default() -> Self { Self::new() }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u32 { self.start.elapsed().as_millis() as u32 }
}

/// Fixed-rate trigger polled from a loop.
#[derive(Debug)]
pub struct Interval {
    period: Duration,
    next: Instant,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// True once per elapsed period. Missed periods are not replayed.
    pub fn due(
        &mut self,
        now: Instant,
    ) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.period;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_fires_once_per_period() {
        let start = Instant::now();
        let mut every = Interval::new(Duration::from_millis(100));
        assert!(!every.due(start));
        assert!(every.due(start + Duration::from_millis(150)));
        assert!(!every.due(start + Duration::from_millis(200)));
        assert!(every.due(start + Duration::from_millis(260)));
    }
}
