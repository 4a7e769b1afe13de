//! Per-message receive statistics and the primary-message staleness signal.
//!
//! One entry per tracked PGN, created up front from the registry table. The
//! decode task is the only writer; the render and report tasks read from the
//! other core. All fields are atomics, so every method takes `&self` and no
//! lock is shared with the decoder.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::clock::elapsed_ms;

/// Counters for one PGN.
struct StatEntry {
    pgn: u32,
    name: &'static str,
    received: AtomicU32,
    failed: AtomicU32,
    last_seen_ms: AtomicU32,
}

impl StatEntry {
    const fn new(
        pgn: u32,
        name: &'static str,
    ) -> Self {
        Self {
            pgn,
            name,
            received: AtomicU32::new(0),
            failed: AtomicU32::new(0),
            last_seen_ms: AtomicU32::new(0),
        }
    }
}

fn saturating_increment(counter: &AtomicU32) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_add(1));
}

/// Point-in-time view of one entry, for reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatSummary {
    pub name: &'static str,
    pub pgn: u32,
    pub received: u32,
    pub failed: u32,
    /// Milliseconds since the last successful decode, `None` if never.
    pub since_last_ms: Option<u32>,
}

impl fmt::Display for StatSummary {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} ({}): rx {} err {}", self.name, self.pgn, self.received, self.failed)?;
        match self.since_last_ms {
            Some(ms) => write!(f, " last {ms}ms ago"),
            None => f.write_str(" never"),
        }
    }
}

/// Receive statistics for a fixed set of PGNs.
pub struct MessageStatistics<const N: usize> {
    entries: [StatEntry; N],
    primary_pgn: u32,
    timeout_ms: u32,
}

impl<const N: usize> MessageStatistics<N> {
    /// Track `ids` (pgn, name). `primary_pgn` drives [`Self::is_primary_timed_out`].
    pub fn new(
        ids: [(u32, &'static str); N],
        primary_pgn: u32,
        timeout_ms: u32,
    ) -> Self {
        Self {
            entries: ids.map(|(pgn, name)| StatEntry::new(pgn, name)),
            primary_pgn,
            timeout_ms,
        }
    }

    fn entry(
        &self,
        pgn: u32,
    ) -> Option<&StatEntry> {
        self.entries.iter().find(|e| e.pgn == pgn)
    }

    /// Count a successful decode at `now_ms`. Returns `false` if untracked.
    pub fn record_success(
        &self,
        pgn: u32,
        now_ms: u32,
    ) -> bool {
        let Some(entry) = self.entry(pgn) else {
            return false;
        };
        saturating_increment(&entry.received);
        entry.last_seen_ms.store(now_ms, Ordering::Release);
        true
    }

    /// Count a failed decode. Returns `false` if untracked.
    pub fn record_failure(
        &self,
        pgn: u32,
    ) -> bool {
        let Some(entry) = self.entry(pgn) else {
            return false;
        };
        saturating_increment(&entry.failed);
        true
    }

    /// (received, failed) for `pgn`; `(0, 0)` if untracked.
    pub fn counts(
        &self,
        pgn: u32,
    ) -> (u32, u32) {
        self.entry(pgn).map_or((0, 0), |e| {
            (e.received.load(Ordering::Relaxed), e.failed.load(Ordering::Relaxed))
        })
    }

    /// Timestamp of the last successful decode of `pgn` (0 until the first).
    pub fn last_seen_ms(
        &self,
        pgn: u32,
    ) -> Option<u32> {
        self.entry(pgn).map(|e| e.last_seen_ms.load(Ordering::Acquire))
    }

    /// True iff more than the timeout has passed since the primary PGN last
    /// decoded. The boot instant counts as the initial "last seen".
    pub fn is_primary_timed_out(
        &self,
        now_ms: u32,
    ) -> bool {
        let last = self.last_seen_ms(self.primary_pgn).unwrap_or(0);
        elapsed_ms(now_ms, last) > self.timeout_ms
    }

    /// PGN whose absence is reported as staleness.
    pub const fn primary_pgn(&self) -> u32 { self.primary_pgn }

    /// Staleness timeout in milliseconds.
    pub const fn timeout_ms(&self) -> u32 { self.timeout_ms }

    /// Summaries in table order.
    pub fn summaries(
        &self,
        now_ms: u32,
    ) -> impl Iterator<Item = StatSummary> + '_ {
        self.entries.iter().map(move |e| {
            let received = e.received.load(Ordering::Relaxed);
            StatSummary {
                name: e.name,
                pgn: e.pgn,
                received,
                failed: e.failed.load(Ordering::Relaxed),
                since_last_ms: (received > 0)
                    .then(|| elapsed_ms(now_ms, e.last_seen_ms.load(Ordering::Acquire))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAPID: u32 = 127_488;
    const DYNAMIC: u32 = 127_489;

    fn stats() -> MessageStatistics<2> {
        MessageStatistics::new([(RAPID, "EngineRapid"), (DYNAMIC, "EngineDynamic")], RAPID, 10_000)
    }

    #[test]
    fn test_success_and_failure_are_separate() {
        let s = stats();
        assert!(s.record_success(RAPID, 100));
        assert!(s.record_failure(RAPID));
        assert!(s.record_failure(RAPID));
        assert_eq!(s.counts(RAPID), (1, 2));
        assert_eq!(s.counts(DYNAMIC), (0, 0));
        assert_eq!(s.last_seen_ms(RAPID), Some(100));
    }

    #[test]
    fn test_untracked_pgn() {
        let s = stats();
        assert!(!s.record_success(59_904, 5));
        assert!(!s.record_failure(59_904));
        assert_eq!(s.counts(59_904), (0, 0));
        assert_eq!(s.last_seen_ms(59_904), None);
    }

    #[test]
    fn test_failure_does_not_refresh_last_seen() {
        let s = stats();
        s.record_success(RAPID, 1_000);
        s.record_failure(RAPID);
        assert_eq!(s.last_seen_ms(RAPID), Some(1_000));
        assert!(s.is_primary_timed_out(11_001));
    }

    #[test]
    fn test_timeout_after_success() {
        let s = stats();
        s.record_success(RAPID, 50_000);
        assert!(!s.is_primary_timed_out(50_000));
        assert!(!s.is_primary_timed_out(60_000));
        assert!(s.is_primary_timed_out(60_001));
    }

    #[test]
    fn test_timeout_from_boot() {
        let s = stats();
        assert!(!s.is_primary_timed_out(9_999));
        assert!(s.is_primary_timed_out(10_001));
    }

    #[test]
    fn test_timeout_across_clock_wrap() {
        let s = stats();
        let before_wrap = u32::MAX - 2_000;
        s.record_success(RAPID, before_wrap);
        assert!(!s.is_primary_timed_out(before_wrap.wrapping_add(5_000)));
        assert!(s.is_primary_timed_out(before_wrap.wrapping_add(10_001)));
    }

    #[test]
    fn test_secondary_success_does_not_clear_timeout() {
        let s = stats();
        s.record_success(DYNAMIC, 20_000);
        assert!(s.is_primary_timed_out(20_000));
    }

    #[test]
    fn test_summaries() {
        let s = stats();
        s.record_success(DYNAMIC, 400);
        s.record_failure(RAPID);
        let mut it = s.summaries(1_000);
        let rapid = it.next().unwrap();
        assert_eq!((rapid.name, rapid.received, rapid.failed, rapid.since_last_ms), ("EngineRapid", 0, 1, None));
        let dynamic = it.next().unwrap();
        assert_eq!(dynamic.since_last_ms, Some(600));
        assert!(it.next().is_none());
    }

    #[test]
    fn test_counts_saturate() {
        let s = stats();
        s.entries[0].received.store(u32::MAX, Ordering::Relaxed);
        s.record_success(RAPID, 1);
        assert_eq!(s.counts(RAPID).0, u32::MAX);
    }

    proptest::proptest! {
        #[test]
        fn test_counts_monotonic(ops in proptest::collection::vec(proptest::bool::ANY, 0..64)) {
            let s = stats();
            let mut prev = (0, 0);
            for (i, ok) in ops.into_iter().enumerate() {
                if ok { s.record_success(RAPID, i as u32); } else { s.record_failure(RAPID); }
                let now = s.counts(RAPID);
                proptest::prop_assert!(now.0 >= prev.0 && now.1 >= prev.1);
                proptest::prop_assert_eq!(now.0 + now.1, prev.0 + prev.1 + 1);
                prev = now;
            }
        }
    }
}
