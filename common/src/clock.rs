//! Monotonic millisecond clock abstraction.
//!
//! All timestamps in this crate are `u32` milliseconds that wrap after ~49.7
//! days. Elapsed time is always computed with [`elapsed_ms`] (wrapping
//! subtraction), never by comparing raw timestamps, so a single wrap of the
//! counter does not break staleness or lock-timeout checks.

/// Source of the current time in milliseconds since boot.
pub trait Clock {
    /// Current time in milliseconds (wraps at `u32::MAX`).
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_ms(&self) -> u32 { (**self).now_ms() }
}

/// Milliseconds elapsed from `since` to `now`, correct across one counter wrap.
#[inline]
pub const fn elapsed_ms(
    now: u32,
    since: u32,
) -> u32 {
    now.wrapping_sub(since)
}

/// Manually driven clock for host tests and the simulator's replay mode.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: core::cell::Cell<u32>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    pub const fn new(start_ms: u32) -> Self {
        Self {
            now: core::cell::Cell::new(start_ms),
        }
    }

    /// Set the current time.
    pub fn set(
        &self,
        now_ms: u32,
    ) {
        self.now.set(now_ms);
    }

    /// Advance the clock by `delta_ms`, wrapping at `u32::MAX`.
    pub fn advance(
        &self,
        delta_ms: u32,
    ) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 { self.now.get() }
}
