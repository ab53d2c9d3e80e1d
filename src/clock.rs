//! Tick sources for flow timestamps and TTL deadlines
//!
//! Components never read the wall clock directly; they are handed a `TickSource` so the
//! same code runs against the monotonic clock in production and a manually driven clock
//! in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic tick counter with a known frequency
pub trait TickSource {
    /// Current tick count (never decreases)
    fn now(&self) -> u64;

    /// Ticks per second, used to turn TTL seconds into ticks
    fn ticks_per_second(&self) -> u64;
}

/// Nanosecond clock anchored at first use
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline(always)]
    fn instant_to_nanos(instant: Instant) -> u64 {
        use std::sync::OnceLock;
        static START_TIME: OnceLock<Instant> = OnceLock::new();

        let start = START_TIME.get_or_init(Instant::now);
        instant.duration_since(*start).as_nanos() as u64
    }
}

impl TickSource for MonotonicClock {
    #[inline(always)]
    fn now(&self) -> u64 {
        Self::instant_to_nanos(Instant::now())
    }

    fn ticks_per_second(&self) -> u64 {
        1_000_000_000
    }
}

/// Clock that only moves when told to
///
/// Clones share the same counter, so a test can hand one clone to a component and
/// advance time through another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
    hz: u64,
}

impl ManualClock {
    /// Clock starting at tick 0 with `hz` ticks per second
    pub fn new(hz: u64) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(0)),
            hz: hz.max(1),
        }
    }

    /// Move forward by `ticks`
    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// Jump to an absolute tick (ignored if it would go backwards)
    pub fn set(&self, ticks: u64) {
        self.ticks.fetch_max(ticks, Ordering::AcqRel);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl TickSource for ManualClock {
    #[inline(always)]
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    fn ticks_per_second(&self) -> u64 {
        self.hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(10);
        let view = clock.clone();

        clock.advance(5);
        assert_eq!(view.now(), 5);

        view.set(3);
        assert_eq!(clock.now(), 5);
        view.set(42);
        assert_eq!(clock.now(), 42);
        assert_eq!(clock.ticks_per_second(), 10);
    }
}
