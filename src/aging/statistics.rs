//! Aging map counters and statistics snapshot

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::config::ComponentName;
use crate::pool::PoolStats;

/// Atomic operation counters for one aging map
#[derive(Debug, Default)]
pub struct AgingCounters {
    hits: CachePadded<AtomicU64>,
    misses: CachePadded<AtomicU64>,
    inserted: CachePadded<AtomicU64>,
    exhausted: CachePadded<AtomicU64>,
    rejected: CachePadded<AtomicU64>,
    erased: CachePadded<AtomicU64>,
    expired: CachePadded<AtomicU64>,
    evicted: CachePadded<AtomicU64>,
    kept: CachePadded<AtomicU64>,
}

impl AgingCounters {
    #[inline(always)]
    pub fn record_lookup(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_inserted(&self) {
        self.inserted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_erased(&self) {
        self.erased.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one sweep into the running totals
    pub fn record_sweep(&self, report: &SweepReport) {
        self.expired
            .fetch_add(report.expired as u64, Ordering::Relaxed);
        self.evicted
            .fetch_add(report.evicted as u64, Ordering::Relaxed);
        self.kept.fetch_add(report.kept as u64, Ordering::Relaxed);
    }

    fn load(counter: &CachePadded<AtomicU64>) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Outcome of one `manage_timers` sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Deadlines that fired for live entries
    pub expired: usize,
    /// Entries removed (no callback, or the callback chose eviction)
    pub evicted: usize,
    /// Entries the callback chose to keep
    pub kept: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired == 0
    }
}

/// Aging map statistics snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct AgingStats {
    pub name: ComponentName,
    pub len: usize,
    pub capacity: usize,
    pub ttl_ticks: u64,
    /// Armed timers (kept entries have none)
    pub pending_timers: usize,
    pub hits: u64,
    pub misses: u64,
    pub inserted: u64,
    /// Emplaces refused for lack of pool space
    pub exhausted: u64,
    /// Emplaces the index refused
    pub rejected: u64,
    pub erased: u64,
    pub expired: u64,
    pub evicted: u64,
    pub kept: u64,
    pub pool: PoolStats,
}

impl AgingStats {
    pub(crate) fn collect(
        name: ComponentName,
        len: usize,
        ttl_ticks: u64,
        pending_timers: usize,
        counters: &AgingCounters,
        pool: PoolStats,
    ) -> Self {
        Self {
            name,
            len,
            capacity: pool.capacity,
            ttl_ticks,
            pending_timers,
            hits: AgingCounters::load(&counters.hits),
            misses: AgingCounters::load(&counters.misses),
            inserted: AgingCounters::load(&counters.inserted),
            exhausted: AgingCounters::load(&counters.exhausted),
            rejected: AgingCounters::load(&counters.rejected),
            erased: AgingCounters::load(&counters.erased),
            expired: AgingCounters::load(&counters.expired),
            evicted: AgingCounters::load(&counters.evicted),
            kept: AgingCounters::load(&counters.kept),
            pool,
        }
    }

    /// Lookup hit ratio (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}
