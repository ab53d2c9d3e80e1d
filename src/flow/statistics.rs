//! Flow table statistics with atomic counters
//!
//! Lookups run through `&self` (possibly from several workers), so counters are atomics
//! padded to their own cache line.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::pool::PoolStats;

/// Lock-free operation counters
#[derive(Debug, Default)]
pub struct FlowCounters {
    lookups: CachePadded<AtomicU64>,
    hits: CachePadded<AtomicU64>,
    created: CachePadded<AtomicU64>,
    existing: CachePadded<AtomicU64>,
    exhausted: CachePadded<AtomicU64>,
    deleted: CachePadded<AtomicU64>,
}

impl FlowCounters {
    #[inline(always)]
    pub fn record_lookup(&self, hit: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline(always)]
    pub fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_existing(&self) {
        self.existing.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            existing: self.existing.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.lookups,
            &self.hits,
            &self.created,
            &self.existing,
            &self.exhausted,
            &self.deleted,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Flow table statistics snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTableStats {
    /// Live flows
    pub flows: usize,
    /// Directory slots heading a chain
    pub occupied_pages: usize,
    pub directory_len: usize,
    /// Longest collision chain
    pub longest_chain: usize,
    pub lookups: u64,
    pub hits: u64,
    /// Inserts that created a flow
    pub created: u64,
    /// Inserts that found the flow already present
    pub existing: u64,
    /// Inserts refused for lack of pool space
    pub exhausted: u64,
    pub deleted: u64,
    pub buckets: PoolStats,
    pub descriptors: PoolStats,
}

impl FlowTableStats {
    /// Lookup hit ratio (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        if self.lookups > 0 {
            self.hits as f64 / self.lookups as f64
        } else {
            0.0
        }
    }

    /// Average chain length over occupied pages
    pub fn average_chain(&self) -> f64 {
        if self.occupied_pages > 0 {
            self.flows as f64 / self.occupied_pages as f64
        } else {
            0.0
        }
    }
}

pub(crate) struct CounterSnapshot {
    pub lookups: u64,
    pub hits: u64,
    pub created: u64,
    pub existing: u64,
    pub exhausted: u64,
    pub deleted: u64,
}
