//! Keyed store with per-entry idle expiry
//!
//! An `AgingMap` combines three owned parts: a slab pool holding the entries, a keyed index
//! resolving keys to slots, and a timer service holding one deadline per entry. Nothing
//! expires on its own; the owner calls `manage_timers` periodically from one context.

pub mod builder;
pub mod map;
pub mod statistics;

use std::sync::atomic::{AtomicU64, Ordering};

pub use builder::AgingMapBuilder;
pub use map::AgingMap;
pub use statistics::{AgingCounters, AgingStats, SweepReport};

/// What an expiry callback wants done with an entry whose deadline fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryDecision {
    /// Remove the entry
    Evict,
    /// Leave the entry in place without re-arming its timer
    Keep,
}

impl From<bool> for ExpiryDecision {
    /// `true` means evict
    fn from(evict: bool) -> Self {
        if evict {
            ExpiryDecision::Evict
        } else {
            ExpiryDecision::Keep
        }
    }
}

/// Callback run for each expired entry
pub type ExpiryCallback<K, V> = Box<dyn FnMut(&K, &mut V) -> ExpiryDecision + Send + Sync>;

/// Stable identity of an aging map
///
/// Entries record the id of the map that created them instead of its address, so a map
/// can be moved freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(u64);

impl MapId {
    pub(crate) fn next() -> Self {
        static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);
        MapId(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_ids_are_unique() {
        let a = MapId::next();
        let b = MapId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_decision_from_bool() {
        assert_eq!(ExpiryDecision::from(true), ExpiryDecision::Evict);
        assert_eq!(ExpiryDecision::from(false), ExpiryDecision::Keep);
    }
}
