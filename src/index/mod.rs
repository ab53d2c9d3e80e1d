//! Keyed index mapping fixed-width keys to slab handles
//!
//! The aging map resolves keys through a `KeyedIndex`. Two implementations cover the two
//! concurrency modes a dataplane configures: a sharded `DashMap` whose lookups are safe from
//! many workers, and a plain `HashMap` for single-writer use. Both are bounded and refuse
//! inserts once full, the same way a pre-sized hardware-style table would.

pub mod concurrent;
pub mod exclusive;

use std::fmt;
use std::hash::Hash;

pub use concurrent::ConcurrentIndex;
pub use exclusive::ExclusiveIndex;

pub use crate::config::IndexConcurrency;
use crate::error::TrackError;
use crate::pool::SlotHandle;

/// Reason an index refused an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    /// The key is already present
    Duplicate,
    /// The index holds its configured maximum
    Full,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Duplicate => write!(f, "duplicate key"),
            IndexError::Full => write!(f, "index full"),
        }
    }
}

impl std::error::Error for IndexError {}

/// Bounded key to handle table
pub trait KeyedIndex<K> {
    /// Insert a new key; never overwrites an existing one
    fn insert(&mut self, key: K, handle: SlotHandle) -> Result<(), IndexError>;

    fn lookup(&self, key: &K) -> Option<SlotHandle>;

    fn remove(&mut self, key: &K) -> Option<SlotHandle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of keys
    fn capacity(&self) -> usize;

    /// Snapshot of every stored handle
    fn handles(&self) -> Vec<SlotHandle>;

    /// Drop every key
    fn reset(&mut self);

    /// Diagnostic name
    fn name(&self) -> &str;
}

/// Index selected at runtime from `IndexConcurrency`
#[derive(Debug)]
pub enum AnyIndex<K: Eq + Hash> {
    Concurrent(ConcurrentIndex<K>),
    Exclusive(ExclusiveIndex<K>),
}

impl<K: Eq + Hash> AnyIndex<K> {
    pub fn new(
        name: &str,
        capacity: usize,
        concurrency: IndexConcurrency,
    ) -> Result<Self, TrackError> {
        Ok(match concurrency {
            IndexConcurrency::ReadWriteConcurrent => {
                AnyIndex::Concurrent(ConcurrentIndex::with_capacity(name, capacity)?)
            }
            IndexConcurrency::SingleWriter => {
                AnyIndex::Exclusive(ExclusiveIndex::with_capacity(name, capacity)?)
            }
        })
    }

    pub fn concurrency(&self) -> IndexConcurrency {
        match self {
            AnyIndex::Concurrent(_) => IndexConcurrency::ReadWriteConcurrent,
            AnyIndex::Exclusive(_) => IndexConcurrency::SingleWriter,
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $index:ident => $body:expr) => {
        match $self {
            AnyIndex::Concurrent($index) => $body,
            AnyIndex::Exclusive($index) => $body,
        }
    };
}

impl<K: Eq + Hash> KeyedIndex<K> for AnyIndex<K> {
    #[inline]
    fn insert(&mut self, key: K, handle: SlotHandle) -> Result<(), IndexError> {
        dispatch!(self, index => index.insert(key, handle))
    }

    #[inline]
    fn lookup(&self, key: &K) -> Option<SlotHandle> {
        dispatch!(self, index => index.lookup(key))
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<SlotHandle> {
        dispatch!(self, index => index.remove(key))
    }

    fn len(&self) -> usize {
        dispatch!(self, index => index.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, index => index.capacity())
    }

    fn handles(&self) -> Vec<SlotHandle> {
        dispatch!(self, index => index.handles())
    }

    fn reset(&mut self) {
        dispatch!(self, index => index.reset())
    }

    fn name(&self) -> &str {
        dispatch!(self, index => index.name())
    }
}

/// Validate index construction parameters
pub(crate) fn check_capacity(name: &str, capacity: usize) -> Result<(), TrackError> {
    if capacity == 0 {
        return Err(TrackError::init(format!(
            "index '{}' needs a non-zero capacity",
            name
        )));
    }
    Ok(())
}

/// Upfront reservation cap; larger indexes grow into their bound on demand
pub(crate) const INITIAL_RESERVE_LIMIT: usize = 1 << 16;
