//! Read/write-concurrent keyed index backed by `DashMap`

use std::hash::Hash;

use ahash::RandomState;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{INITIAL_RESERVE_LIMIT, IndexError, KeyedIndex, check_capacity};
use crate::config::{ComponentName, component_name};
use crate::error::TrackError;
use crate::pool::SlotHandle;

/// Sharded index; lookups take `&self` and may run from many threads at once
#[derive(Debug)]
pub struct ConcurrentIndex<K: Eq + Hash> {
    name: ComponentName,
    map: DashMap<K, SlotHandle, RandomState>,
    capacity: usize,
}

impl<K: Eq + Hash> ConcurrentIndex<K> {
    pub fn with_capacity(name: &str, capacity: usize) -> Result<Self, TrackError> {
        check_capacity(name, capacity)?;

        log::debug!("Created concurrent index '{}' bounded at {}", name, capacity);

        Ok(Self {
            name: component_name(name),
            map: DashMap::with_capacity_and_hasher(
                capacity.min(INITIAL_RESERVE_LIMIT),
                RandomState::new(),
            ),
            capacity,
        })
    }
}

impl<K: Eq + Hash> KeyedIndex<K> for ConcurrentIndex<K> {
    fn insert(&mut self, key: K, handle: SlotHandle) -> Result<(), IndexError> {
        if self.map.contains_key(&key) {
            return Err(IndexError::Duplicate);
        }
        if self.map.len() >= self.capacity {
            return Err(IndexError::Full);
        }
        match self.map.entry(key) {
            Entry::Occupied(_) => Err(IndexError::Duplicate),
            Entry::Vacant(vacant) => {
                vacant.insert(handle);
                Ok(())
            }
        }
    }

    #[inline]
    fn lookup(&self, key: &K) -> Option<SlotHandle> {
        self.map.get(key).map(|entry| *entry.value())
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<SlotHandle> {
        self.map.remove(key).map(|(_, handle)| handle)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn handles(&self) -> Vec<SlotHandle> {
        self.map.iter().map(|entry| *entry.value()).collect()
    }

    fn reset(&mut self) {
        self.map.clear();
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SlabPool;

    #[test]
    fn test_lookups_from_many_threads() {
        let mut pool = SlabPool::with_capacity("threads", 64).unwrap();
        let mut index = ConcurrentIndex::with_capacity("threads_ht", 64).unwrap();
        let mut expected = Vec::new();
        for key in 0u64..64 {
            let handle = pool.checkout(key).unwrap();
            index.insert(key, handle).unwrap();
            expected.push(handle);
        }

        let index = &index;
        let expected = &expected;
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(move || {
                    for key in 0u64..64 {
                        assert_eq!(index.lookup(&key), Some(expected[key as usize]));
                    }
                });
            }
        });
    }
}
