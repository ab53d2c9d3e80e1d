//! Single-writer keyed index backed by `HashMap`

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use ahash::RandomState;

use super::{INITIAL_RESERVE_LIMIT, IndexError, KeyedIndex, check_capacity};
use crate::config::{ComponentName, component_name};
use crate::error::TrackError;
use crate::pool::SlotHandle;

/// Plain hash index for a component owned by one execution context
#[derive(Debug)]
pub struct ExclusiveIndex<K: Eq + Hash> {
    name: ComponentName,
    map: HashMap<K, SlotHandle, RandomState>,
    capacity: usize,
}

impl<K: Eq + Hash> ExclusiveIndex<K> {
    pub fn with_capacity(name: &str, capacity: usize) -> Result<Self, TrackError> {
        check_capacity(name, capacity)?;

        log::debug!("Created exclusive index '{}' bounded at {}", name, capacity);

        Ok(Self {
            name: component_name(name),
            map: HashMap::with_capacity_and_hasher(
                capacity.min(INITIAL_RESERVE_LIMIT),
                RandomState::new(),
            ),
            capacity,
        })
    }
}

impl<K: Eq + Hash> KeyedIndex<K> for ExclusiveIndex<K> {
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
        self.map.get(key).copied()
    }

    #[inline]
    fn remove(&mut self, key: &K) -> Option<SlotHandle> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn handles(&self) -> Vec<SlotHandle> {
        self.map.values().copied().collect()
    }

    fn reset(&mut self) {
        self.map.clear();
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
