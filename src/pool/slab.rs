//! Fixed-capacity slab pool
//!
//! Pre-allocates every slot at construction and never grows. Checkout pops a free
//! position off a stack and checkin pushes it back, both O(1). Exhaustion is an ordinary,
//! immediate failure that the caller turns into backpressure.

use std::fmt;

use super::statistics::PoolStats;
use super::types::{Slot, SlotHandle, SlotIndex};
use crate::config::{ComponentName, component_name};
use crate::error::TrackError;

/// Slab pool failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot is checked out
    Exhausted { pool: ComponentName },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Exhausted { pool } => write!(f, "pool '{}' exhausted", pool),
        }
    }
}

impl std::error::Error for PoolError {}

/// Fixed-capacity pool of `T` records addressed by slot handles
#[derive(Debug)]
pub struct SlabPool<T> {
    name: ComponentName,
    slots: Box<[Slot<T>]>,
    /// Free slot stack, lowest position on top
    free_slots: Vec<u32>,
    checkouts: u64,
    checkins: u64,
    exhausted: u64,
}

impl<T> SlabPool<T> {
    /// Largest capacity a pool accepts (positions must fit a `SlotIndex`)
    pub const MAX_CAPACITY: usize = (u32::MAX - 1) as usize;

    /// Create a pool with `capacity` pre-allocated slots
    pub fn with_capacity(name: &str, capacity: usize) -> Result<Self, TrackError> {
        if capacity == 0 {
            return Err(TrackError::init(format!(
                "pool '{}' needs a non-zero capacity",
                name
            )));
        }
        if capacity > Self::MAX_CAPACITY {
            return Err(TrackError::init(format!(
                "pool '{}' capacity {} exceeds {}",
                name,
                capacity,
                Self::MAX_CAPACITY
            )));
        }

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|e| {
            TrackError::init(format!("pool '{}' allocation of {} slots: {}", name, capacity, e))
        })?;
        slots.extend((0..capacity).map(|_| Slot::empty()));

        let free_slots: Vec<u32> = (0..capacity as u32).rev().collect();

        log::debug!("Created slab pool '{}' with {} slots", name, capacity);

        Ok(Self {
            name: component_name(name),
            slots: slots.into_boxed_slice(),
            free_slots,
            checkouts: 0,
            checkins: 0,
            exhausted: 0,
        })
    }

    /// Move `value` into a free slot
    pub fn checkout(&mut self, value: T) -> Result<SlotHandle, PoolError> {
        self.checkout_with(|| value)
    }

    /// Acquire a free slot, then build the record in it
    ///
    /// `make` only runs once a slot is secured, so an exhausted pool never constructs.
    pub fn checkout_with(&mut self, make: impl FnOnce() -> T) -> Result<SlotHandle, PoolError> {
        let Some(position) = self.free_slots.pop() else {
            self.exhausted += 1;
            log::trace!("Slab pool '{}' exhausted", self.name);
            return Err(PoolError::Exhausted { pool: self.name });
        };

        let index = SlotIndex::from_position(position as usize);
        let slot = &mut self.slots[position as usize];
        debug_assert!(!slot.is_occupied(), "free stack handed out an occupied slot");
        slot.value = Some(make());
        self.checkouts += 1;

        Ok(SlotHandle::new(index, slot.generation))
    }

    /// Return a slot to the pool, yielding its record
    ///
    /// Stale or vacant handles return `None` and leave the pool untouched.
    pub fn checkin(&mut self, handle: SlotHandle) -> Option<T> {
        let position = handle.index().position();
        let slot = self.slots.get_mut(position)?;
        if slot.generation != handle.generation() || !slot.is_occupied() {
            return None;
        }

        let value = slot.vacate();
        self.free_slots.push(position as u32);
        self.checkins += 1;
        value
    }

    /// Get the record behind a handle
    #[inline(always)]
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        self.slots
            .get(handle.index().position())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    /// Get the mutable record behind a handle
    #[inline(always)]
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index().position())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Check whether a handle still refers to a live record
    #[inline(always)]
    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Get the record at a raw position, whatever its generation
    #[inline(always)]
    pub(crate) fn get_at(&self, index: SlotIndex) -> Option<&T> {
        self.slots
            .get(index.position())
            .and_then(|slot| slot.value.as_ref())
    }

    /// Get the mutable record at a raw position, whatever its generation
    #[inline(always)]
    pub(crate) fn get_at_mut(&mut self, index: SlotIndex) -> Option<&mut T> {
        self.slots
            .get_mut(index.position())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Current handle of an occupied position
    #[inline(always)]
    pub(crate) fn handle_at(&self, index: SlotIndex) -> Option<SlotHandle> {
        self.slots
            .get(index.position())
            .filter(|slot| slot.is_occupied())
            .map(|slot| SlotHandle::new(index, slot.generation))
    }

    /// Iterate over every checked-out record
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(position, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotHandle::new(SlotIndex::from_position(position), slot.generation),
                    value,
                )
            })
        })
    }

    /// Check every record back in, returning how many were live
    pub fn reset(&mut self) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut() {
            if slot.vacate().is_some() {
                released += 1;
            }
        }

        self.free_slots.clear();
        self.free_slots.extend((0..self.slots.len() as u32).rev());
        self.checkins += released as u64;
        released
    }

    /// Get pool name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get capacity
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get checked-out slot count
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Get available slot count
    pub fn available(&self) -> usize {
        self.free_slots.len()
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            name: self.name,
            capacity: self.capacity(),
            in_use: self.in_use(),
            available: self.available(),
            checkouts: self.checkouts,
            checkins: self.checkins,
            exhausted: self.exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_until_exhausted() {
        let mut pool = SlabPool::with_capacity("test_mp", 3).unwrap();

        let handles: Vec<_> = (0..3).map(|i| pool.checkout(i).unwrap()).collect();
        assert_eq!(pool.in_use(), 3);
        assert_eq!(pool.available(), 0);

        let err = pool.checkout(99).unwrap_err();
        assert_eq!(
            err,
            PoolError::Exhausted {
                pool: component_name("test_mp")
            }
        );
        assert_eq!(pool.stats().exhausted, 1);

        assert_eq!(pool.checkin(handles[1]), Some(1));
        assert!(pool.checkout(5).is_ok());
    }

    #[test]
    fn test_checkout_with_skips_construction_when_exhausted() {
        let mut pool = SlabPool::with_capacity("test_mp", 1).unwrap();
        pool.checkout(0u32).unwrap();

        let mut constructed = false;
        let result = pool.checkout_with(|| {
            constructed = true;
            1
        });
        assert!(result.is_err());
        assert!(!constructed);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut pool = SlabPool::with_capacity("test_mp", 1).unwrap();

        let first = pool.checkout("a").unwrap();
        assert_eq!(pool.checkin(first), Some("a"));

        // Same position, new generation
        let second = pool.checkout("b").unwrap();
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());

        assert_eq!(pool.get(first), None);
        assert_eq!(pool.checkin(first), None);
        assert_eq!(pool.get(second), Some(&"b"));
    }

    #[test]
    fn test_double_checkin_is_noop() {
        let mut pool = SlabPool::with_capacity("test_mp", 2).unwrap();
        let handle = pool.checkout(1u32).unwrap();

        assert_eq!(pool.checkin(handle), Some(1));
        assert_eq!(pool.checkin(handle), None);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.stats().checkins, 1);
    }

    #[test]
    fn test_reset_releases_everything() {
        let mut pool = SlabPool::with_capacity("test_mp", 4).unwrap();
        let handles: Vec<_> = (0..4).map(|i| pool.checkout(i).unwrap()).collect();

        assert_eq!(pool.reset(), 4);
        assert_eq!(pool.available(), 4);
        assert!(handles.iter().all(|h| !pool.contains(*h)));

        // Full capacity is usable again
        for i in 0..4 {
            pool.checkout(i).unwrap();
        }
        assert!(pool.checkout(4).is_err());
    }

    #[test]
    fn test_zero_capacity_fails_construction() {
        let result = SlabPool::<u8>::with_capacity("empty", 0);
        assert!(matches!(result, Err(TrackError::InitializationFailure(_))));
    }

    #[test]
    fn test_iter_visits_live_records_only() {
        let mut pool = SlabPool::with_capacity("test_mp", 4).unwrap();
        let a = pool.checkout('a').unwrap();
        let b = pool.checkout('b').unwrap();
        pool.checkout('c').unwrap();
        pool.checkin(b);

        let live: Vec<char> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec!['a', 'c']);
        assert_eq!(pool.handle_at(a.index()), Some(a));
        assert_eq!(pool.handle_at(b.index()), None);
    }
}
