//! Slot and handle types for the slab pool
//!
//! Records never move once checked out; everything else refers to them by index.
//! `SlotIndex` is the raw position (used for internal links whose consistency the owning
//! structure guarantees), `SlotHandle` adds the slot generation so a handle that outlives
//! its record is detected instead of aliasing whatever reused the slot.

use std::fmt;
use std::num::NonZeroU32;

/// Slot generation counter
pub type Generation = u32;

/// Generation constants
pub mod generation {
    use super::Generation;

    /// First valid generation
    pub const FIRST: Generation = 1;
}

/// Position of a slot inside its pool (`Option<SlotIndex>` is 4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(NonZeroU32);

impl SlotIndex {
    /// Create from a zero-based position
    #[inline(always)]
    pub(crate) fn from_position(position: usize) -> Self {
        debug_assert!(position < u32::MAX as usize);
        // position + 1 is never zero for positions below u32::MAX
        Self(NonZeroU32::MIN.saturating_add(position as u32))
    }

    /// Zero-based position inside the pool
    #[inline(always)]
    pub fn position(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Generation-checked reference to a checked-out record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    index: SlotIndex,
    generation: Generation,
}

impl SlotHandle {
    #[inline(always)]
    pub(crate) fn new(index: SlotIndex, generation: Generation) -> Self {
        Self { index, generation }
    }

    /// Slot position this handle points at
    #[inline(always)]
    pub fn index(self) -> SlotIndex {
        self.index
    }

    /// Generation the slot had when this handle was issued
    #[inline(always)]
    pub fn generation(self) -> Generation {
        self.generation
    }
}

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index.position(), self.generation)
    }
}

/// One pool slot: the record (when checked out) plus its generation
#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub generation: Generation,
    pub value: Option<T>,
}

impl<T> Slot<T> {
    pub const fn empty() -> Self {
        Self {
            generation: generation::FIRST,
            value: None,
        }
    }

    #[inline(always)]
    pub fn is_occupied(&self) -> bool {
        self.value.is_some()
    }

    /// Take the record out and retire the current generation
    pub fn vacate(&mut self) -> Option<T> {
        let value = self.value.take();
        if value.is_some() {
            self.generation = self.generation.wrapping_add(1).max(generation::FIRST);
        }
        value
    }
}
