//! Hash-addressed array of chain heads
//!
//! The 32-bit flow hash is split: the top `bits` bits index the directory directly and
//! the low 8 bits become the per-bucket discriminator. With an evenly distributed hash the
//! directory is a branch-free O(1) address table and chains only form for flows that
//! collide on the page.

use crate::config::types::MAX_DIRECTORY_BITS;
use crate::error::TrackError;
use crate::pool::SlotIndex;

#[derive(Debug)]
pub struct Directory {
    heads: Box<[Option<SlotIndex>]>,
    shift: u32,
    occupied: usize,
}

impl Directory {
    pub fn new(bits: u8) -> Result<Self, TrackError> {
        if !(1..=MAX_DIRECTORY_BITS).contains(&bits) {
            return Err(TrackError::init(format!(
                "directory width {} outside 1..={} bits",
                bits, MAX_DIRECTORY_BITS
            )));
        }

        let len = 1usize << bits;
        let mut heads = Vec::new();
        heads.try_reserve_exact(len).map_err(|e| {
            TrackError::init(format!("directory allocation of {} slots: {}", len, e))
        })?;
        heads.resize(len, None);

        Ok(Self {
            heads: heads.into_boxed_slice(),
            shift: 32 - bits as u32,
            occupied: 0,
        })
    }

    /// Directory slot addressed by the top bits of `hash`
    #[inline(always)]
    pub fn page_of(&self, hash: u32) -> u32 {
        hash >> self.shift
    }

    /// Per-bucket pre-filter byte
    #[inline(always)]
    pub fn discriminator(hash: u32) -> u8 {
        (hash & 0xff) as u8
    }

    #[inline(always)]
    pub fn head(&self, page: u32) -> Option<SlotIndex> {
        self.heads[page as usize]
    }

    #[inline]
    pub fn set_head(&mut self, page: u32, head: Option<SlotIndex>) {
        let slot = &mut self.heads[page as usize];
        match (slot.is_some(), head.is_some()) {
            (false, true) => self.occupied += 1,
            (true, false) => self.occupied -= 1,
            _ => {}
        }
        *slot = head;
    }

    /// Slots heading a non-empty chain
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    pub fn clear(&mut self) {
        self.heads.fill(None);
        self.occupied = 0;
    }
}
