//! Chain node linking a five-tuple to its descriptor

use super::five_tuple::FiveTuple;
use crate::pool::SlotIndex;

/// Doubly linked chain node
#[derive(Debug, Clone)]
pub struct TrackBucket {
    pub(crate) tuple: FiveTuple,
    /// Low byte of the flow hash
    pub(crate) discriminator: u8,
    /// Directory slot whose chain holds this node
    pub(crate) page: u32,
    pub(crate) prev: Option<SlotIndex>,
    pub(crate) next: Option<SlotIndex>,
    pub(crate) descriptor: SlotIndex,
}

impl TrackBucket {
    pub(crate) fn new(
        tuple: FiveTuple,
        discriminator: u8,
        page: u32,
        descriptor: SlotIndex,
        prev: Option<SlotIndex>,
    ) -> Self {
        Self {
            tuple,
            discriminator,
            page,
            prev,
            next: None,
            descriptor,
        }
    }

    /// Discriminator first, full bidirectional tuple comparison only on a byte match
    #[inline(always)]
    pub(crate) fn matches(&self, discriminator: u8, tuple: &FiveTuple) -> bool {
        self.discriminator == discriminator && self.tuple.matches(tuple)
    }

    pub fn tuple(&self) -> &FiveTuple {
        &self.tuple
    }

    pub fn discriminator(&self) -> u8 {
        self.discriminator
    }
}
