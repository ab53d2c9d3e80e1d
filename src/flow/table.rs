//! Flow table: directory + bucket and descriptor pools
//!
//! `lookup` and `insert` address the directory with the top bits of the flow hash and walk
//! the collision chain comparing the discriminator byte before the full tuple. `delete`
//! reaches the bucket through the descriptor's back-reference, so it never rescans a chain.
//! Records are created only by `insert` and destroyed only by `delete` or `clear`; idle
//! expiry is composed on top (see `SessionTable`).

use super::bucket::TrackBucket;
use super::descriptor::{DescriptorHandle, TrackDescriptor};
use super::directory::Directory;
use super::five_tuple::FiveTuple;
use super::statistics::{FlowCounters, FlowTableStats};
use crate::clock::{MonotonicClock, TickSource};
use crate::config::FlowTableConfig;
use crate::error::TrackError;
use crate::pool::{SlabPool, SlotIndex};

/// Outcome of walking a chain for a tuple
enum Probe {
    /// Bucket holding the flow
    Found(SlotIndex),
    /// No match; last node of the chain (None when the page is empty)
    Missing { tail: Option<SlotIndex> },
}

/// Bidirectional flow table keyed by (hash, five-tuple)
#[derive(Debug)]
pub struct FlowTable<C: TickSource = MonotonicClock> {
    config: FlowTableConfig,
    directory: Directory,
    buckets: SlabPool<TrackBucket>,
    descriptors: SlabPool<TrackDescriptor>,
    clock: C,
    counters: FlowCounters,
}

impl FlowTable<MonotonicClock> {
    /// Create a flow table timestamping flows with the monotonic clock
    pub fn new(config: FlowTableConfig) -> Result<Self, TrackError> {
        Self::with_clock(config, MonotonicClock)
    }
}

impl<C: TickSource> FlowTable<C> {
    /// Create a flow table with an explicit tick source
    pub fn with_clock(config: FlowTableConfig, clock: C) -> Result<Self, TrackError> {
        config.validate()?;

        let directory = Directory::new(config.directory_bits)?;
        let buckets = SlabPool::with_capacity(
            &format!("{}_buckets", config.name),
            config.bucket_capacity as usize,
        )?;
        let descriptors = SlabPool::with_capacity(
            &format!("{}_descriptors", config.name),
            config.descriptor_capacity as usize,
        )?;

        log::debug!(
            "Flow table '{}' ready: {} directory slots, {} buckets, {} descriptors",
            config.name,
            directory.len(),
            config.bucket_capacity,
            config.descriptor_capacity
        );

        Ok(Self {
            config,
            directory,
            buckets,
            descriptors,
            clock,
            counters: FlowCounters::default(),
        })
    }

    /// Walk the chain of `page` looking for `tuple` in either direction
    #[inline]
    fn probe(&self, page: u32, discriminator: u8, tuple: &FiveTuple) -> Probe {
        let mut cursor = self.directory.head(page);
        let mut tail = None;

        while let Some(index) = cursor {
            let Some(bucket) = self.buckets.get_at(index) else {
                debug_assert!(false, "chain link to a vacant bucket");
                break;
            };
            if bucket.matches(discriminator, tuple) {
                return Probe::Found(index);
            }
            tail = Some(index);
            cursor = bucket.next;
        }

        Probe::Missing { tail }
    }

    /// Descriptor handle of the bucket at `index`
    #[inline]
    fn descriptor_of(&self, index: SlotIndex) -> Option<DescriptorHandle> {
        let bucket = self.buckets.get_at(index)?;
        self.descriptors
            .handle_at(bucket.descriptor)
            .map(DescriptorHandle)
    }

    /// Find the flow for `tuple` (either direction)
    pub fn lookup(&self, hash: u32, tuple: &FiveTuple) -> Option<DescriptorHandle> {
        let page = self.directory.page_of(hash);
        let found = match self.probe(page, Directory::discriminator(hash), tuple) {
            Probe::Found(index) => self.descriptor_of(index),
            Probe::Missing { .. } => None,
        };
        self.counters.record_lookup(found.is_some());
        found
    }

    /// Find the flow for `tuple` and resolve its descriptor
    pub fn lookup_descriptor(&self, hash: u32, tuple: &FiveTuple) -> Option<&TrackDescriptor> {
        self.lookup(hash, tuple)
            .and_then(|handle| self.descriptor(handle))
    }

    /// Find-or-create; false only when a pool is exhausted
    pub fn insert(&mut self, hash: u32, tuple: &FiveTuple, rule_id: u16) -> bool {
        self.try_insert(hash, tuple, rule_id).is_ok()
    }

    /// Find-or-create returning the flow's descriptor handle
    ///
    /// An existing flow (matched in either direction) is returned as is. A new flow gets a
    /// descriptor stamped with the current tick and `(rule_id, 100)` as its first match,
    /// appended at the tail of its chain. On failure nothing is left checked out.
    pub fn try_insert(
        &mut self,
        hash: u32,
        tuple: &FiveTuple,
        rule_id: u16,
    ) -> Result<DescriptorHandle, TrackError> {
        let page = self.directory.page_of(hash);
        let discriminator = Directory::discriminator(hash);

        let tail = match self.probe(page, discriminator, tuple) {
            Probe::Found(index) => {
                self.counters.record_existing();
                return self.descriptor_of(index).ok_or(TrackError::NotFound);
            }
            Probe::Missing { tail } => tail,
        };

        let now = self.clock.now();
        let descriptor = self
            .descriptors
            .checkout_with(|| TrackDescriptor::new(rule_id, now))
            .map_err(|err| {
                self.counters.record_exhausted();
                log::trace!("Flow insert refused: {}", err);
                TrackError::from(err)
            })?;

        let bucket = match self.buckets.checkout_with(|| {
            TrackBucket::new(*tuple, discriminator, page, descriptor.index(), tail)
        }) {
            Ok(bucket) => bucket,
            Err(err) => {
                self.descriptors.checkin(descriptor);
                self.counters.record_exhausted();
                log::trace!("Flow insert refused: {}", err);
                return Err(err.into());
            }
        };

        if let Some(record) = self.descriptors.get_mut(descriptor) {
            record.attach(bucket.index());
        }

        match tail {
            None => self.directory.set_head(page, Some(bucket.index())),
            Some(tail) => {
                if let Some(previous) = self.buckets.get_at_mut(tail) {
                    previous.next = Some(bucket.index());
                }
            }
        }

        self.counters.record_created();
        Ok(DescriptorHandle(descriptor))
    }

    /// Remove a flow by descriptor handle
    ///
    /// `None` and handles of already deleted flows return false and change nothing. The
    /// bucket is unlinked in O(1) through the descriptor's back-reference, then both
    /// records go back to their pools and the handle stops resolving.
    pub fn delete(&mut self, hash: u32, descriptor: Option<DescriptorHandle>) -> bool {
        let Some(DescriptorHandle(handle)) = descriptor else {
            return false;
        };
        let Some(bucket_index) = self.descriptors.get(handle).and_then(|d| d.bucket()) else {
            return false;
        };
        let Some(bucket) = self.buckets.get_at(bucket_index) else {
            debug_assert!(false, "descriptor points at a vacant bucket");
            return false;
        };
        let (page, prev, next) = (bucket.page, bucket.prev, bucket.next);

        if page != self.directory.page_of(hash) {
            log::warn!(
                "Flow delete with hash {:#010x} for a flow stored on page {:#x}",
                hash,
                page
            );
        }

        match (prev, next) {
            // Sole node
            (None, None) => self.directory.set_head(page, None),
            // Head with successor
            (None, Some(next)) => {
                debug_assert_eq!(self.directory.head(page), Some(bucket_index));
                self.directory.set_head(page, Some(next));
                if let Some(successor) = self.buckets.get_at_mut(next) {
                    successor.prev = None;
                }
            }
            // Tail
            (Some(prev), None) => {
                if let Some(predecessor) = self.buckets.get_at_mut(prev) {
                    predecessor.next = None;
                }
            }
            // Middle
            (Some(prev), Some(next)) => {
                if let Some(predecessor) = self.buckets.get_at_mut(prev) {
                    predecessor.next = Some(next);
                }
                if let Some(successor) = self.buckets.get_at_mut(next) {
                    successor.prev = Some(prev);
                }
            }
        }

        if let Some(bucket_handle) = self.buckets.handle_at(bucket_index) {
            self.buckets.checkin(bucket_handle);
        }
        self.descriptors.checkin(handle);
        self.counters.record_deleted();
        true
    }

    /// Resolve a descriptor handle
    pub fn descriptor(&self, handle: DescriptorHandle) -> Option<&TrackDescriptor> {
        self.descriptors.get(handle.0)
    }

    /// Resolve a descriptor handle for update (recording further matched rules)
    pub fn descriptor_mut(&mut self, handle: DescriptorHandle) -> Option<&mut TrackDescriptor> {
        self.descriptors.get_mut(handle.0)
    }

    /// Stamp a flow with the current tick; false if the handle is stale
    pub fn touch(&mut self, handle: DescriptorHandle) -> bool {
        let now = self.clock.now();
        match self.descriptors.get_mut(handle.0) {
            Some(descriptor) => {
                descriptor.touch(now);
                true
            }
            None => false,
        }
    }

    /// Tuple a flow was created with
    pub fn tuple_of(&self, handle: DescriptorHandle) -> Option<&FiveTuple> {
        let bucket = self.descriptor(handle)?.bucket()?;
        self.buckets.get_at(bucket).map(|bucket| bucket.tuple())
    }

    /// Number of flows chained on the page `hash` addresses
    pub fn chain_len(&self, hash: u32) -> usize {
        let mut len = 0;
        let mut cursor = self.directory.head(self.directory.page_of(hash));
        while let Some(index) = cursor {
            len += 1;
            cursor = self.buckets.get_at(index).and_then(|bucket| bucket.next);
        }
        len
    }

    /// Live flows with their descriptors, in pool order
    pub fn iter(&self) -> impl Iterator<Item = (&FiveTuple, &TrackDescriptor)> + '_ {
        self.buckets.iter().filter_map(|(_, bucket)| {
            self.descriptors
                .get_at(bucket.descriptor)
                .map(|descriptor| (&bucket.tuple, descriptor))
        })
    }

    /// Remove every flow, returning how many were live
    pub fn clear(&mut self) -> usize {
        let flows = self.descriptors.reset();
        self.buckets.reset();
        self.directory.clear();
        log::debug!("Flow table '{}' cleared {} flows", self.config.name, flows);
        flows
    }

    /// Number of live flows
    pub fn len(&self) -> usize {
        self.descriptors.in_use()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &FlowTableConfig {
        &self.config
    }

    /// Statistics snapshot (walks every chain to find the longest)
    pub fn stats(&self) -> FlowTableStats {
        let longest_chain = self
            .buckets
            .iter()
            .filter(|(_, bucket)| bucket.prev.is_none())
            .map(|(_, head)| {
                let mut len = 1;
                let mut cursor = head.next;
                while let Some(index) = cursor {
                    len += 1;
                    cursor = self.buckets.get_at(index).and_then(|bucket| bucket.next);
                }
                len
            })
            .max()
            .unwrap_or(0);

        let counters = self.counters.snapshot();
        FlowTableStats {
            flows: self.len(),
            occupied_pages: self.directory.occupied(),
            directory_len: self.directory.len(),
            longest_chain,
            lookups: counters.lookups,
            hits: counters.hits,
            created: counters.created,
            existing: counters.existing,
            exhausted: counters.exhausted,
            deleted: counters.deleted,
            buckets: self.buckets.stats(),
            descriptors: self.descriptors.stats(),
        }
    }

    /// Reset operation counters (pool and directory state is untouched)
    pub fn reset_counters(&self) {
        self.counters.reset();
    }
}
