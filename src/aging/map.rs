//! Aging map: pooled entries, keyed index, one deadline per entry

use std::fmt;
use std::hash::Hash;

use super::statistics::{AgingCounters, AgingStats, SweepReport};
use super::{ExpiryCallback, ExpiryDecision, MapId};
use crate::clock::{MonotonicClock, TickSource};
use crate::config::{AgingMapConfig, ComponentName};
use crate::error::TrackError;
use crate::index::{AnyIndex, KeyedIndex};
use crate::pool::{SlabPool, SlotHandle};
use crate::timer::{DeadlineQueue, TimerHandle, TimerService};

/// One stored key/value with its armed deadline
#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    /// None once the deadline fired and the callback kept the entry
    timer: Option<TimerHandle>,
    owner: MapId,
}

/// Keyed store whose entries expire `ttl` ticks after their last TTL-extending access
///
/// Capacity is fixed at construction; inserts beyond it fail immediately. Values are never
/// overwritten: `try_emplace` on a present key returns the existing value.
pub struct AgingMap<K, V, C = MonotonicClock, I = AnyIndex<K>, T = DeadlineQueue<SlotHandle>>
where
    K: Eq + Hash,
{
    id: MapId,
    name: ComponentName,
    ttl_ticks: u64,
    pool: SlabPool<Entry<K, V>>,
    index: I,
    timers: T,
    clock: C,
    on_expire: Option<ExpiryCallback<K, V>>,
    counters: AgingCounters,
}

impl<K, V, C> AgingMap<K, V, C>
where
    K: Eq + Hash + Clone,
    C: TickSource,
{
    /// Create a map from configuration, with the index mode it names
    pub fn new(config: AgingMapConfig, clock: C) -> Result<Self, TrackError> {
        config.validate()?;
        let index = AnyIndex::new(
            &config.index_name(),
            config.capacity as usize,
            config.index_concurrency,
        )?;
        Self::with_parts(config, clock, index, DeadlineQueue::new())
    }
}

impl<K, V, C, I, T> AgingMap<K, V, C, I, T>
where
    K: Eq + Hash + Clone,
    C: TickSource,
    I: KeyedIndex<K>,
    T: TimerService<SlotHandle>,
{
    /// Create a map over caller-supplied index and timer service
    ///
    /// Both must be empty; the map takes exclusive ownership of them.
    pub fn with_parts(
        config: AgingMapConfig,
        clock: C,
        index: I,
        timers: T,
    ) -> Result<Self, TrackError> {
        config.validate()?;
        if !index.is_empty() || timers.pending() != 0 {
            return Err(TrackError::init(format!(
                "aging map '{}' needs an empty index and timer service",
                config.base_name
            )));
        }

        let ttl_ticks = config.ttl.to_ticks(clock.ticks_per_second());
        if ttl_ticks == 0 {
            return Err(TrackError::init(format!(
                "aging map '{}' ttl resolves to zero ticks",
                config.base_name
            )));
        }

        let pool = SlabPool::with_capacity(&config.pool_name(), config.capacity as usize)?;

        log::debug!(
            "Aging map '{}' ready: capacity {}, ttl {} ticks, index '{}'",
            config.base_name,
            config.capacity,
            ttl_ticks,
            index.name()
        );

        Ok(Self {
            id: MapId::next(),
            name: config.base_name,
            ttl_ticks,
            pool,
            index,
            timers,
            clock,
            on_expire: None,
            counters: AgingCounters::default(),
        })
    }

    /// Install the expiry callback
    pub fn with_expiry(
        mut self,
        on_expire: impl FnMut(&K, &mut V) -> ExpiryDecision + Send + Sync + 'static,
    ) -> Self {
        self.on_expire = Some(Box::new(on_expire));
        self
    }

    pub(crate) fn set_expiry(&mut self, on_expire: Option<ExpiryCallback<K, V>>) {
        self.on_expire = on_expire;
    }

    #[inline]
    fn deadline(&self) -> u64 {
        self.clock.now().saturating_add(self.ttl_ticks)
    }

    /// Get-or-create; `None` when the pool or index is full
    pub fn try_emplace(&mut self, key: K, make: impl FnOnce() -> V) -> Option<&mut V> {
        self.try_emplace_with_result(key, make).ok()
    }

    /// Get-or-create reporting why an insert failed
    ///
    /// A present key has its deadline pushed out and its value returned untouched; `make`
    /// is not called. A failed insert leaves the map exactly as it was.
    pub fn try_emplace_with_result(
        &mut self,
        key: K,
        make: impl FnOnce() -> V,
    ) -> Result<&mut V, TrackError> {
        let deadline = self.deadline();

        if let Some(handle) = self.index.lookup(&key) {
            let entry = self.pool.get_mut(handle).ok_or(TrackError::NotFound)?;
            entry.timer = Some(self.timers.rearm(entry.timer, handle, deadline));
            self.counters.record_lookup(true);
            return Ok(&mut entry.value);
        }

        let owner = self.id;
        let handle = self
            .pool
            .checkout_with(|| Entry {
                key: key.clone(),
                value: make(),
                timer: None,
                owner,
            })
            .map_err(|err| {
                self.counters.record_exhausted();
                log::trace!("Aging map '{}' emplace refused: {}", self.name, err);
                TrackError::from(err)
            })?;

        if let Err(reason) = self.index.insert(key, handle) {
            self.pool.checkin(handle);
            self.counters.record_rejected();
            log::warn!(
                "Aging map '{}' index '{}' rejected insert: {}",
                self.name,
                self.index.name(),
                reason
            );
            return Err(TrackError::IndexRejected {
                index: self.index.name().to_string(),
                reason,
            });
        }

        let entry = self.pool.get_mut(handle).ok_or(TrackError::NotFound)?;
        entry.timer = Some(self.timers.arm(handle, deadline));
        self.counters.record_inserted();
        Ok(&mut entry.value)
    }

    /// Find a value, pushing its deadline out when `extend_ttl` is set
    pub fn lookup(&mut self, key: &K, extend_ttl: bool) -> Option<&V> {
        self.lookup_mut(key, extend_ttl).map(|value| &*value)
    }

    /// Find a value for update, pushing its deadline out when `extend_ttl` is set
    pub fn lookup_mut(&mut self, key: &K, extend_ttl: bool) -> Option<&mut V> {
        let handle = self.index.lookup(key);
        self.counters.record_lookup(handle.is_some());
        let handle = handle?;

        let deadline = self.deadline();
        let entry = self.pool.get_mut(handle)?;
        if extend_ttl {
            entry.timer = Some(self.timers.rearm(entry.timer, handle, deadline));
        }
        Some(&mut entry.value)
    }

    /// Find a value without touching its deadline
    pub fn get(&self, key: &K) -> Option<&V> {
        let handle = self.index.lookup(key);
        self.counters.record_lookup(handle.is_some());
        self.pool.get(handle?).map(|entry| &entry.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.lookup(key).is_some()
    }

    /// Ticks left before `key` expires
    ///
    /// `None` for an absent key or for an entry kept past its deadline (it has no timer).
    pub fn remaining_ttl(&self, key: &K) -> Option<u64> {
        let entry = self.pool.get(self.index.lookup(key)?)?;
        let timer = entry.timer?;
        Some(timer.deadline().saturating_sub(self.clock.now()))
    }

    /// Remove an entry; false if the key is absent
    pub fn erase(&mut self, key: &K) -> bool {
        let Some(handle) = self.index.remove(key) else {
            return false;
        };
        match self.pool.checkin(handle) {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    self.timers.cancel(timer);
                }
                self.counters.record_erased();
                true
            }
            None => {
                debug_assert!(false, "index held a stale handle");
                false
            }
        }
    }

    /// Remove every entry, returning how many were live
    pub fn clear(&mut self) -> usize {
        self.timers.clear();
        let released = self.pool.reset();
        self.index.reset();
        log::debug!("Aging map '{}' cleared {} entries", self.name, released);
        released
    }

    /// Process every deadline that has elapsed
    ///
    /// Each fired entry goes to the expiry callback (if any); it is evicted unless the
    /// callback answers `Keep`. A kept entry loses its timer and stays until erased or
    /// re-armed by a TTL-extending access.
    pub fn manage_timers(&mut self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        for (timer, handle) in self.timers.expire(now) {
            let Some(entry) = self.pool.get_mut(handle) else {
                log::trace!("Aging map '{}' timer fired for a released entry", self.name);
                continue;
            };
            if entry.timer != Some(timer) || entry.owner != self.id {
                continue;
            }

            report.expired += 1;
            entry.timer = None;
            let decision = match self.on_expire.as_mut() {
                Some(on_expire) => on_expire(&entry.key, &mut entry.value),
                None => ExpiryDecision::Evict,
            };

            match decision {
                ExpiryDecision::Evict => {
                    self.index.remove(&entry.key);
                    self.pool.checkin(handle);
                    report.evicted += 1;
                }
                ExpiryDecision::Keep => report.kept += 1,
            }
        }

        if !report.is_empty() {
            log::trace!(
                "Aging map '{}' sweep at {}: {} expired, {} evicted, {} kept",
                self.name,
                now,
                report.expired,
                report.evicted,
                report.kept
            );
        }
        self.counters.record_sweep(&report);
        report
    }

    /// Keys of every live entry
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.pool.iter().map(|(_, entry)| &entry.key)
    }

    /// Number of live entries
    pub fn size(&self) -> usize {
        self.pool.in_use()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn ttl_ticks(&self) -> u64 {
        self.ttl_ticks
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn stats(&self) -> AgingStats {
        AgingStats::collect(
            self.name,
            self.size(),
            self.ttl_ticks,
            self.timers.pending(),
            &self.counters,
            self.pool.stats(),
        )
    }
}

impl<K, V, C, I, T> fmt::Debug for AgingMap<K, V, C, I, T>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgingMap")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("ttl_ticks", &self.ttl_ticks)
            .field("len", &self.pool.in_use())
            .field("capacity", &self.pool.capacity())
            .field("on_expire", &self.on_expire.is_some())
            .finish()
    }
}
