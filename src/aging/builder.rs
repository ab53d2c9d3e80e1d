//! Fluent construction of aging maps

use std::hash::Hash;

use super::map::AgingMap;
use super::{ExpiryCallback, ExpiryDecision};
use crate::clock::TickSource;
use crate::config::{AgingMapConfig, IndexConcurrency, Ttl, component_name};
use crate::error::TrackError;

/// Builder for `AgingMap`
pub struct AgingMapBuilder<K, V> {
    config: AgingMapConfig,
    on_expire: Option<ExpiryCallback<K, V>>,
}

impl<K, V> AgingMapBuilder<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Start from the default configuration under `base_name`
    pub fn new(base_name: &str) -> Self {
        Self::from_config(AgingMapConfig::new(base_name))
    }

    pub fn from_config(config: AgingMapConfig) -> Self {
        Self {
            config,
            on_expire: None,
        }
    }

    /// Set the diagnostic base name
    pub fn base_name(mut self, base_name: &str) -> Self {
        self.config.base_name = component_name(base_name);
        self
    }

    /// TTL in seconds, converted with the clock frequency at build time
    pub fn ttl_secs(mut self, secs: u64) -> Self {
        self.config.ttl = Ttl::Seconds(secs);
        self
    }

    /// TTL in raw clock ticks
    pub fn ttl_ticks(mut self, ticks: u64) -> Self {
        self.config.ttl = Ttl::Ticks(ticks);
        self
    }

    /// Maximum number of live entries
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn index_concurrency(mut self, concurrency: IndexConcurrency) -> Self {
        self.config.index_concurrency = concurrency;
        self
    }

    /// Callback deciding the fate of each expired entry
    pub fn on_expire(
        mut self,
        on_expire: impl FnMut(&K, &mut V) -> ExpiryDecision + Send + Sync + 'static,
    ) -> Self {
        self.on_expire = Some(Box::new(on_expire));
        self
    }

    pub fn config(&self) -> &AgingMapConfig {
        &self.config
    }

    /// Allocate the pool and index and return the map
    pub fn build<C: TickSource>(self, clock: C) -> Result<AgingMap<K, V, C>, TrackError> {
        let mut map = AgingMap::new(self.config, clock)?;
        map.set_expiry(self.on_expire);
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_builder_applies_settings() {
        let clock = ManualClock::new(10);
        let map: AgingMap<u64, u64, _> = AgingMapBuilder::new("nat")
            .ttl_secs(2)
            .capacity(16)
            .index_concurrency(IndexConcurrency::SingleWriter)
            .build(clock)
            .unwrap();

        assert_eq!(map.name(), "nat");
        assert_eq!(map.ttl_ticks(), 20);
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.stats().pool.name.as_str(), "nat_mp");
    }

    #[test]
    fn test_builder_installs_callback() {
        let clock = ManualClock::default();
        let mut map = AgingMapBuilder::new("keep_all")
            .ttl_ticks(1)
            .capacity(4)
            .on_expire(|_key: &u32, _value: &mut u32| ExpiryDecision::Keep)
            .build(clock.clone())
            .unwrap();

        map.try_emplace(1, || 1);
        clock.advance(1);
        assert_eq!(map.manage_timers().kept, 1);
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let result = AgingMapBuilder::<u32, u32>::new("empty")
            .capacity(0)
            .build(ManualClock::default());
        assert!(matches!(result, Err(TrackError::InitializationFailure(_))));
    }
}
