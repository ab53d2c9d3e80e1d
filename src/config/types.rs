//! Configuration types for the flow table, aging map and session table
//!
//! Everything is plain data with serde support and production defaults. Each config
//! validates itself before a component is built so that a bad value surfaces as an
//! initialization failure instead of a panic deep inside construction.

use arrayvec::ArrayString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TrackError;

/// Bounded diagnostic name for pools and indexes
pub type ComponentName = ArrayString<48>;

/// Build a component name, truncating at a char boundary when too long
pub fn component_name(name: &str) -> ComponentName {
    let mut out = ComponentName::new();
    for c in name.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}

/// Custom ArrayString serialization module
mod component_name_serde {
    use super::*;

    pub fn serialize<S>(value: &ComponentName, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.as_str().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ComponentName, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ComponentName::from(&s).map_err(serde::de::Error::custom)
    }
}

fn invalid_field(field: &str, value: impl std::fmt::Display, reason: &str) -> TrackError {
    TrackError::InitializationFailure(format!(
        "invalid {} = {}: {}",
        field, value, reason
    ))
}

/// Longest suffix a flow table appends to its name (`_descriptors`)
const FLOW_TABLE_SUFFIX_LEN: usize = "_descriptors".len();

/// Longest suffix an aging map appends to its base name (`_mp` / `_ht`)
const AGING_MAP_SUFFIX_LEN: usize = "_mp".len();

/// Reject base names whose derived component names would be truncated
fn check_base_name(
    field: &str,
    name: &ComponentName,
    suffix_len: usize,
) -> Result<(), TrackError> {
    let limit = name.capacity() - suffix_len;
    if name.is_empty() {
        return Err(invalid_field(field, "\"\"", "must not be empty"));
    }
    if name.len() > limit {
        return Err(invalid_field(
            field,
            name,
            &format!("must be at most {} bytes", limit),
        ));
    }
    Ok(())
}

/// Directory width used by the dataplane (16M chain heads)
pub const DEFAULT_DIRECTORY_BITS: u8 = 24;

/// Widest directory the 32-bit hash can address while keeping an 8-bit discriminator
pub const MAX_DIRECTORY_BITS: u8 = 24;

/// Flow table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTableConfig {
    /// Diagnostic base name (pools become `<name>_buckets` / `<name>_descriptors`)
    #[serde(with = "component_name_serde")]
    pub name: ComponentName,
    /// Number of hash bits addressing the directory (top bits of the flow hash)
    pub directory_bits: u8,
    /// Bucket pool capacity
    pub bucket_capacity: u32,
    /// Descriptor pool capacity
    pub descriptor_capacity: u32,
}

impl Default for FlowTableConfig {
    fn default() -> Self {
        Self {
            name: component_name("flow_table"),
            directory_bits: DEFAULT_DIRECTORY_BITS,
            bucket_capacity: (1 << 20) - 1,
            descriptor_capacity: (1 << 20) - 1,
        }
    }
}

impl FlowTableConfig {
    /// Config with both pool capacities set to `capacity`
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            bucket_capacity: capacity,
            descriptor_capacity: capacity,
            ..Self::default()
        }
    }

    /// Number of directory slots
    pub fn directory_len(&self) -> usize {
        1usize << self.directory_bits
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        check_base_name("name", &self.name, FLOW_TABLE_SUFFIX_LEN)?;
        if !(1..=MAX_DIRECTORY_BITS).contains(&self.directory_bits) {
            return Err(invalid_field(
                "directory_bits",
                self.directory_bits,
                "must be between 1 and 24",
            ));
        }
        if self.bucket_capacity == 0 {
            return Err(invalid_field("bucket_capacity", 0, "must be non-zero"));
        }
        if self.descriptor_capacity == 0 {
            return Err(invalid_field("descriptor_capacity", 0, "must be non-zero"));
        }
        Ok(())
    }
}

/// Concurrency mode of an aging map's keyed index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexConcurrency {
    /// Sharded map, lookups may run from many threads
    #[serde(rename = "rw_concurrent")]
    ReadWriteConcurrent,
    /// Plain map owned by a single writer
    #[serde(rename = "single_writer")]
    SingleWriter,
}

/// TTL of an aging map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ttl {
    /// Whole seconds, converted with the clock frequency
    #[serde(rename = "secs")]
    Seconds(u64),
    /// Raw clock ticks
    #[serde(rename = "ticks")]
    Ticks(u64),
}

impl Ttl {
    /// Resolve to clock ticks
    pub fn to_ticks(self, ticks_per_second: u64) -> u64 {
        match self {
            Ttl::Seconds(secs) => secs.saturating_mul(ticks_per_second),
            Ttl::Ticks(ticks) => ticks,
        }
    }
}

/// Aging map configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingMapConfig {
    /// Diagnostic base name (pool `<base>_mp`, index `<base>_ht`)
    #[serde(with = "component_name_serde")]
    pub base_name: ComponentName,
    pub ttl: Ttl,
    /// Maximum number of live entries
    pub capacity: u32,
    pub index_concurrency: IndexConcurrency,
}

impl Default for AgingMapConfig {
    fn default() -> Self {
        Self {
            base_name: component_name("aging"),
            ttl: Ttl::Seconds(3),
            capacity: (1 << 16) - 1,
            index_concurrency: IndexConcurrency::ReadWriteConcurrent,
        }
    }
}

impl AgingMapConfig {
    pub fn new(base_name: &str) -> Self {
        Self {
            base_name: component_name(base_name),
            ..Self::default()
        }
    }

    /// Slab pool name
    pub fn pool_name(&self) -> String {
        format!("{}_mp", self.base_name)
    }

    /// Keyed index name
    pub fn index_name(&self) -> String {
        format!("{}_ht", self.base_name)
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        check_base_name("base_name", &self.base_name, AGING_MAP_SUFFIX_LEN)?;
        if self.capacity == 0 {
            return Err(invalid_field("capacity", 0, "must be non-zero"));
        }
        match self.ttl {
            Ttl::Seconds(0) | Ttl::Ticks(0) => {
                Err(invalid_field("ttl", 0, "must be at least one tick"))
            }
            _ => Ok(()),
        }
    }
}

/// Session table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTableConfig {
    #[serde(flatten)]
    pub map: AgingMapConfig,
}

impl Default for SessionTableConfig {
    fn default() -> Self {
        Self {
            map: AgingMapConfig {
                base_name: component_name("sessions"),
                capacity: (1 << 22) - 1,
                ..AgingMapConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FlowTableConfig::default().validate().is_ok());
        assert!(AgingMapConfig::default().validate().is_ok());
        assert!(SessionTableConfig::default().map.validate().is_ok());
        assert_eq!(FlowTableConfig::default().directory_len(), 1 << 24);
    }

    #[test]
    fn test_directory_bits_bounds() {
        let mut config = FlowTableConfig::default();
        config.directory_bits = 0;
        assert!(config.validate().is_err());
        config.directory_bits = 25;
        assert!(config.validate().is_err());
        config.directory_bits = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_names_keep_their_suffixes() {
        let longest = "a".repeat(45);
        let config = AgingMapConfig::new(&longest);
        assert!(config.validate().is_ok());
        assert_ne!(config.pool_name(), config.index_name());
        assert!(config.pool_name().ends_with("_mp"));

        assert!(AgingMapConfig::new(&"a".repeat(46)).validate().is_err());
        // Truncated on construction, still rejected
        assert!(AgingMapConfig::new(&"a".repeat(80)).validate().is_err());
        assert!(AgingMapConfig::new("").validate().is_err());

        let mut flows = FlowTableConfig::default();
        flows.name = component_name(&"f".repeat(36));
        assert!(flows.validate().is_ok());
        flows.name = component_name(&"f".repeat(37));
        assert!(matches!(
            flows.validate(),
            Err(TrackError::InitializationFailure(_))
        ));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = AgingMapConfig::new("ttl");
        config.ttl = Ttl::Ticks(0);
        assert!(matches!(
            config.validate(),
            Err(TrackError::InitializationFailure(_))
        ));
    }

    #[test]
    fn test_names_derive_from_base() {
        let config = AgingMapConfig::new("nat");
        assert_eq!(config.pool_name(), "nat_mp");
        assert_eq!(config.index_name(), "nat_ht");
    }

    #[test]
    fn test_component_name_truncates() {
        let long = "x".repeat(100);
        assert_eq!(component_name(&long).len(), 48);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AgingMapConfig =
            serde_json::from_str(r#"{"base_name":"conntrack","ttl":{"ticks":5}}"#).unwrap();
        assert_eq!(config.base_name.as_str(), "conntrack");
        assert_eq!(config.ttl, Ttl::Ticks(5));
        assert_eq!(config.capacity, AgingMapConfig::default().capacity);
        assert_eq!(config.index_concurrency, IndexConcurrency::ReadWriteConcurrent);
    }
}
