//! Configuration for flow tracking components

pub mod types;

pub use types::{
    AgingMapConfig, ComponentName, FlowTableConfig, IndexConcurrency, SessionTableConfig, Ttl,
    component_name,
};
