//! Bidirectional five-tuple flow tracking
//!
//! A `FlowTable` owns a hash-addressed directory of collision chains plus two fixed-size
//! pools: chain nodes (`TrackBucket`) and per-flow payloads (`TrackDescriptor`).

pub mod bucket;
pub mod descriptor;
pub mod directory;
pub mod five_tuple;
pub mod statistics;
pub mod table;

pub use bucket::TrackBucket;
pub use descriptor::{
    DescriptorHandle, INITIAL_MATCH_SCORE, MAX_MATCHED_RULES, MatchedRule, TrackDescriptor,
};
pub use five_tuple::FiveTuple;
pub use statistics::{FlowCounters, FlowTableStats};
pub use table::FlowTable;
