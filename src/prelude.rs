//! Flowtrack prelude - convenient imports for users

// Tracking components
pub use crate::aging::{AgingMap, AgingMapBuilder, AgingStats, ExpiryDecision, SweepReport};
pub use crate::flow::{DescriptorHandle, FiveTuple, FlowTable, FlowTableStats, MatchedRule};
pub use crate::session::SessionTable;

// Configuration
pub use crate::config::{
    AgingMapConfig, FlowTableConfig, IndexConcurrency, SessionTableConfig, Ttl,
};

// Errors
pub use crate::error::{RecoveryHint, TrackError};

// Time
pub use crate::clock::{ManualClock, MonotonicClock, TickSource};
