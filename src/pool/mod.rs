//! Fixed-capacity slab allocation for flow and aging records
//!
//! Every record in the crate lives in a `SlabPool`. Pools are sized once, never grow,
//! and hand out generational handles so that links between records are plain indices.

pub mod slab;
pub mod statistics;
pub mod types;

pub use slab::{PoolError, SlabPool};
pub use statistics::PoolStats;
pub use types::{Generation, SlotHandle, SlotIndex};
