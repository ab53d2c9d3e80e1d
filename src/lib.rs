//! Flowtrack - per-flow state tracking for packet dataplanes
//!
//! Find-or-create persistent flow records from a precomputed packet hash and five-tuple in
//! O(1) expected time, and evict idle entries after a TTL without blocking the hot path.
//!
//! # Features
//!
//! - **Flow table**: hash-addressed directory of collision chains with bidirectional
//!   five-tuple matching and O(1) back-reference deletion
//! - **Aging map**: generic keyed store with pooled entries and per-entry TTL expiry
//!   driven by a cooperative sweep
//! - **Session table**: aging map over canonical five-tuples
//! - **Fixed footprint**: every record lives in a pre-sized slab pool; exhaustion is an
//!   immediate failure, never an allocation
//! - **Generational handles**: stale handles stop resolving instead of aliasing reused slots

// Public API modules
pub mod prelude;

// Building blocks - public so callers can supply their own index or timer service
pub mod clock;
pub mod config;
pub mod error;
pub mod index;
pub mod pool;
pub mod timer;

// Tracking components
pub mod aging;
pub mod flow;
pub mod session;

// Re-export the public API at the crate root for convenience
pub use prelude::*;
