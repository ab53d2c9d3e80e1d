//! Error taxonomy for flow tracking operations
//!
//! Hot-path operations signal failure through return values. These types carry the
//! failure kind for callers that want more than a bool, together with a recovery hint
//! so the dataplane can decide between dropping, backing off, or aborting.

use std::fmt;

use crate::index::IndexError;
use crate::pool::PoolError;

/// Recovery hint for flow tracking errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Drop the packet or request and signal upstream backpressure
    Backpressure,
    /// Retry later, the condition may clear on its own
    Retry,
    /// Nothing to recover, the target was simply absent
    Ignore,
    /// The component cannot operate
    Fatal,
}

/// Flow tracking error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// A slab pool has no free slot
    AllocationExhausted { pool: String },
    /// The keyed index refused an insert (duplicate race or table full)
    IndexRejected { index: String, reason: IndexError },
    /// Lookup, erase or delete targeted an absent key or descriptor
    NotFound,
    /// Pool, index or timer creation failed at construction
    InitializationFailure(String),
}

impl TrackError {
    /// Build an initialization failure from anything printable
    pub fn init(reason: impl fmt::Display) -> Self {
        TrackError::InitializationFailure(reason.to_string())
    }

    /// Suggested recovery strategy for this error
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            TrackError::AllocationExhausted { .. } => RecoveryHint::Backpressure,
            TrackError::IndexRejected {
                reason: IndexError::Duplicate,
                ..
            } => RecoveryHint::Retry,
            TrackError::IndexRejected { .. } => RecoveryHint::Backpressure,
            TrackError::NotFound => RecoveryHint::Ignore,
            TrackError::InitializationFailure(_) => RecoveryHint::Fatal,
        }
    }

    /// Check if this error might be resolved by retrying the operation later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.recovery_hint(),
            RecoveryHint::Retry | RecoveryHint::Backpressure
        )
    }
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::AllocationExhausted { pool } => {
                write!(f, "Allocation exhausted: pool '{}' has no free slot", pool)
            }
            TrackError::IndexRejected { index, reason } => {
                write!(f, "Index '{}' rejected insert: {}", index, reason)
            }
            TrackError::NotFound => write!(f, "Not found"),
            TrackError::InitializationFailure(msg) => {
                write!(f, "Initialization failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for TrackError {}

impl From<PoolError> for TrackError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted { pool } => TrackError::AllocationExhausted {
                pool: pool.to_string(),
            },
        }
    }
}
