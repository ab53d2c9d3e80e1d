//! One-shot deadline timers with a cooperative sweep
//!
//! A `TimerService` holds at most the deadlines its owner arms. Nothing fires on its own:
//! the owner calls `expire(now)` from its periodic sweep and acts on the returned tokens.

pub mod deadline_queue;

pub use deadline_queue::DeadlineQueue;

/// Identity of an armed deadline
///
/// Ordered by deadline first, so sorting handles gives firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    deadline: u64,
    sequence: u64,
}

impl TimerHandle {
    pub(crate) fn new(deadline: u64, sequence: u64) -> Self {
        Self { deadline, sequence }
    }

    /// Tick at which this timer fires
    pub fn deadline(self) -> u64 {
        self.deadline
    }

    pub(crate) fn key(self) -> (u64, u64) {
        (self.deadline, self.sequence)
    }
}

/// Schedules one-shot deadlines carrying a token
pub trait TimerService<T> {
    /// Arm a deadline; the token is handed back when it fires
    fn arm(&mut self, token: T, deadline: u64) -> TimerHandle;

    /// Cancel an armed deadline; false if it already fired or was cancelled
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Move a deadline: cancel `handle` (if still armed) and arm a new one
    fn rearm(&mut self, handle: Option<TimerHandle>, token: T, deadline: u64) -> TimerHandle {
        if let Some(handle) = handle {
            self.cancel(handle);
        }
        self.arm(token, deadline)
    }

    /// Remove and return every timer with `deadline <= now`, in firing order
    fn expire(&mut self, now: u64) -> Vec<(TimerHandle, T)>;

    /// Number of armed timers
    fn pending(&self) -> usize;

    /// Earliest armed deadline
    fn next_deadline(&self) -> Option<u64>;

    /// Drop every armed timer
    fn clear(&mut self);
}
