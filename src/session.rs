//! Session table: bidirectional flows with idle expiry
//!
//! An `AgingMap` keyed by the canonical five-tuple, so both directions of a connection
//! reach the same session state.

use crate::aging::{AgingMap, AgingStats, ExpiryDecision, SweepReport};
use crate::clock::{MonotonicClock, TickSource};
use crate::config::SessionTableConfig;
use crate::error::TrackError;
use crate::flow::FiveTuple;

/// Per-session state `S` for every tracked connection
#[derive(Debug)]
pub struct SessionTable<S, C: TickSource = MonotonicClock> {
    sessions: AgingMap<FiveTuple, S, C>,
}

impl<S> SessionTable<S, MonotonicClock> {
    pub fn new(config: SessionTableConfig) -> Result<Self, TrackError> {
        Self::with_clock(config, MonotonicClock)
    }
}

impl<S, C: TickSource> SessionTable<S, C> {
    pub fn with_clock(config: SessionTableConfig, clock: C) -> Result<Self, TrackError> {
        Ok(Self {
            sessions: AgingMap::new(config.map, clock)?,
        })
    }

    /// Run `on_expire` for each idle session before deciding its fate
    pub fn with_expiry(
        self,
        on_expire: impl FnMut(&FiveTuple, &mut S) -> ExpiryDecision + Send + Sync + 'static,
    ) -> Self {
        Self {
            sessions: self.sessions.with_expiry(on_expire),
        }
    }

    /// Get-or-create the session for a packet in either direction
    ///
    /// Every call counts as activity and restarts the idle timer.
    pub fn track(&mut self, tuple: &FiveTuple, make: impl FnOnce() -> S) -> Option<&mut S> {
        self.sessions.try_emplace(tuple.canonical(), make)
    }

    /// Like `track`, reporting why a new session could not be created
    pub fn try_track(
        &mut self,
        tuple: &FiveTuple,
        make: impl FnOnce() -> S,
    ) -> Result<&mut S, TrackError> {
        self.sessions.try_emplace_with_result(tuple.canonical(), make)
    }

    /// Session state without counting as activity
    pub fn get(&self, tuple: &FiveTuple) -> Option<&S> {
        self.sessions.get(&tuple.canonical())
    }

    pub fn get_mut(&mut self, tuple: &FiveTuple) -> Option<&mut S> {
        self.sessions.lookup_mut(&tuple.canonical(), false)
    }

    /// Close a session; false if none was tracked
    pub fn end(&mut self, tuple: &FiveTuple) -> bool {
        self.sessions.erase(&tuple.canonical())
    }

    /// Evict idle sessions
    pub fn expire(&mut self) -> SweepReport {
        self.sessions.manage_timers()
    }

    /// Canonical tuples of every live session
    pub fn tuples(&self) -> impl Iterator<Item = &FiveTuple> + '_ {
        self.sessions.keys()
    }

    pub fn clear(&mut self) -> usize {
        self.sessions.clear()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.sessions.capacity()
    }

    pub fn stats(&self) -> AgingStats {
        self.sessions.stats()
    }
}
