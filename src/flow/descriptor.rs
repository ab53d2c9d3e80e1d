//! Per-flow payload held by the flow table

use arrayvec::ArrayVec;

use crate::pool::{SlotHandle, SlotIndex};

/// Maximum matched-rule slots per flow
pub const MAX_MATCHED_RULES: usize = 16;

/// Score recorded for the rule that created a flow
pub const INITIAL_MATCH_SCORE: u16 = 100;

/// A classification rule matched by a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchedRule {
    pub rule_id: u16,
    pub score: u16,
}

impl MatchedRule {
    pub const fn new(rule_id: u16, score: u16) -> Self {
        Self { rule_id, score }
    }
}

/// Persistent state of one tracked flow
///
/// The first matched-rule slot is filled when the flow is created; the rest belong to
/// the classification layer.
#[derive(Debug, Clone)]
pub struct TrackDescriptor {
    last_seen: u64,
    matched_rules: ArrayVec<MatchedRule, MAX_MATCHED_RULES>,
    /// Owning bucket, set once the bucket is checked out
    bucket: Option<SlotIndex>,
}

impl TrackDescriptor {
    pub(crate) fn new(rule_id: u16, now: u64) -> Self {
        let mut matched_rules = ArrayVec::new();
        matched_rules.push(MatchedRule::new(rule_id, INITIAL_MATCH_SCORE));
        Self {
            last_seen: now,
            matched_rules,
            bucket: None,
        }
    }

    /// Tick at which the flow was created or last touched
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    pub fn touch(&mut self, now: u64) {
        self.last_seen = self.last_seen.max(now);
    }

    pub fn matched_rules(&self) -> &[MatchedRule] {
        &self.matched_rules
    }

    /// The rule that created the flow
    pub fn first_match(&self) -> Option<MatchedRule> {
        self.matched_rules.first().copied()
    }

    /// Record another matched rule; hands it back when all slots are used
    pub fn try_push_match(&mut self, rule: MatchedRule) -> Result<(), MatchedRule> {
        self.matched_rules
            .try_push(rule)
            .map_err(|err| err.element())
    }

    pub(crate) fn bucket(&self) -> Option<SlotIndex> {
        self.bucket
    }

    pub(crate) fn attach(&mut self, bucket: SlotIndex) {
        self.bucket = Some(bucket);
    }
}

/// Handle to a flow's descriptor returned by lookup and insert
///
/// Generation-checked: after the flow is deleted the handle stops resolving, even if its
/// slot is reused by a new flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHandle(pub(crate) SlotHandle);

impl DescriptorHandle {
    pub fn slot(self) -> SlotHandle {
        self.0
    }
}
