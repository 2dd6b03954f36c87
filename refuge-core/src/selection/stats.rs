//! Counters exposed for observability.

use crate::replenish::PassSummary;
use crate::validation::DynamicRejection;

/// Running totals kept by a [`SpawnSelector`](super::SpawnSelector).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Calls to `request_position`.
    pub requests: u64,
    /// Requests that returned a position.
    pub served: u64,
    /// Requests that found the cache empty before spending their attempts.
    pub empty_cache: u64,
    /// Requests that spent every attempt.
    pub attempts_exhausted: u64,
    /// Candidates evicted after failing dynamic validation.
    pub evictions: u64,
    /// Evictions caused by water.
    pub rejected_submerged: u64,
    /// Evictions caused by blocking colliders.
    pub rejected_collider: u64,
    /// Evictions caused by awake actors.
    pub rejected_actor: u64,
    /// Evictions caused by structures.
    pub rejected_structure: u64,
    /// Evictions caused by failed world queries.
    pub rejected_oracle_failure: u64,
    /// Replenishment passes started.
    pub passes_started: u64,
    /// Replenishment passes that ran to completion.
    pub passes_completed: u64,
    /// Replenishment passes that were cancelled.
    pub passes_cancelled: u64,
    /// Candidates inserted by finished or cancelled passes.
    pub candidates_inserted: u64,
}

impl SelectionStats {
    pub(crate) const fn record_rejection(&mut self, reason: Option<DynamicRejection>) {
        self.evictions += 1;
        match reason {
            Some(DynamicRejection::Submerged) => self.rejected_submerged += 1,
            Some(DynamicRejection::BlockedBy(_)) => self.rejected_collider += 1,
            Some(DynamicRejection::ActorNearby) => self.rejected_actor += 1,
            Some(DynamicRejection::StructureNearby) => self.rejected_structure += 1,
            None => self.rejected_oracle_failure += 1,
        }
    }

    pub(crate) const fn record_pass(&mut self, summary: &PassSummary, completed: bool) {
        if completed {
            self.passes_completed += 1;
        } else {
            self.passes_cancelled += 1;
        }
        self.candidates_inserted += summary.inserted as u64;
    }
}
