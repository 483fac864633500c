//! Conflict detector.
//!
//! A pure function over a round's complete response set. Identical inputs
//! always yield identical classifications; nothing here performs IO or
//! consults configuration beyond the tolerance argument.

use serde::{Deserialize, Serialize};

use crate::domain::case::{Decision, PartyResponse};
use crate::domain::foundation::PartyId;

/// One disagreeing party with the decision it issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dissent {
    pub party_id: PartyId,
    pub decision: Decision,
}

/// Disagreement among parties within a single round.
///
/// Derived fresh each round from the response set; never persisted as
/// workflow input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Round the disagreement occurred in.
    pub round: u32,
    /// Parties whose decisions block consensus, in response order.
    pub disagreeing: Vec<Dissent>,
    /// Parties that approved, in response order.
    pub agreeing: Vec<PartyId>,
}

impl Conflict {
    /// Number of disagreeing parties.
    pub fn dissent_count(&self) -> usize {
        self.disagreeing.len()
    }
}

/// Result of assessing a round's responses.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAssessment {
    /// All parties approved, or the requested-changes count is within
    /// tolerance.
    NoConflict,
    /// At least one disagreeing pair.
    Conflict(Conflict),
}

impl ConflictAssessment {
    /// Returns true if no conflict was found.
    pub fn is_consensus(&self) -> bool {
        matches!(self, ConflictAssessment::NoConflict)
    }
}

/// Partitions a round's complete response set into agreement and
/// disagreement.
///
/// Rules:
/// - all `approved` is consensus;
/// - any `rejected` is always a conflict, even a single one against an
///   otherwise unanimous approval (rejection is never auto-overridden);
/// - with no rejections, up to `requested_changes_tolerance` parties
///   requesting changes still counts as consensus; above that the
///   requesting parties are the disagreeing set.
pub fn assess(
    round: u32,
    responses: &[PartyResponse],
    requested_changes_tolerance: u32,
) -> ConflictAssessment {
    let agreeing: Vec<PartyId> = responses
        .iter()
        .filter(|r| r.decision() == Decision::Approved)
        .map(|r| r.party_id().clone())
        .collect();

    let disagreeing: Vec<Dissent> = responses
        .iter()
        .filter(|r| r.decision() != Decision::Approved)
        .map(|r| Dissent {
            party_id: r.party_id().clone(),
            decision: r.decision(),
        })
        .collect();

    let has_rejection = disagreeing
        .iter()
        .any(|d| d.decision == Decision::Rejected);
    let requested_changes = disagreeing
        .iter()
        .filter(|d| d.decision == Decision::RequestedChanges)
        .count();

    if !has_rejection && requested_changes <= requested_changes_tolerance as usize {
        return ConflictAssessment::NoConflict;
    }

    ConflictAssessment::Conflict(Conflict {
        round,
        disagreeing,
        agreeing,
    })
}
