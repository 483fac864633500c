//! Error types for the domain layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CaseState;

/// Errors that reject a case definition before the case exists.
///
/// A definition that fails validation is never created; this is not a
/// workflow failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("A case requires at least one party")]
    NoParties,

    #[error("A case requires at least one proposed change")]
    NoChanges,

    #[error("Duplicate party identifier '{party_id}'")]
    DuplicateParty { party_id: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates a duplicate party validation error.
    pub fn duplicate_party(party_id: impl Into<String>) -> Self {
        ValidationError::DuplicateParty {
            party_id: party_id.into(),
        }
    }
}

/// Rejected state transition; the attempted edge is not in the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal transition from '{from}' to '{to}'")]
pub struct TransitionError {
    pub from: CaseState,
    pub to: CaseState,
}

impl TransitionError {
    /// Creates a transition error for the attempted edge.
    pub fn new(from: CaseState, to: CaseState) -> Self {
        Self { from, to }
    }
}

/// Terminal reason recorded when a case fails.
///
/// Every failed case carries exactly one of these, both on the aggregate
/// and in the failure event, so a stuck or ambiguous terminal state is
/// impossible.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The round counter reached the configured maximum without consensus.
    #[error("negotiation exhausted after {rounds} rounds")]
    NegotiationExhausted { rounds: u32 },

    /// A party issued a terminal rejection marked as non-negotiable.
    #[error("party '{party_id}' issued a non-negotiable rejection")]
    NonNegotiableRejection { party_id: String },

    /// The mediation capability failed past its retry budget.
    #[error("mediation capability unavailable: {detail}")]
    MediationUnavailable { detail: String },

    /// The specialized review capability failed past its retry budget.
    #[error("review capability unavailable: {detail}")]
    ReviewUnavailable { detail: String },

    /// The specialized review returned a rejecting verdict.
    #[error("specialized review rejected the amendment")]
    ReviewRejected,

    /// The merge capability reported a consolidation failure.
    #[error("artifact consolidation failed: {detail}")]
    MergeFailed { detail: String },

    /// The case's optional deadline elapsed before completion.
    #[error("case deadline elapsed before completion")]
    DeadlineExceeded,
}

impl FailureReason {
    /// Creates a mediation-unavailable reason.
    pub fn mediation_unavailable(detail: impl Into<String>) -> Self {
        FailureReason::MediationUnavailable {
            detail: detail.into(),
        }
    }

    /// Creates a review-unavailable reason.
    pub fn review_unavailable(detail: impl Into<String>) -> Self {
        FailureReason::ReviewUnavailable {
            detail: detail.into(),
        }
    }

    /// Creates a merge-failed reason.
    pub fn merge_failed(detail: impl Into<String>) -> Self {
        FailureReason::MergeFailed {
            detail: detail.into(),
        }
    }
}
