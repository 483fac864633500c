//! Decision Provider port - Interface to a party's decision source.
//!
//! A Decision Provider is any system, human workflow, or model that, given
//! a case's proposed changes and a party's policy, produces a decision with
//! a rationale. The engine treats it as a black box: it never constrains
//! how the decision is computed, only this contract.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct AlwaysApprove;
//!
//! #[async_trait]
//! impl DecisionProvider for AlwaysApprove {
//!     async fn evaluate(
//!         &self,
//!         _request: EvaluationRequest,
//!     ) -> Result<PartyEvaluation, CapabilityError> {
//!         Ok(PartyEvaluation::approved(serde_json::json!({"reason": "fine"})))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::case::{Case, ChangeSet, Decision, Party};
use crate::domain::foundation::{CaseId, ContractRef, PartyId};

use super::CapabilityError;

/// Case context shared by every capability call in a round.
///
/// Every party receives an identical context for a given round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseContext {
    /// Case identifier.
    pub case_id: CaseId,
    /// Subject document under amendment.
    pub contract: ContractRef,
    /// Current evaluation round.
    pub round: u32,
    /// Changes as proposed for this round.
    pub proposed_changes: ChangeSet,
}

impl CaseContext {
    /// Builds the context for a case's current round.
    pub fn from_case(case: &Case) -> Self {
        Self {
            case_id: case.id(),
            contract: case.contract().clone(),
            round: case.round(),
            proposed_changes: case.proposed_changes().clone(),
        }
    }
}

/// Evaluation request for one party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Shared case context for the round.
    pub context: CaseContext,
    /// Party being asked to evaluate.
    pub party_id: PartyId,
    /// Capability reference routing to the party's provider.
    pub capability: String,
    /// Opaque party policy, interpreted by the provider.
    pub policy: JsonValue,
}

impl EvaluationRequest {
    /// Builds the request for one party in a round.
    pub fn new(context: CaseContext, party: &Party) -> Self {
        Self {
            context,
            party_id: party.id().clone(),
            capability: party.capability().to_string(),
            policy: party.policy().clone(),
        }
    }
}

/// A provider's evaluation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyEvaluation {
    /// The decision.
    pub decision: Decision,
    /// Marks a rejection as terminal (ignored on other decisions).
    #[serde(default)]
    pub non_negotiable: bool,
    /// Opaque structured rationale.
    pub rationale: JsonValue,
}

impl PartyEvaluation {
    /// Creates an approval.
    pub fn approved(rationale: JsonValue) -> Self {
        Self {
            decision: Decision::Approved,
            non_negotiable: false,
            rationale,
        }
    }

    /// Creates a rejection.
    pub fn rejected(rationale: JsonValue) -> Self {
        Self {
            decision: Decision::Rejected,
            non_negotiable: false,
            rationale,
        }
    }

    /// Creates a change request.
    pub fn requested_changes(rationale: JsonValue) -> Self {
        Self {
            decision: Decision::RequestedChanges,
            non_negotiable: false,
            rationale,
        }
    }

    /// Marks the evaluation as non-negotiable.
    pub fn with_non_negotiable(mut self) -> Self {
        self.non_negotiable = true;
        self
    }
}

/// Port for party decision computation.
///
/// Implementations may fail transiently (retried by the fan-out
/// coordinator's bounded policy) or be unreachable past the retry budget
/// (converted to the round-timeout outcome, never a missing response).
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Evaluates the proposed changes for one party.
    async fn evaluate(&self, request: EvaluationRequest)
        -> Result<PartyEvaluation, CapabilityError>;
}
