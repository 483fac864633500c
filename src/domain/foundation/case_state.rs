//! Case lifecycle state machine.
//!
//! Every state transition in the workflow goes through
//! [`CaseState::can_transition`]; the engine never mutates state by any
//! other path. Terminal states accept no further transitions.
//!
//! ```text
//! initiated → evaluating → (conflict_detected → mediating → evaluating)*
//!           → reviewing? → finalizing → completed
//! ```
//!
//! `failed` and `cancelled` are terminal alternates reachable from any
//! non-terminal state. `paused` is reachable from any non-terminal state
//! and resumes to the state it interrupted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an amendment case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    /// Case created and validated, evaluation not yet started.
    Initiated,
    /// Decision fan-out in progress for the current round.
    Evaluating,
    /// A completed round produced at least one disagreeing pair.
    ConflictDetected,
    /// Mediation capability is producing a compromise.
    Mediating,
    /// Specialized review consulted before finalization.
    Reviewing,
    /// Accepted changes being consolidated into the final artifact.
    Finalizing,
    /// Terminal success; the artifact reference is recorded.
    Completed,
    /// Terminal failure; the case carries a `FailureReason`.
    Failed,
    /// Terminal operator cancellation.
    Cancelled,
    /// Interrupted by an operator; resumes to the interrupted state.
    Paused {
        /// State to re-enter on resume.
        resume_to: Box<CaseState>,
    },
}

impl CaseState {
    /// Returns true for `completed`, `failed`, and `cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaseState::Completed | CaseState::Failed | CaseState::Cancelled
        )
    }

    /// Returns true if the case is paused.
    pub fn is_paused(&self) -> bool {
        matches!(self, CaseState::Paused { .. })
    }

    /// Checks whether a transition from this state to `to` is legal.
    pub fn can_transition(&self, to: &CaseState) -> bool {
        // Cancellation and failure are reachable from any non-terminal state;
        // pause from any non-terminal, non-paused state.
        match to {
            CaseState::Cancelled | CaseState::Failed if !self.is_terminal() => return true,
            CaseState::Paused { resume_to } if !self.is_terminal() && !self.is_paused() => {
                return resume_to.as_ref() == self;
            }
            _ => {}
        }

        match (self, to) {
            (CaseState::Initiated, CaseState::Evaluating) => true,
            (CaseState::Evaluating, CaseState::ConflictDetected) => true,
            (CaseState::Evaluating, CaseState::Reviewing) => true,
            (CaseState::Evaluating, CaseState::Finalizing) => true,
            (CaseState::ConflictDetected, CaseState::Mediating) => true,
            (CaseState::Mediating, CaseState::Evaluating) => true,
            (CaseState::Reviewing, CaseState::Finalizing) => true,
            (CaseState::Finalizing, CaseState::Completed) => true,
            (CaseState::Paused { resume_to }, target) => resume_to.as_ref() == target,
            _ => false,
        }
    }

    /// Short name of the state, used for event summaries and list filters.
    pub fn name(&self) -> &'static str {
        match self {
            CaseState::Initiated => "initiated",
            CaseState::Evaluating => "evaluating",
            CaseState::ConflictDetected => "conflict_detected",
            CaseState::Mediating => "mediating",
            CaseState::Reviewing => "reviewing",
            CaseState::Finalizing => "finalizing",
            CaseState::Completed => "completed",
            CaseState::Failed => "failed",
            CaseState::Cancelled => "cancelled",
            CaseState::Paused { .. } => "paused",
        }
    }
}

impl fmt::Display for CaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
