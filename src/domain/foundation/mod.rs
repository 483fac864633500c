//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the amendment workflow domain.

mod case_state;
mod errors;
mod events;
mod ids;
mod timestamp;

pub use case_state::CaseState;
pub use errors::{FailureReason, TransitionError, ValidationError};
pub use events::{WorkflowEvent, WorkflowStage};
pub use ids::{CaseId, ContractRef, EventId, PartyId};
pub use timestamp::Timestamp;
