//! Ports - Interfaces the orchestration core consumes and exposes.
//!
//! Each external collaborator (Decision Provider, mediation, review, merge,
//! case storage, event distribution) is a trait here; adapters implement
//! them, the application layer depends only on the traits.

mod capability;
mod case_registry;
mod decision_provider;
mod event_sink;
mod mediator;
mod merger;
mod reviewer;

pub use capability::CapabilityError;
pub use case_registry::{CaseFilter, CaseRegistry, RegistryError};
pub use decision_provider::{CaseContext, DecisionProvider, EvaluationRequest, PartyEvaluation};
pub use event_sink::{EventSink, SinkError};
pub use mediator::{MediationRequest, Mediator};
pub use merger::Merger;
pub use reviewer::{ReviewVerdict, Reviewer};
