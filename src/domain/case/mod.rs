//! Case module - The amendment workflow aggregate and its value objects.

mod aggregate;
mod change;
mod negotiation;
mod party;
mod response;

pub use aggregate::{ArtifactRef, Case, CaseDefinition, RoundChanges};
pub use change::{ChangeDelta, ChangeItem, ChangeSet};
pub use negotiation::NegotiationAttempt;
pub use party::Party;
pub use response::{Decision, PartyResponse, ResponseOrigin};
