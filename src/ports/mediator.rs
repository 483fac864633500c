//! Mediator port - Interface to the external mediation capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::case::{ChangeDelta, PartyResponse};
use crate::domain::conflict::Conflict;

use super::{CapabilityError, CaseContext};

/// Mediation request: the conflict plus the conflicting parties' full
/// responses (decisions and rationales).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediationRequest {
    /// Shared case context for the round.
    pub context: CaseContext,
    /// The disagreement to mediate.
    pub conflict: Conflict,
    /// All responses from the conflicted round, rationales included.
    pub responses: Vec<PartyResponse>,
}

/// Port for compromise generation.
///
/// Given a conflict, produces a change-set delta intended to move the
/// parties toward consensus. Same transient-failure contract as the
/// Decision Provider; persistent failure is fatal to the case.
#[async_trait]
pub trait Mediator: Send + Sync {
    /// Proposes a compromise for the given conflict.
    async fn propose(&self, request: MediationRequest) -> Result<ChangeDelta, CapabilityError>;
}
