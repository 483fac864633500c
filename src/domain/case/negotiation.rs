//! Negotiation attempt records.

use serde::{Deserialize, Serialize};

use crate::domain::conflict::Conflict;
use crate::domain::foundation::Timestamp;

use super::ChangeDelta;

/// One mediation cycle: the conflict that triggered it and the compromise
/// the mediation capability produced. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationAttempt {
    round: u32,
    conflict: Conflict,
    proposal: ChangeDelta,
    created_at: Timestamp,
}

impl NegotiationAttempt {
    /// Records a mediation cycle for the given round.
    pub fn new(round: u32, conflict: Conflict, proposal: ChangeDelta) -> Self {
        Self {
            round,
            conflict,
            proposal,
            created_at: Timestamp::now(),
        }
    }

    /// Returns the round whose conflict triggered this attempt.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Returns the input conflict.
    pub fn conflict(&self) -> &Conflict {
        &self.conflict
    }

    /// Returns the compromise proposal.
    pub fn proposal(&self) -> &ChangeDelta {
        &self.proposal
    }

    /// Returns when the attempt was recorded.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
