//! Party response records.
//!
//! One immutable record per (case, round, party). A provider retry never
//! overwrites a recorded response; the fan-out coordinator records exactly
//! one response per party per round, synthesizing a timeout default for
//! parties whose provider never answered.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::domain::foundation::{PartyId, Timestamp};

/// A party's decision on a round's proposed changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The party accepts the proposed changes as-is.
    Approved,
    /// The party refuses the proposed changes.
    Rejected,
    /// The party wants revisions before accepting.
    RequestedChanges,
}

/// How a response came to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrigin {
    /// Produced by the party's Decision Provider.
    Provider,
    /// Synthesized by the engine after the provider failed or timed out.
    SystemTimeout,
}

/// One party's evaluation of one round. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyResponse {
    party_id: PartyId,
    round: u32,
    decision: Decision,
    /// Marks a rejection as terminal; never set on other decisions.
    non_negotiable: bool,
    /// Opaque structured rationale from the Decision Provider.
    rationale: JsonValue,
    origin: ResponseOrigin,
    recorded_at: Timestamp,
}

impl PartyResponse {
    /// Records a response produced by the party's Decision Provider.
    pub fn from_provider(
        party_id: PartyId,
        round: u32,
        decision: Decision,
        non_negotiable: bool,
        rationale: JsonValue,
    ) -> Self {
        Self {
            party_id,
            round,
            decision,
            // The flag only has meaning on a rejection.
            non_negotiable: non_negotiable && decision == Decision::Rejected,
            rationale,
            origin: ResponseOrigin::Provider,
            recorded_at: Timestamp::now(),
        }
    }

    /// Records the system default for a party whose provider never answered:
    /// `requested_changes` with a rationale naming the timeout.
    pub fn timed_out(party_id: PartyId, round: u32, detail: impl Into<String>) -> Self {
        Self {
            party_id,
            round,
            decision: Decision::RequestedChanges,
            non_negotiable: false,
            rationale: json!({ "system": detail.into() }),
            origin: ResponseOrigin::SystemTimeout,
            recorded_at: Timestamp::now(),
        }
    }

    /// Returns the responding party's identifier.
    pub fn party_id(&self) -> &PartyId {
        &self.party_id
    }

    /// Returns the round this response belongs to.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Returns the decision.
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Returns true for a rejection marked as terminal.
    pub fn is_non_negotiable_rejection(&self) -> bool {
        self.non_negotiable && self.decision == Decision::Rejected
    }

    /// Returns the opaque rationale payload.
    pub fn rationale(&self) -> &JsonValue {
        &self.rationale
    }

    /// Returns how this response was recorded.
    pub fn origin(&self) -> ResponseOrigin {
        self.origin
    }

    /// Returns true if this response is a system-generated timeout default.
    pub fn is_timeout_default(&self) -> bool {
        self.origin == ResponseOrigin::SystemTimeout
    }

    /// Returns when the response was recorded.
    pub fn recorded_at(&self) -> Timestamp {
        self.recorded_at
    }
}
