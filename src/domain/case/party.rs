//! Party value object.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::PartyId;

/// One stakeholder whose Decision Provider evaluates proposed changes.
///
/// The party list is fixed at case creation; parties are never added or
/// removed mid-workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    id: PartyId,
    /// Capability reference routing to this party's Decision Provider.
    capability: String,
    /// Opaque policy configuration interpreted by the Decision Provider.
    policy: JsonValue,
}

impl Party {
    /// Creates a new party.
    pub fn new(id: PartyId, capability: impl Into<String>, policy: JsonValue) -> Self {
        Self {
            id,
            capability: capability.into(),
            policy,
        }
    }

    /// Returns the party identifier.
    pub fn id(&self) -> &PartyId {
        &self.id
    }

    /// Returns the Decision Provider capability reference.
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Returns the opaque party policy.
    pub fn policy(&self) -> &JsonValue {
        &self.policy
    }
}
