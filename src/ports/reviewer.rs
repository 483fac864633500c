//! Reviewer port - Interface to the specialized review capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CapabilityError, CaseContext};

/// Verdict of the specialized review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    /// The amendment may proceed to finalization.
    Approved,
    /// The amendment is terminally rejected; this is not a new conflict
    /// and does not re-enter the negotiation loop.
    Rejected,
}

/// Port for the specialized review consulted before finalization.
///
/// Invoked at most once per case, only when the configured review
/// criterion is met.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Reviews the case in its consensus state.
    async fn review(&self, context: CaseContext) -> Result<ReviewVerdict, CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn Reviewer) {}

    #[test]
    fn verdict_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReviewVerdict::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(
            serde_json::to_string(&ReviewVerdict::Rejected).unwrap(),
            "\"rejected\""
        );
    }
}
