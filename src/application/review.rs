//! Review gate.
//!
//! A stateless criterion over case attributes plus, when the criterion is
//! met, a single call to the specialized review capability. The call
//! happens once per case, not per round, and its verdict gates
//! finalization: a rejection is terminal, never a new conflict.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::case::Case;
use crate::domain::foundation::FailureReason;
use crate::ports::{CapabilityError, CaseContext, ReviewVerdict, Reviewer};

use super::RetryPolicy;

/// Configured criterion deciding whether a case needs specialized review.
#[derive(Debug, Clone)]
pub struct ReviewPolicy {
    /// Review every case regardless of content.
    pub always_require: bool,
    /// Terms whose presence in a change item flags the case for review
    /// (matched case-insensitively against item names and new values).
    pub flagged_terms: Vec<String>,
    /// Party count at or above which complexity review kicks in
    /// (together with `min_changes`; zero disables the threshold).
    pub min_parties: usize,
    /// Change count at or above which complexity review kicks in
    /// (together with `min_parties`; zero disables the threshold).
    pub min_changes: usize,
}

impl ReviewPolicy {
    /// A policy that never requires review.
    pub fn disabled() -> Self {
        Self {
            always_require: false,
            flagged_terms: Vec::new(),
            min_parties: 0,
            min_changes: 0,
        }
    }

    /// Evaluates the criterion against the case.
    pub fn requires_review(&self, case: &Case) -> bool {
        if self.always_require {
            return true;
        }

        if self.min_parties > 0
            && self.min_changes > 0
            && case.parties().len() >= self.min_parties
            && case.proposed_changes().len() >= self.min_changes
        {
            return true;
        }

        case.proposed_changes().items().iter().any(|item| {
            self.is_flagged(&item.name) || self.is_flagged(&item.new_value.to_string())
        })
    }

    fn is_flagged(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.flagged_terms
            .iter()
            .any(|term| lowered.contains(&term.to_lowercase()))
    }
}

/// Conditional review step before finalization.
pub struct ReviewGate {
    reviewer: Arc<dyn Reviewer>,
    policy: ReviewPolicy,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl ReviewGate {
    /// Creates a review gate.
    pub fn new(
        reviewer: Arc<dyn Reviewer>,
        policy: ReviewPolicy,
        retry: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            reviewer,
            policy,
            retry,
            call_timeout,
        }
    }

    /// Returns true if the configured criterion is met for the case.
    pub fn requires_review(&self, case: &Case) -> bool {
        self.policy.requires_review(case)
    }

    /// Invokes the specialized review capability.
    ///
    /// Failures past the retry budget are fatal (`ReviewUnavailable`).
    pub async fn review(&self, case: &Case) -> Result<ReviewVerdict, FailureReason> {
        let context = CaseContext::from_case(case);

        let verdict = self
            .retry
            .run(|| async {
                match timeout(self.call_timeout, self.reviewer.review(context.clone())).await {
                    Ok(result) => result,
                    Err(_) => Err(CapabilityError::timeout(self.call_timeout.as_secs())),
                }
            })
            .await
            .map_err(|err| {
                FailureReason::review_unavailable(format!(
                    "{} (after {} attempts)",
                    err,
                    self.retry.max_attempts()
                ))
            })?;

        tracing::info!(case_id = %case.id(), verdict = ?verdict, "specialized review returned");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::domain::case::{CaseDefinition, ChangeItem, ChangeSet, Party};
    use crate::domain::foundation::{ContractRef, PartyId};

    fn case_with(parties: usize, items: Vec<ChangeItem>) -> Case {
        Case::new(CaseDefinition {
            contract: ContractRef::new("contracts/msa").unwrap(),
            changes: ChangeSet::from_items(items),
            parties: (0..parties)
                .map(|i| {
                    Party::new(
                        PartyId::new(format!("party-{}", i)).unwrap(),
                        "providers/x",
                        json!({}),
                    )
                })
                .collect(),
            deadline: None,
        })
        .unwrap()
    }

    fn item(name: &str, new_value: &str) -> ChangeItem {
        ChangeItem::new(name, json!(null), json!(new_value))
    }

    fn policy() -> ReviewPolicy {
        ReviewPolicy {
            always_require: false,
            flagged_terms: vec!["liability".to_string(), "indemnification".to_string()],
            min_parties: 3,
            min_changes: 3,
        }
    }

    #[test]
    fn simple_case_needs_no_review() {
        let case = case_with(2, vec![item("payment_terms", "net 45")]);
        assert!(!policy().requires_review(&case));
    }

    #[test]
    fn always_require_overrides_content() {
        let case = case_with(1, vec![item("payment_terms", "net 45")]);
        let mut policy = policy();
        policy.always_require = true;
        assert!(policy.requires_review(&case));
    }

    #[test]
    fn flagged_term_in_item_name_triggers_review() {
        let case = case_with(2, vec![item("liability_cap", "USD 1M")]);
        assert!(policy().requires_review(&case));
    }

    #[test]
    fn flagged_term_in_new_value_triggers_review_case_insensitively() {
        let case = case_with(2, vec![item("clause_7", "full Indemnification by vendor")]);
        assert!(policy().requires_review(&case));
    }

    #[test]
    fn complexity_thresholds_trigger_review() {
        let case = case_with(
            3,
            vec![item("a", "1"), item("b", "2"), item("c", "3")],
        );
        assert!(policy().requires_review(&case));

        // Three parties but only one change stays below the bar.
        let case = case_with(3, vec![item("a", "1")]);
        assert!(!policy().requires_review(&case));
    }

    #[test]
    fn zero_thresholds_disable_complexity_check() {
        let mut policy = policy();
        policy.min_parties = 0;
        policy.min_changes = 0;
        let case = case_with(5, vec![item("a", "1"), item("b", "2"), item("c", "3")]);
        assert!(!policy.requires_review(&case));
    }

    struct StubReviewer {
        verdict: Option<ReviewVerdict>,
    }

    #[async_trait]
    impl Reviewer for StubReviewer {
        async fn review(&self, _context: CaseContext) -> Result<ReviewVerdict, CapabilityError> {
            match self.verdict {
                Some(verdict) => Ok(verdict),
                None => Err(CapabilityError::unavailable("review service down")),
            }
        }
    }

    fn gate(verdict: Option<ReviewVerdict>) -> ReviewGate {
        ReviewGate::new(
            Arc::new(StubReviewer { verdict }),
            policy(),
            RetryPolicy::new(2, Duration::from_millis(1)),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn review_returns_verdict() {
        let case = case_with(2, vec![item("liability_cap", "USD 1M")]);
        let verdict = gate(Some(ReviewVerdict::Approved)).review(&case).await;
        assert_eq!(verdict.unwrap(), ReviewVerdict::Approved);
    }

    #[tokio::test]
    async fn reviewer_exhaustion_is_fatal() {
        let case = case_with(2, vec![item("liability_cap", "USD 1M")]);
        let verdict = gate(None).review(&case).await;
        match verdict {
            Err(FailureReason::ReviewUnavailable { detail }) => {
                assert!(detail.contains("after 2 attempts"));
            }
            other => panic!("expected ReviewUnavailable, got {:?}", other),
        }
    }
}
