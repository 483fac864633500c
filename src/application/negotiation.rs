//! Negotiation loop controller.
//!
//! Bounds the conflict → mediate → re-evaluate cycle. Each conflict
//! produces exactly one mediation attempt; the controller refuses to start
//! a new evaluation round once the configured maximum has been reached.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::case::{Case, NegotiationAttempt};
use crate::domain::conflict::Conflict;
use crate::domain::foundation::FailureReason;
use crate::ports::{CapabilityError, CaseContext, MediationRequest, Mediator};

use super::RetryPolicy;

/// Result of one mediation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// A compromise was applied and the next evaluation round begins.
    NextRound,
    /// The round limit is reached; the case must fail with
    /// `NegotiationExhausted`.
    Exhausted,
}

/// Drives mediation cycles within the configured round budget.
pub struct NegotiationController {
    mediator: Arc<dyn Mediator>,
    retry: RetryPolicy,
    call_timeout: Duration,
    max_rounds: u32,
}

impl NegotiationController {
    /// Creates a controller. `max_rounds` is clamped to at least one.
    pub fn new(
        mediator: Arc<dyn Mediator>,
        retry: RetryPolicy,
        call_timeout: Duration,
        max_rounds: u32,
    ) -> Self {
        Self {
            mediator,
            retry,
            call_timeout,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Returns the configured round limit.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Runs one mediation cycle for the case's current conflict.
    ///
    /// Records the `NegotiationAttempt`, then either applies the compromise
    /// and advances the round counter, or reports exhaustion when starting
    /// another round would exceed the limit. Mediator failures past the
    /// retry budget are fatal (`MediationUnavailable`).
    pub async fn mediate(
        &self,
        case: &mut Case,
        conflict: Conflict,
    ) -> Result<NegotiationOutcome, FailureReason> {
        let request = MediationRequest {
            context: CaseContext::from_case(case),
            conflict: conflict.clone(),
            responses: case.responses_for_round(case.round()),
        };

        let proposal = self
            .retry
            .run(|| async {
                match timeout(self.call_timeout, self.mediator.propose(request.clone())).await {
                    Ok(result) => result,
                    Err(_) => Err(CapabilityError::timeout(self.call_timeout.as_secs())),
                }
            })
            .await
            .map_err(|err| {
                FailureReason::mediation_unavailable(format!(
                    "{} (after {} attempts)",
                    err,
                    self.retry.max_attempts()
                ))
            })?;

        tracing::info!(
            case_id = %case.id(),
            round = case.round(),
            delta_items = proposal.items.len(),
            "mediation produced a compromise"
        );

        case.record_attempt(NegotiationAttempt::new(case.round(), conflict, proposal.clone()));

        if case.round() >= self.max_rounds {
            return Ok(NegotiationOutcome::Exhausted);
        }

        case.apply_compromise(&proposal);
        case.begin_next_round();
        Ok(NegotiationOutcome::NextRound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::domain::case::{
        CaseDefinition, ChangeDelta, ChangeItem, ChangeSet, Decision, Party, PartyResponse,
    };
    use crate::domain::conflict::{assess, ConflictAssessment};
    use crate::domain::foundation::{ContractRef, PartyId};

    struct StubMediator {
        delta: ChangeDelta,
        failures: AtomicU32,
        calls: AtomicU32,
    }

    impl StubMediator {
        fn proposing(delta: ChangeDelta) -> Self {
            Self {
                delta,
                failures: AtomicU32::new(0),
                calls: AtomicU32::new(0),
            }
        }

        fn always_failing() -> Self {
            Self {
                delta: ChangeDelta::default(),
                failures: AtomicU32::new(u32::MAX),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Mediator for StubMediator {
        async fn propose(
            &self,
            _request: MediationRequest,
        ) -> Result<ChangeDelta, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(CapabilityError::unavailable("mediator outage"));
            }
            Ok(self.delta.clone())
        }
    }

    fn conflicted_case() -> (Case, Conflict) {
        let mut case = Case::new(CaseDefinition {
            contract: ContractRef::new("contracts/msa").unwrap(),
            changes: ChangeSet::from_items(vec![ChangeItem::new(
                "clause_1",
                json!("old"),
                json!("proposed"),
            )]),
            parties: vec![
                Party::new(PartyId::new("a").unwrap(), "providers/a", json!({})),
                Party::new(PartyId::new("b").unwrap(), "providers/b", json!({})),
            ],
            deadline: None,
        })
        .unwrap();

        let responses = vec![
            PartyResponse::from_provider(
                PartyId::new("a").unwrap(),
                1,
                Decision::Approved,
                false,
                json!({}),
            ),
            PartyResponse::from_provider(
                PartyId::new("b").unwrap(),
                1,
                Decision::Rejected,
                false,
                json!({}),
            ),
        ];
        case.record_round_responses(responses.clone());

        let conflict = match assess(1, &responses, 0) {
            ConflictAssessment::Conflict(c) => c,
            ConflictAssessment::NoConflict => panic!("expected conflict"),
        };
        (case, conflict)
    }

    fn controller(mediator: Arc<dyn Mediator>, max_rounds: u32) -> NegotiationController {
        NegotiationController::new(
            mediator,
            RetryPolicy::new(2, Duration::from_millis(1)),
            Duration::from_millis(500),
            max_rounds,
        )
    }

    #[tokio::test]
    async fn applies_compromise_and_starts_next_round() {
        let (mut case, conflict) = conflicted_case();
        let delta = ChangeDelta::from_items(vec![ChangeItem::new(
            "clause_1",
            json!("old"),
            json!("compromise"),
        )]);
        let mediator = Arc::new(StubMediator::proposing(delta));

        let outcome = controller(mediator, 5).mediate(&mut case, conflict).await;

        assert_eq!(outcome.unwrap(), NegotiationOutcome::NextRound);
        assert_eq!(case.round(), 2);
        assert_eq!(case.attempts().len(), 1);
        assert_eq!(case.attempts()[0].round(), 1);
        assert_eq!(
            case.proposed_changes().get("clause_1").unwrap().new_value,
            json!("compromise")
        );
        // Round 1's proposal stays retrievable.
        assert_eq!(case.change_history().len(), 1);
        assert_eq!(
            case.change_history()[0].changes.get("clause_1").unwrap().new_value,
            json!("proposed")
        );
    }

    #[tokio::test]
    async fn reports_exhaustion_at_the_round_limit() {
        let (mut case, conflict) = conflicted_case();
        let mediator = Arc::new(StubMediator::proposing(ChangeDelta::default()));

        let outcome = controller(mediator, 1).mediate(&mut case, conflict).await;

        assert_eq!(outcome.unwrap(), NegotiationOutcome::Exhausted);
        // The attempt is still recorded; the round counter does not move.
        assert_eq!(case.attempts().len(), 1);
        assert_eq!(case.round(), 1);
    }

    #[tokio::test]
    async fn mediator_exhaustion_is_fatal() {
        let (mut case, conflict) = conflicted_case();
        let mediator = Arc::new(StubMediator::always_failing());
        let mediator_handle = mediator.clone();

        let outcome = controller(mediator, 5).mediate(&mut case, conflict).await;

        match outcome {
            Err(FailureReason::MediationUnavailable { detail }) => {
                assert!(detail.contains("after 2 attempts"));
            }
            other => panic!("expected MediationUnavailable, got {:?}", other),
        }
        assert_eq!(mediator_handle.calls.load(Ordering::SeqCst), 2);
        assert!(case.attempts().is_empty());
    }
}
