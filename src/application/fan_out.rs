//! Decision fan-out coordinator.
//!
//! Issues every party's evaluation concurrently with an identical payload
//! and collects the complete response set for the round. This is the
//! single designed suspension point per round: the case's progression
//! waits here, other cases advance freely.
//!
//! A party whose provider fails past the retry budget or stays silent past
//! the round deadline is recorded as `requested_changes` with a system
//! rationale naming the cause. The returned set always contains exactly
//! one response per party; a partial set is never returned.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;

use crate::domain::case::{Case, PartyResponse};
use crate::ports::{CaseContext, DecisionProvider, EvaluationRequest};

use super::RetryPolicy;

/// Coordinates one round of concurrent party evaluations.
pub struct FanOutCoordinator {
    provider: Arc<dyn DecisionProvider>,
    retry: RetryPolicy,
    round_deadline: Duration,
}

impl FanOutCoordinator {
    /// Creates a coordinator.
    ///
    /// `round_deadline` bounds each party's whole evaluation, retries
    /// included.
    pub fn new(
        provider: Arc<dyn DecisionProvider>,
        retry: RetryPolicy,
        round_deadline: Duration,
    ) -> Self {
        Self {
            provider,
            retry,
            round_deadline,
        }
    }

    /// Collects the complete response set for the case's current round.
    pub async fn collect_round(&self, case: &Case) -> Vec<PartyResponse> {
        let context = CaseContext::from_case(case);
        let round = case.round();

        tracing::info!(
            case_id = %case.id(),
            round,
            parties = case.parties().len(),
            "dispatching evaluation round"
        );

        let evaluations = case.parties().iter().map(|party| {
            let request = EvaluationRequest::new(context.clone(), party);
            self.evaluate_party(request, round)
        });

        join_all(evaluations).await
    }

    async fn evaluate_party(&self, request: EvaluationRequest, round: u32) -> PartyResponse {
        let party_id = request.party_id.clone();

        let outcome = timeout(
            self.round_deadline,
            self.retry.run(|| self.provider.evaluate(request.clone())),
        )
        .await;

        match outcome {
            Ok(Ok(evaluation)) => {
                tracing::debug!(party_id = %party_id, round, decision = ?evaluation.decision, "party responded");
                PartyResponse::from_provider(
                    party_id,
                    round,
                    evaluation.decision,
                    evaluation.non_negotiable,
                    evaluation.rationale,
                )
            }
            Ok(Err(err)) => {
                tracing::warn!(party_id = %party_id, round, error = %err, "provider failed past retry budget");
                PartyResponse::timed_out(
                    party_id,
                    round,
                    format!(
                        "provider failed after {} attempts: {}",
                        self.retry.max_attempts(),
                        err
                    ),
                )
            }
            Err(_) => {
                tracing::warn!(party_id = %party_id, round, "no response within round deadline");
                PartyResponse::timed_out(
                    party_id,
                    round,
                    format!("no response within {}s", self.round_deadline.as_secs()),
                )
            }
        }
    }
}
