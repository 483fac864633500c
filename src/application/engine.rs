//! Orchestration engine.
//!
//! Owns the per-case state machine and sequences fan-out, conflict
//! detection, negotiation, review, and finalization. Every transition is
//! committed to the case registry before the next step runs (write-ahead
//! discipline) and one workflow event is emitted after each commit.
//!
//! Per-case serialization is enforced twice: an in-flight guard rejects a
//! second concurrent `run` on the same case, and the registry's optimistic
//! commit rejects any transition whose observed prior state is stale. A
//! cancel or pause lands at the next commit boundary; in-flight capability
//! calls are never force-aborted, their results are simply discarded when
//! the stale commit is refused.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::json;
use thiserror::Error;

use crate::config::AppConfig;
use crate::domain::case::{Case, CaseDefinition};
use crate::domain::conflict::{assess, ConflictAssessment};
use crate::domain::foundation::{
    CaseId, CaseState, FailureReason, Timestamp, TransitionError, ValidationError, WorkflowEvent,
    WorkflowStage,
};
use crate::ports::{
    CaseFilter, CaseRegistry, DecisionProvider, EventSink, Mediator, Merger, RegistryError,
    ReviewVerdict, Reviewer,
};

use super::{
    FanOutCoordinator, Finalizer, NegotiationController, NegotiationOutcome, RetryPolicy,
    ReviewGate,
};

/// Errors surfaced at the engine's operator boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The case definition was rejected; no case was created.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Case storage failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An attempted transition is not in the state machine.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Another `run` is already advancing this case.
    #[error("case '{case_id}' is already being advanced")]
    AdvanceInProgress { case_id: CaseId },

    /// The case transitioned concurrently; reload and retry.
    #[error("case '{case_id}' transitioned concurrently; reload and retry")]
    ConcurrentTransition { case_id: CaseId },

    /// The requested operation needs a non-terminal case.
    #[error("case '{case_id}' is already terminal in state '{state}'")]
    AlreadyTerminal {
        case_id: CaseId,
        state: &'static str,
    },

    /// Resume was requested for a case that is not paused.
    #[error("case '{case_id}' is not paused (state '{state}')")]
    NotPaused {
        case_id: CaseId,
        state: &'static str,
    },
}

/// Result of committing a transition against the registry.
enum CommitOutcome {
    /// The transition committed and its event was emitted.
    Advanced,
    /// The registry refused the stale commit; the case was reloaded.
    Superseded,
}

/// The workflow orchestration engine.
pub struct OrchestrationEngine {
    registry: Arc<dyn CaseRegistry>,
    sink: Arc<dyn EventSink>,
    fan_out: FanOutCoordinator,
    negotiation: NegotiationController,
    review_gate: ReviewGate,
    finalizer: Finalizer,
    requested_changes_tolerance: u32,
    in_flight: Mutex<HashSet<CaseId>>,
}

impl OrchestrationEngine {
    /// Creates an engine from pre-built components.
    pub fn new(
        registry: Arc<dyn CaseRegistry>,
        sink: Arc<dyn EventSink>,
        fan_out: FanOutCoordinator,
        negotiation: NegotiationController,
        review_gate: ReviewGate,
        finalizer: Finalizer,
        requested_changes_tolerance: u32,
    ) -> Self {
        Self {
            registry,
            sink,
            fan_out,
            negotiation,
            review_gate,
            finalizer,
            requested_changes_tolerance,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Wires an engine from configuration and collaborator ports.
    pub fn from_config(
        config: &AppConfig,
        registry: Arc<dyn CaseRegistry>,
        sink: Arc<dyn EventSink>,
        provider: Arc<dyn DecisionProvider>,
        mediator: Arc<dyn Mediator>,
        reviewer: Arc<dyn Reviewer>,
        merger: Arc<dyn Merger>,
    ) -> Self {
        let retry = RetryPolicy::new(
            config.capabilities.max_retries,
            config.capabilities.retry_backoff(),
        );

        Self::new(
            registry,
            sink,
            FanOutCoordinator::new(
                provider,
                retry.clone(),
                config.capabilities.evaluation_round(),
            ),
            NegotiationController::new(
                mediator,
                retry.clone(),
                config.capabilities.mediation_timeout(),
                config.engine.max_rounds,
            ),
            ReviewGate::new(
                reviewer,
                config.review.to_policy(),
                retry.clone(),
                config.capabilities.review_timeout(),
            ),
            Finalizer::new(merger, retry, config.capabilities.merge_timeout()),
            config.engine.requested_changes_tolerance,
        )
    }

    // ───────────────────────────────────────────────────────────────
    // Operator Surface
    // ───────────────────────────────────────────────────────────────

    /// Validates and stores a new case; the case is never created when
    /// validation fails.
    pub async fn initiate(&self, definition: CaseDefinition) -> Result<CaseId, EngineError> {
        let case = Case::new(definition)?;
        let case_id = case.id();
        let parties = case.parties().len();
        let changes = case.proposed_changes().len();

        self.registry.create(case).await?;
        self.emit(WorkflowEvent::new(
            case_id,
            CaseState::Initiated,
            CaseState::Initiated,
            WorkflowStage::Operator,
            json!({"action": "initiated", "parties": parties, "changes": changes}),
        ))
        .await;

        tracing::info!(case_id = %case_id, parties, changes, "case initiated");
        Ok(case_id)
    }

    /// Drives the case forward until it reaches a terminal state or pauses.
    ///
    /// A second concurrent `run` on the same case is rejected with
    /// [`EngineError::AdvanceInProgress`], never queued silently.
    pub async fn run(&self, case_id: CaseId) -> Result<CaseState, EngineError> {
        let _guard = self.begin_advance(case_id)?;
        let mut case = self.registry.load(case_id).await?;

        loop {
            let state = case.state().clone();
            if state.is_terminal() || state.is_paused() {
                return Ok(state);
            }

            let outcome = if case.deadline_expired(&Timestamp::now()) {
                self.fail_case(&mut case, FailureReason::DeadlineExceeded, WorkflowStage::Engine)
                    .await?
            } else {
                match state {
                    CaseState::Initiated => self.step_initiated(&mut case).await?,
                    CaseState::Evaluating => self.step_evaluating(&mut case).await?,
                    CaseState::ConflictDetected => self.step_conflict_detected(&mut case).await?,
                    CaseState::Mediating => self.step_mediating(&mut case).await?,
                    CaseState::Reviewing => self.step_reviewing(&mut case).await?,
                    CaseState::Finalizing => self.step_finalizing(&mut case).await?,
                    CaseState::Completed
                    | CaseState::Failed
                    | CaseState::Cancelled
                    | CaseState::Paused { .. } => unreachable!("handled above"),
                }
            };

            match outcome {
                CommitOutcome::Advanced => {}
                CommitOutcome::Superseded => {
                    // Someone else moved the case: an operator cancel or
                    // pause lands here, and this run's in-flight results
                    // are discarded with the refused commit.
                    let current = case.state().clone();
                    if current.is_terminal() || current.is_paused() {
                        return Ok(current);
                    }
                    return Err(EngineError::ConcurrentTransition { case_id });
                }
            }
        }
    }

    /// Returns the latest committed snapshot of a case.
    pub async fn status(&self, case_id: CaseId) -> Result<Case, EngineError> {
        Ok(self.registry.load(case_id).await?)
    }

    /// Lists cases matching the filter.
    pub async fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, EngineError> {
        Ok(self.registry.list(filter).await?)
    }

    /// Cancels a case at the next commit boundary.
    pub async fn cancel(
        &self,
        case_id: CaseId,
        reason: impl Into<String>,
    ) -> Result<(), EngineError> {
        let reason = reason.into();
        // The case may be advancing concurrently; retry around refused
        // commits until the cancel lands between two transitions.
        for _ in 0..COMMIT_RETRY_LIMIT {
            let mut case = self.registry.load(case_id).await?;
            if case.state().is_terminal() {
                return Err(EngineError::AlreadyTerminal {
                    case_id,
                    state: case.state().name(),
                });
            }

            let before = case.state().clone();
            case.cancel(reason.clone())?;
            match self
                .commit(
                    &mut case,
                    before,
                    WorkflowStage::Operator,
                    json!({"action": "cancel", "reason": reason}),
                )
                .await?
            {
                CommitOutcome::Advanced => return Ok(()),
                CommitOutcome::Superseded => continue,
            }
        }
        Err(EngineError::ConcurrentTransition { case_id })
    }

    /// Pauses a case at the next commit boundary.
    pub async fn pause(&self, case_id: CaseId) -> Result<(), EngineError> {
        for _ in 0..COMMIT_RETRY_LIMIT {
            let mut case = self.registry.load(case_id).await?;
            if case.state().is_terminal() {
                return Err(EngineError::AlreadyTerminal {
                    case_id,
                    state: case.state().name(),
                });
            }

            let before = case.state().clone();
            case.pause()?;
            match self
                .commit(
                    &mut case,
                    before,
                    WorkflowStage::Operator,
                    json!({"action": "pause"}),
                )
                .await?
            {
                CommitOutcome::Advanced => return Ok(()),
                CommitOutcome::Superseded => continue,
            }
        }
        Err(EngineError::ConcurrentTransition { case_id })
    }

    /// Resumes a paused case, re-entering the interrupted step.
    ///
    /// The step is re-issued idempotently on the next `run`: external
    /// calls are made fresh, and previously committed responses for
    /// completed rounds are untouched.
    pub async fn resume(&self, case_id: CaseId) -> Result<CaseState, EngineError> {
        let mut case = self.registry.load(case_id).await?;
        if !case.state().is_paused() {
            return Err(EngineError::NotPaused {
                case_id,
                state: case.state().name(),
            });
        }

        let before = case.state().clone();
        let target = case.resume()?;
        match self
            .commit(
                &mut case,
                before,
                WorkflowStage::Operator,
                json!({"action": "resume", "resumed_to": target.name()}),
            )
            .await?
        {
            CommitOutcome::Advanced => Ok(target),
            CommitOutcome::Superseded => Err(EngineError::ConcurrentTransition { case_id }),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Step Implementations
    // ───────────────────────────────────────────────────────────────

    async fn step_initiated(&self, case: &mut Case) -> Result<CommitOutcome, EngineError> {
        self.advance(
            case,
            CaseState::Evaluating,
            WorkflowStage::Engine,
            json!({"round": case.round()}),
        )
        .await
    }

    async fn step_evaluating(&self, case: &mut Case) -> Result<CommitOutcome, EngineError> {
        let round = case.round();
        let responses = self.fan_out.collect_round(case).await;

        if let Some(rejection) = responses.iter().find(|r| r.is_non_negotiable_rejection()) {
            let party_id = rejection.party_id().to_string();
            case.record_round_responses(responses.clone());
            return self
                .fail_case(
                    case,
                    FailureReason::NonNegotiableRejection { party_id },
                    WorkflowStage::FanOut,
                )
                .await;
        }

        match assess(round, &responses, self.requested_changes_tolerance) {
            ConflictAssessment::NoConflict => {
                case.record_round_responses(responses);
                let to = if self.review_gate.requires_review(case) {
                    CaseState::Reviewing
                } else {
                    CaseState::Finalizing
                };
                self.advance(
                    case,
                    to,
                    WorkflowStage::ConflictDetector,
                    json!({"round": round, "consensus": true}),
                )
                .await
            }
            ConflictAssessment::Conflict(conflict) => {
                case.record_round_responses(responses);
                self.advance(
                    case,
                    CaseState::ConflictDetected,
                    WorkflowStage::ConflictDetector,
                    json!({
                        "round": round,
                        "disagreeing": conflict.dissent_count(),
                        "agreeing": conflict.agreeing.len(),
                    }),
                )
                .await
            }
        }
    }

    async fn step_conflict_detected(&self, case: &mut Case) -> Result<CommitOutcome, EngineError> {
        self.advance(
            case,
            CaseState::Mediating,
            WorkflowStage::Engine,
            json!({"round": case.round()}),
        )
        .await
    }

    async fn step_mediating(&self, case: &mut Case) -> Result<CommitOutcome, EngineError> {
        let round = case.round();
        let responses = case.responses_for_round(round);

        let conflict = match assess(round, &responses, self.requested_changes_tolerance) {
            ConflictAssessment::Conflict(conflict) => conflict,
            ConflictAssessment::NoConflict => {
                // Unreachable with a deterministic detector over immutable
                // responses; recover by re-running the round.
                tracing::error!(case_id = %case.id(), round, "mediating without a conflict");
                case.begin_next_round();
                return self
                    .advance(
                        case,
                        CaseState::Evaluating,
                        WorkflowStage::Negotiation,
                        json!({"round": case.round(), "recovered": true}),
                    )
                    .await;
            }
        };

        match self.negotiation.mediate(case, conflict).await {
            Ok(NegotiationOutcome::NextRound) => {
                self.advance(
                    case,
                    CaseState::Evaluating,
                    WorkflowStage::Negotiation,
                    json!({"round": case.round(), "attempts": case.attempts().len()}),
                )
                .await
            }
            Ok(NegotiationOutcome::Exhausted) => {
                let rounds = case.round();
                self.fail_case(
                    case,
                    FailureReason::NegotiationExhausted { rounds },
                    WorkflowStage::Negotiation,
                )
                .await
            }
            Err(reason) => self.fail_case(case, reason, WorkflowStage::Negotiation).await,
        }
    }

    async fn step_reviewing(&self, case: &mut Case) -> Result<CommitOutcome, EngineError> {
        match self.review_gate.review(case).await {
            Ok(ReviewVerdict::Approved) => {
                self.advance(
                    case,
                    CaseState::Finalizing,
                    WorkflowStage::ReviewGate,
                    json!({"verdict": "approved"}),
                )
                .await
            }
            Ok(ReviewVerdict::Rejected) => {
                self.fail_case(case, FailureReason::ReviewRejected, WorkflowStage::ReviewGate)
                    .await
            }
            Err(reason) => self.fail_case(case, reason, WorkflowStage::ReviewGate).await,
        }
    }

    async fn step_finalizing(&self, case: &mut Case) -> Result<CommitOutcome, EngineError> {
        match self.finalizer.consolidate(case).await {
            Ok(artifact) => {
                let summary = json!({
                    "artifact": artifact.reference,
                    "content_hash": artifact.content_hash,
                });
                case.set_artifact(artifact);
                self.advance(case, CaseState::Completed, WorkflowStage::Finalizer, summary)
                    .await
            }
            Err(reason) => self.fail_case(case, reason, WorkflowStage::Finalizer).await,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Commit Plumbing
    // ───────────────────────────────────────────────────────────────

    async fn advance(
        &self,
        case: &mut Case,
        to: CaseState,
        stage: WorkflowStage,
        summary: serde_json::Value,
    ) -> Result<CommitOutcome, EngineError> {
        let before = case.state().clone();
        case.transition_to(to)?;
        self.commit(case, before, stage, summary).await
    }

    async fn fail_case(
        &self,
        case: &mut Case,
        reason: FailureReason,
        stage: WorkflowStage,
    ) -> Result<CommitOutcome, EngineError> {
        let before = case.state().clone();
        let summary = json!({"reason": reason.to_string(), "round": case.round()});
        case.fail(reason)?;
        self.commit(case, before, stage, summary).await
    }

    /// Commits the already-transitioned case, guarded by the observed
    /// prior state, and emits the workflow event on success.
    async fn commit(
        &self,
        case: &mut Case,
        before: CaseState,
        stage: WorkflowStage,
        summary: serde_json::Value,
    ) -> Result<CommitOutcome, EngineError> {
        let case_id = case.id();
        let after = case.state().clone();

        match self.registry.commit(case_id, &before, case.clone()).await {
            Ok(()) => {
                tracing::info!(
                    case_id = %case_id,
                    from = %before,
                    to = %after,
                    stage = %stage,
                    "transition committed"
                );
                self.emit(WorkflowEvent::new(case_id, before, after, stage, summary))
                    .await;
                Ok(CommitOutcome::Advanced)
            }
            Err(RegistryError::StateConflict { .. }) => {
                *case = self.registry.load(case_id).await?;
                tracing::info!(
                    case_id = %case_id,
                    current = %case.state(),
                    "commit superseded by a concurrent transition"
                );
                Ok(CommitOutcome::Superseded)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Emission failures never fail the case: the event is re-emittable
    /// from the committed state and the sink contract is at-least-once.
    async fn emit(&self, event: WorkflowEvent) {
        if let Err(err) = self.sink.emit(event).await {
            tracing::warn!(error = %err, "event emission failed");
        }
    }

    fn begin_advance(&self, case_id: CaseId) -> Result<InFlightGuard<'_>, EngineError> {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        if !in_flight.insert(case_id) {
            return Err(EngineError::AdvanceInProgress { case_id });
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            case_id,
        })
    }
}

const COMMIT_RETRY_LIMIT: u32 = 16;

/// Removes the case from the in-flight set when `run` returns.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<CaseId>>,
    case_id: CaseId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .remove(&self.case_id);
    }
}
