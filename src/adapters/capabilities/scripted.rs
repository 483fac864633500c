//! Scripted capability adapters for tests and demos.
//!
//! Each adapter answers from a per-call queue and falls back to a
//! deterministic default when the queue is empty. Call counts are exposed
//! for assertions.
//!
//! # Panics
//!
//! Methods panic if internal locks are poisoned. Test-only code.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::domain::case::{ArtifactRef, ChangeDelta, ChangeSet};
use crate::domain::foundation::ContractRef;
use crate::ports::{
    CapabilityError, CaseContext, DecisionProvider, EvaluationRequest, MediationRequest, Mediator,
    Merger, PartyEvaluation, ReviewVerdict, Reviewer,
};

/// One scripted provider behavior, consumed per call.
pub enum ScriptedOutcome {
    /// Return this evaluation.
    Respond(PartyEvaluation),
    /// Fail with this error.
    Fail(CapabilityError),
    /// Never answer (drives the round deadline).
    Hang,
}

/// Decision provider answering from per-party scripts.
///
/// Parties without a script (or with an exhausted one) approve with a
/// stock rationale.
pub struct ScriptedDecisionProvider {
    scripts: Mutex<HashMap<String, Vec<ScriptedOutcome>>>,
    calls: AtomicU32,
}

impl ScriptedDecisionProvider {
    /// Creates a provider where every party approves.
    pub fn approving() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Queues an outcome for a party; outcomes are consumed in order.
    pub fn enqueue(&self, party: &str, outcome: ScriptedOutcome) {
        self.scripts
            .lock()
            .expect("ScriptedDecisionProvider: lock poisoned")
            .entry(party.to_string())
            .or_default()
            .push(outcome);
    }

    /// Queues a decision for a party.
    pub fn enqueue_evaluation(&self, party: &str, evaluation: PartyEvaluation) {
        self.enqueue(party, ScriptedOutcome::Respond(evaluation));
    }

    /// Queues a transient failure for a party.
    pub fn enqueue_failure(&self, party: &str, error: CapabilityError) {
        self.enqueue(party, ScriptedOutcome::Fail(error));
    }

    /// Queues permanent silence for a party.
    pub fn enqueue_hang(&self, party: &str) {
        self.enqueue(party, ScriptedOutcome::Hang);
    }

    /// Total evaluate calls observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionProvider for ScriptedDecisionProvider {
    async fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<PartyEvaluation, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let outcome = {
            let mut scripts = self
                .scripts
                .lock()
                .expect("ScriptedDecisionProvider: lock poisoned");
            match scripts.get_mut(request.party_id.as_str()) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            }
        };

        match outcome {
            Some(ScriptedOutcome::Respond(evaluation)) => Ok(evaluation),
            Some(ScriptedOutcome::Fail(error)) => Err(error),
            Some(ScriptedOutcome::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            None => Ok(PartyEvaluation::approved(serde_json::json!({
                "summary": "no objections",
                "party": request.party_id.as_str(),
                "round": request.context.round,
            }))),
        }
    }
}

/// Mediator answering from a queue, defaulting to a fixed delta.
pub struct ScriptedMediator {
    outcomes: Mutex<Vec<Result<ChangeDelta, CapabilityError>>>,
    default_delta: ChangeDelta,
    calls: AtomicU32,
}

impl ScriptedMediator {
    /// Creates a mediator whose default compromise is an empty delta.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            default_delta: ChangeDelta::default(),
            calls: AtomicU32::new(0),
        }
    }

    /// Sets the default compromise returned when the queue is empty.
    pub fn with_default_delta(mut self, delta: ChangeDelta) -> Self {
        self.default_delta = delta;
        self
    }

    /// Queues one proposal outcome.
    pub fn enqueue(&self, outcome: Result<ChangeDelta, CapabilityError>) {
        self.outcomes
            .lock()
            .expect("ScriptedMediator: lock poisoned")
            .push(outcome);
    }

    /// Total propose calls observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedMediator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mediator for ScriptedMediator {
    async fn propose(&self, _request: MediationRequest) -> Result<ChangeDelta, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.outcomes.lock().expect("ScriptedMediator: lock poisoned");
        if outcomes.is_empty() {
            Ok(self.default_delta.clone())
        } else {
            outcomes.remove(0)
        }
    }
}

/// Reviewer answering from a queue, defaulting to approval.
pub struct ScriptedReviewer {
    outcomes: Mutex<Vec<Result<ReviewVerdict, CapabilityError>>>,
    calls: AtomicU32,
}

impl ScriptedReviewer {
    /// Creates a reviewer that approves by default.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Queues one verdict outcome.
    pub fn enqueue(&self, outcome: Result<ReviewVerdict, CapabilityError>) {
        self.outcomes
            .lock()
            .expect("ScriptedReviewer: lock poisoned")
            .push(outcome);
    }

    /// Total review calls observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedReviewer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reviewer for ScriptedReviewer {
    async fn review(&self, _context: CaseContext) -> Result<ReviewVerdict, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.outcomes.lock().expect("ScriptedReviewer: lock poisoned");
        if outcomes.is_empty() {
            Ok(ReviewVerdict::Approved)
        } else {
            outcomes.remove(0)
        }
    }
}

/// Merger producing deterministic artifacts, with optional scripted
/// failures.
pub struct ScriptedMerger {
    failures: Mutex<Vec<CapabilityError>>,
    calls: AtomicU32,
}

impl ScriptedMerger {
    /// Creates a merger that always succeeds.
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Queues one failure; subsequent calls succeed again.
    pub fn enqueue_failure(&self, error: CapabilityError) {
        self.failures
            .lock()
            .expect("ScriptedMerger: lock poisoned")
            .push(error);
    }

    /// Total merge calls observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Merger for ScriptedMerger {
    async fn merge(
        &self,
        contract: &ContractRef,
        accepted: &ChangeSet,
    ) -> Result<ArtifactRef, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        {
            let mut failures = self.failures.lock().expect("ScriptedMerger: lock poisoned");
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }
        }

        let payload = serde_json::to_vec(accepted)
            .map_err(|err| CapabilityError::parse(err.to_string()))?;
        let digest = Sha256::digest(&payload);
        let content_hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        Ok(ArtifactRef::new(
            format!("artifact://{}/merged", contract),
            content_hash,
        ))
    }
}
