//! Integration tests for the amendment workflow engine.
//!
//! These tests drive full workflows through the engine with in-memory
//! infrastructure and scripted capabilities: unanimous approval, mediated
//! conflicts, round exhaustion, provider timeouts, review gating,
//! cancellation, and pause/resume.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use accord::adapters::{
    InMemoryCaseRegistry, InMemoryEventSink, ScriptedDecisionProvider, ScriptedMediator,
    ScriptedMerger, ScriptedReviewer,
};
use accord::application::{
    EngineError, FanOutCoordinator, Finalizer, NegotiationController, OrchestrationEngine,
    RetryPolicy, ReviewGate, ReviewPolicy,
};
use accord::domain::case::{CaseDefinition, ChangeDelta, ChangeItem, ChangeSet, Decision, Party};
use accord::domain::foundation::{CaseState, ContractRef, FailureReason, PartyId};
use accord::ports::{CapabilityError, PartyEvaluation, ReviewVerdict};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    engine: Arc<OrchestrationEngine>,
    sink: Arc<InMemoryEventSink>,
    provider: Arc<ScriptedDecisionProvider>,
    mediator: Arc<ScriptedMediator>,
    reviewer: Arc<ScriptedReviewer>,
    merger: Arc<ScriptedMerger>,
}

struct HarnessOptions {
    max_rounds: u32,
    requested_changes_tolerance: u32,
    review_policy: ReviewPolicy,
    round_deadline: Duration,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            requested_changes_tolerance: 0,
            review_policy: ReviewPolicy::disabled(),
            round_deadline: Duration::from_millis(300),
        }
    }
}

fn harness(options: HarnessOptions) -> Harness {
    let registry = Arc::new(InMemoryCaseRegistry::new());
    let sink = Arc::new(InMemoryEventSink::new());
    let provider = Arc::new(ScriptedDecisionProvider::approving());
    let mediator = Arc::new(ScriptedMediator::new());
    let reviewer = Arc::new(ScriptedReviewer::new());
    let merger = Arc::new(ScriptedMerger::new());
    let retry = RetryPolicy::new(2, Duration::from_millis(1));

    let engine = Arc::new(OrchestrationEngine::new(
        registry,
        sink.clone(),
        FanOutCoordinator::new(provider.clone(), retry.clone(), options.round_deadline),
        NegotiationController::new(
            mediator.clone(),
            retry.clone(),
            Duration::from_millis(200),
            options.max_rounds,
        ),
        ReviewGate::new(
            reviewer.clone(),
            options.review_policy,
            retry.clone(),
            Duration::from_millis(200),
        ),
        Finalizer::new(merger.clone(), retry, Duration::from_millis(200)),
        options.requested_changes_tolerance,
    ));

    Harness {
        engine,
        sink,
        provider,
        mediator,
        reviewer,
        merger,
    }
}

fn definition(party_ids: &[&str], items: Vec<ChangeItem>) -> CaseDefinition {
    CaseDefinition {
        contract: ContractRef::new("contracts/msa-2026").unwrap(),
        changes: ChangeSet::from_items(items),
        parties: party_ids
            .iter()
            .map(|id| {
                Party::new(
                    PartyId::new(*id).unwrap(),
                    format!("providers/{}", id),
                    json!({"risk_tolerance": "medium"}),
                )
            })
            .collect(),
        deadline: None,
    }
}

fn payment_terms_change() -> Vec<ChangeItem> {
    vec![ChangeItem::new(
        "payment_terms",
        json!("net 30"),
        json!("net 45"),
    )]
}

// =============================================================================
// Happy Path and Negotiation
// =============================================================================

#[tokio::test]
async fn scenario_a_unanimous_approval_completes_in_one_round() {
    let h = harness(HarnessOptions::default());
    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Completed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.round(), 1);
    assert!(case.attempts().is_empty());
    assert!(case.artifact().is_some());
    // Review criterion not met, so the reviewer is never consulted.
    assert_eq!(h.reviewer.calls(), 0);
    assert_eq!(h.merger.calls(), 1);
}

#[tokio::test]
async fn scenario_b_single_rejection_mediates_then_completes() {
    let h = harness(HarnessOptions::default());
    h.provider.enqueue_evaluation(
        "carrier",
        PartyEvaluation::rejected(json!({"summary": "unacceptable liability shift"})),
    );
    h.mediator.enqueue(Ok(ChangeDelta::from_items(vec![ChangeItem::new(
        "payment_terms",
        json!("net 30"),
        json!("net 40"),
    )])));

    let case_id = h
        .engine
        .initiate(definition(
            &["customer", "vendor", "carrier"],
            payment_terms_change(),
        ))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Completed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.round(), 2);
    assert_eq!(case.attempts().len(), 1);

    // The detector reported one dissenter against two approvers.
    let conflict = case.attempts()[0].conflict();
    assert_eq!(conflict.dissent_count(), 1);
    assert_eq!(conflict.agreeing.len(), 2);
    assert_eq!(conflict.disagreeing[0].party_id.as_str(), "carrier");

    // The mediated proposal replaced the round-1 change set, which stays
    // retrievable in history.
    assert_eq!(
        case.proposed_changes().get("payment_terms").unwrap().new_value,
        json!("net 40")
    );
    assert_eq!(case.change_history().len(), 1);
    assert_eq!(
        case.change_history()[0]
            .changes
            .get("payment_terms")
            .unwrap()
            .new_value,
        json!("net 45")
    );

    // Both rounds keep their complete response sets.
    assert_eq!(case.responses_for_round(1).len(), 3);
    assert_eq!(case.responses_for_round(2).len(), 3);
}

#[tokio::test]
async fn scenario_b_event_feed_matches_commit_order() {
    let h = harness(HarnessOptions::default());
    h.provider
        .enqueue_evaluation("carrier", PartyEvaluation::rejected(json!({})));

    let case_id = h
        .engine
        .initiate(definition(
            &["customer", "vendor", "carrier"],
            payment_terms_change(),
        ))
        .await
        .unwrap();
    h.engine.run(case_id).await.unwrap();

    let states: Vec<&str> = h
        .sink
        .events_for_case(case_id)
        .iter()
        .map(|e| e.state_after.name())
        .collect();
    assert_eq!(
        states,
        vec![
            "initiated",
            "evaluating",
            "conflict_detected",
            "mediating",
            "evaluating",
            "finalizing",
            "completed",
        ]
    );
}

#[tokio::test]
async fn scenario_c_round_limit_exhaustion_fails_with_two_attempts() {
    let h = harness(HarnessOptions {
        max_rounds: 2,
        ..Default::default()
    });
    // The vendor rejects in both rounds.
    h.provider
        .enqueue_evaluation("vendor", PartyEvaluation::rejected(json!({"round": 1})));
    h.provider
        .enqueue_evaluation("vendor", PartyEvaluation::rejected(json!({"round": 2})));

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Failed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(
        case.failure(),
        Some(&FailureReason::NegotiationExhausted { rounds: 2 })
    );
    assert_eq!(case.attempts().len(), 2);
    assert_eq!(case.round(), 2);
}

#[tokio::test]
async fn scenario_d_silent_provider_defaults_to_requested_changes() {
    let h = harness(HarnessOptions {
        round_deadline: Duration::from_millis(100),
        ..Default::default()
    });
    // The vendor's provider never answers in round 1.
    h.provider.enqueue_hang("vendor");

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    // The defaulted requested_changes conflicts at tolerance 0, mediation
    // runs, and round 2 reaches consensus.
    assert_eq!(state, CaseState::Completed);

    let case = h.engine.status(case_id).await.unwrap();
    let round_one = case.responses_for_round(1);
    assert_eq!(round_one.len(), 2);

    let customer = round_one
        .iter()
        .find(|r| r.party_id().as_str() == "customer")
        .unwrap();
    assert_eq!(customer.decision(), Decision::Approved);
    assert!(!customer.is_timeout_default());

    let vendor = round_one
        .iter()
        .find(|r| r.party_id().as_str() == "vendor")
        .unwrap();
    assert_eq!(vendor.decision(), Decision::RequestedChanges);
    assert!(vendor.is_timeout_default());
    let rationale = vendor.rationale()["system"].as_str().unwrap();
    assert!(rationale.contains("no response within"));
}

#[tokio::test]
async fn requested_changes_within_tolerance_reaches_consensus() {
    let h = harness(HarnessOptions {
        requested_changes_tolerance: 1,
        ..Default::default()
    });
    h.provider.enqueue_evaluation(
        "vendor",
        PartyEvaluation::requested_changes(json!({"summary": "minor wording"})),
    );

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Completed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.round(), 1);
    assert!(case.attempts().is_empty());
}

#[tokio::test]
async fn non_negotiable_rejection_fails_the_case_immediately() {
    let h = harness(HarnessOptions::default());
    h.provider.enqueue_evaluation(
        "vendor",
        PartyEvaluation::rejected(json!({"summary": "dealbreaker"})).with_non_negotiable(),
    );

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Failed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(
        case.failure(),
        Some(&FailureReason::NonNegotiableRejection {
            party_id: "vendor".to_string()
        })
    );
    // The round's responses are still recorded for the audit trail.
    assert_eq!(case.responses_for_round(1).len(), 2);
    assert!(case.attempts().is_empty());
}

#[tokio::test]
async fn mediator_outage_fails_the_case() {
    let h = harness(HarnessOptions::default());
    h.provider
        .enqueue_evaluation("vendor", PartyEvaluation::rejected(json!({})));
    // Both retry attempts fail.
    h.mediator.enqueue(Err(CapabilityError::unavailable("mediator down")));
    h.mediator.enqueue(Err(CapabilityError::unavailable("mediator down")));

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Failed);

    let case = h.engine.status(case_id).await.unwrap();
    assert!(matches!(
        case.failure(),
        Some(FailureReason::MediationUnavailable { .. })
    ));
    assert_eq!(h.mediator.calls(), 2);
}

// =============================================================================
// Review Gate and Finalization
// =============================================================================

fn liability_policy() -> ReviewPolicy {
    ReviewPolicy {
        always_require: false,
        flagged_terms: vec!["liability".to_string()],
        min_parties: 0,
        min_changes: 0,
    }
}

fn liability_change() -> Vec<ChangeItem> {
    vec![ChangeItem::new(
        "liability_cap",
        json!("USD 500k"),
        json!("USD 1M"),
    )]
}

#[tokio::test]
async fn flagged_change_passes_through_review_before_completion() {
    let h = harness(HarnessOptions {
        review_policy: liability_policy(),
        ..Default::default()
    });

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], liability_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Completed);
    assert_eq!(h.reviewer.calls(), 1);
    assert!(h.sink.has_transition_to("reviewing"));
}

#[tokio::test]
async fn review_happens_once_per_case_even_after_mediation_rounds() {
    let h = harness(HarnessOptions {
        review_policy: liability_policy(),
        ..Default::default()
    });
    h.provider
        .enqueue_evaluation("vendor", PartyEvaluation::rejected(json!({})));

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], liability_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Completed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.round(), 2);
    assert_eq!(h.reviewer.calls(), 1);
}

#[tokio::test]
async fn review_rejection_is_terminal_not_a_new_conflict() {
    let h = harness(HarnessOptions {
        review_policy: liability_policy(),
        ..Default::default()
    });
    h.reviewer.enqueue(Ok(ReviewVerdict::Rejected));

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], liability_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Failed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.failure(), Some(&FailureReason::ReviewRejected));
    // No mediation was triggered by the rejecting verdict.
    assert!(case.attempts().is_empty());
    assert_eq!(h.mediator.calls(), 0);
}

#[tokio::test]
async fn merge_failure_fails_the_case_with_the_merge_error() {
    let h = harness(HarnessOptions::default());
    h.merger
        .enqueue_failure(CapabilityError::failed("overlapping clause edits"));

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Failed);

    let case = h.engine.status(case_id).await.unwrap();
    match case.failure() {
        Some(FailureReason::MergeFailed { detail }) => {
            assert!(detail.contains("overlapping clause edits"));
        }
        other => panic!("expected MergeFailed, got {:?}", other),
    }
    assert!(case.artifact().is_none());
}

// =============================================================================
// Cancellation, Pause, and Concurrency
// =============================================================================

#[tokio::test]
async fn cancel_is_terminal_and_blocks_further_transitions() {
    let h = harness(HarnessOptions::default());
    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    h.engine.cancel(case_id, "superseded by a new draft").await.unwrap();

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.state(), &CaseState::Cancelled);
    assert_eq!(case.cancel_reason(), Some("superseded by a new draft"));

    // Running a cancelled case does not advance it.
    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Cancelled);
    assert!(case.responses().is_empty());

    // A second cancel and a pause are both rejected.
    assert!(matches!(
        h.engine.cancel(case_id, "again").await,
        Err(EngineError::AlreadyTerminal { .. })
    ));
    assert!(matches!(
        h.engine.pause(case_id).await,
        Err(EngineError::AlreadyTerminal { .. })
    ));
}

#[tokio::test]
async fn cancel_during_fan_out_lands_at_the_commit_boundary() {
    let h = harness(HarnessOptions {
        round_deadline: Duration::from_millis(300),
        ..Default::default()
    });
    // The vendor's provider stays silent, holding the round open until
    // the deadline.
    h.provider.enqueue_hang("vendor");

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let engine = h.engine.clone();
    let runner = tokio::spawn(async move { engine.run(case_id).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    h.engine.cancel(case_id, "operator abort").await.unwrap();

    // The in-flight run observes the cancel at its next commit and stops;
    // its fan-out results are discarded.
    let state = runner.await.unwrap().unwrap();
    assert_eq!(state, CaseState::Cancelled);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.state(), &CaseState::Cancelled);
    assert!(case.responses_for_round(1).is_empty());
}

#[tokio::test]
async fn concurrent_run_on_the_same_case_is_rejected() {
    let h = harness(HarnessOptions {
        round_deadline: Duration::from_millis(300),
        ..Default::default()
    });
    h.provider.enqueue_hang("vendor");

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let engine = h.engine.clone();
    let runner = tokio::spawn(async move { engine.run(case_id).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = h.engine.run(case_id).await;
    assert!(matches!(
        second,
        Err(EngineError::AdvanceInProgress { .. })
    ));

    // Round 2 after mediation: the vendor's script is exhausted, so it
    // approves and the first run finishes.
    let state = runner.await.unwrap().unwrap();
    assert_eq!(state, CaseState::Completed);
}

#[tokio::test]
async fn pause_during_fan_out_discards_the_interrupted_round() {
    let h = harness(HarnessOptions {
        round_deadline: Duration::from_millis(300),
        ..Default::default()
    });
    h.provider.enqueue_hang("vendor");

    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    let engine = h.engine.clone();
    let runner = tokio::spawn(async move { engine.run(case_id).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    h.engine.pause(case_id).await.unwrap();
    let state = runner.await.unwrap().unwrap();
    assert!(state.is_paused());

    // Nothing from the interrupted round was committed.
    let case = h.engine.status(case_id).await.unwrap();
    assert!(case.responses_for_round(1).is_empty());

    // Resume re-enters evaluating and re-issues the fan-out fresh; the
    // vendor's script is spent, so the round completes unanimously.
    let resumed_to = h.engine.resume(case_id).await.unwrap();
    assert_eq!(resumed_to, CaseState::Evaluating);

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Completed);

    // Exactly one response per party per round, no duplicates.
    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.responses_for_round(1).len(), 2);
    assert_eq!(case.responses().len(), 2);
    assert_eq!(case.round(), 1);
}

#[tokio::test]
async fn pause_before_run_and_resume_completes_without_duplicates() {
    let h = harness(HarnessOptions::default());
    let case_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();

    h.engine.pause(case_id).await.unwrap();

    // A paused case does not advance.
    let state = h.engine.run(case_id).await.unwrap();
    assert!(state.is_paused());

    let resumed_to = h.engine.resume(case_id).await.unwrap();
    assert_eq!(resumed_to, CaseState::Initiated);

    let state = h.engine.run(case_id).await.unwrap();
    assert_eq!(state, CaseState::Completed);

    let case = h.engine.status(case_id).await.unwrap();
    assert_eq!(case.responses_for_round(1).len(), 2);
}

#[tokio::test]
async fn list_filters_cases_by_state() {
    let h = harness(HarnessOptions::default());
    let completed_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();
    h.engine.run(completed_id).await.unwrap();

    let cancelled_id = h
        .engine
        .initiate(definition(&["customer", "vendor"], payment_terms_change()))
        .await
        .unwrap();
    h.engine.cancel(cancelled_id, "abandoned").await.unwrap();

    let completed = h
        .engine
        .list(&accord::ports::CaseFilter::any().with_state("completed"))
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id(), completed_id);

    let all = h.engine.list(&accord::ports::CaseFilter::any()).await.unwrap();
    assert_eq!(all.len(), 2);
}
