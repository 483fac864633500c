//! Case aggregate - The root entity for amendment workflows.
//!
//! A Case owns the full record of one amendment negotiation: the proposed
//! change set and its per-round history, the fixed party list, every
//! recorded response and mediation attempt, and the lifecycle state. The
//! orchestration engine is the only writer; all state changes go through
//! the guarded transition methods here.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CaseId, CaseState, ContractRef, FailureReason, Timestamp, TransitionError, ValidationError,
};

use super::{ChangeDelta, ChangeSet, NegotiationAttempt, Party, PartyResponse};

/// Reference to the consolidated artifact produced on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Locator for the merged document.
    pub reference: String,
    /// Content hash of the merged document.
    pub content_hash: String,
    /// When the merge completed.
    pub merged_at: Timestamp,
}

impl ArtifactRef {
    /// Creates an artifact reference stamped with the current time.
    pub fn new(reference: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            content_hash: content_hash.into(),
            merged_at: Timestamp::now(),
        }
    }
}

/// Input for creating a case. Validated by [`Case::new`].
#[derive(Debug, Clone)]
pub struct CaseDefinition {
    /// Subject document under amendment.
    pub contract: ContractRef,
    /// Initial proposed change set.
    pub changes: ChangeSet,
    /// Parties whose Decision Providers must evaluate the changes.
    pub parties: Vec<Party>,
    /// Optional overall deadline for the case.
    pub deadline: Option<Timestamp>,
}

/// Snapshot of a superseded change set, kept so prior rounds' proposals
/// remain retrievable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundChanges {
    /// Round the snapshot was current for.
    pub round: u32,
    /// The proposed changes as evaluated in that round.
    pub changes: ChangeSet,
}

/// The Case aggregate root.
#[derive(Debug, Clone)]
pub struct Case {
    id: CaseId,
    contract: ContractRef,
    proposed_changes: ChangeSet,
    change_history: Vec<RoundChanges>,
    parties: Vec<Party>,
    state: CaseState,
    round: u32,
    deadline: Option<Timestamp>,
    responses: Vec<PartyResponse>,
    attempts: Vec<NegotiationAttempt>,
    failure: Option<FailureReason>,
    cancel_reason: Option<String>,
    artifact: Option<ArtifactRef>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Case {
    /// Creates a new case from a definition.
    ///
    /// Validates:
    /// 1. At least one party
    /// 2. At least one proposed change
    /// 3. No duplicate party identifiers
    pub fn new(definition: CaseDefinition) -> Result<Self, ValidationError> {
        if definition.parties.is_empty() {
            return Err(ValidationError::NoParties);
        }
        if definition.changes.is_empty() {
            return Err(ValidationError::NoChanges);
        }
        for (index, party) in definition.parties.iter().enumerate() {
            if definition.parties[..index]
                .iter()
                .any(|p| p.id() == party.id())
            {
                return Err(ValidationError::duplicate_party(party.id().as_str()));
            }
        }

        let now = Timestamp::now();
        Ok(Self {
            id: CaseId::new(),
            contract: definition.contract,
            proposed_changes: definition.changes,
            change_history: Vec::new(),
            parties: definition.parties,
            state: CaseState::Initiated,
            round: 1,
            deadline: definition.deadline,
            responses: Vec::new(),
            attempts: Vec::new(),
            failure: None,
            cancel_reason: None,
            artifact: None,
            created_at: now,
            updated_at: now,
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    /// Returns the case ID.
    pub fn id(&self) -> CaseId {
        self.id
    }

    /// Returns the subject document reference.
    pub fn contract(&self) -> &ContractRef {
        &self.contract
    }

    /// Returns the change set currently under evaluation.
    pub fn proposed_changes(&self) -> &ChangeSet {
        &self.proposed_changes
    }

    /// Returns snapshots of superseded change sets, oldest first.
    pub fn change_history(&self) -> &[RoundChanges] {
        &self.change_history
    }

    /// Returns the fixed party list.
    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> &CaseState {
        &self.state
    }

    /// Returns the current round number (starts at 1, only increases).
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Returns the optional case deadline.
    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    /// Returns all recorded responses, in recording order.
    pub fn responses(&self) -> &[PartyResponse] {
        &self.responses
    }

    /// Returns the responses recorded for a specific round.
    pub fn responses_for_round(&self, round: u32) -> Vec<PartyResponse> {
        self.responses
            .iter()
            .filter(|r| r.round() == round)
            .cloned()
            .collect()
    }

    /// Returns all negotiation attempts, in recording order.
    pub fn attempts(&self) -> &[NegotiationAttempt] {
        &self.attempts
    }

    /// Returns the terminal failure reason, if the case failed.
    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    /// Returns the operator cancellation reason, if cancelled.
    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    /// Returns the final artifact reference, set only on terminal success.
    pub fn artifact(&self) -> Option<&ArtifactRef> {
        self.artifact.as_ref()
    }

    /// Returns when the case was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the case was last updated.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the case deadline exists and has passed.
    pub fn deadline_expired(&self, now: &Timestamp) -> bool {
        self.deadline.is_some_and(|deadline| now.is_after(&deadline))
    }

    // ───────────────────────────────────────────────────────────────
    // State Transitions
    // ───────────────────────────────────────────────────────────────

    /// Moves the case to `to`, rejecting edges outside the state machine.
    pub fn transition_to(&mut self, to: CaseState) -> Result<(), TransitionError> {
        if !self.state.can_transition(&to) {
            return Err(TransitionError::new(self.state.clone(), to));
        }
        self.state = to;
        self.touch();
        Ok(())
    }

    /// Terminally fails the case, recording the reason.
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), TransitionError> {
        self.transition_to(CaseState::Failed)?;
        self.failure = Some(reason);
        Ok(())
    }

    /// Terminally cancels the case, recording the operator reason.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.transition_to(CaseState::Cancelled)?;
        self.cancel_reason = Some(reason.into());
        Ok(())
    }

    /// Pauses the case, remembering the interrupted state.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        let resume_to = Box::new(self.state.clone());
        self.transition_to(CaseState::Paused { resume_to })
    }

    /// Resumes a paused case, returning the re-entered state.
    pub fn resume(&mut self) -> Result<CaseState, TransitionError> {
        let target = match &self.state {
            CaseState::Paused { resume_to } => resume_to.as_ref().clone(),
            other => return Err(TransitionError::new(other.clone(), other.clone())),
        };
        self.transition_to(target.clone())?;
        Ok(target)
    }

    // ───────────────────────────────────────────────────────────────
    // Round Bookkeeping
    // ───────────────────────────────────────────────────────────────

    /// Records the complete response set for the current round.
    ///
    /// A re-issued round (after pause/resume) supersedes any responses the
    /// interrupted attempt left for the same round; responses for completed
    /// rounds are never touched, since a completed round is never
    /// re-entered.
    pub fn record_round_responses(&mut self, responses: Vec<PartyResponse>) {
        let round = self.round;
        debug_assert!(responses.iter().all(|r| r.round() == round));
        self.responses.retain(|r| r.round() != round);
        self.responses.extend(responses);
        self.touch();
    }

    /// Records a completed mediation cycle.
    pub fn record_attempt(&mut self, attempt: NegotiationAttempt) {
        self.attempts.push(attempt);
        self.touch();
    }

    /// Applies a compromise delta, snapshotting the superseded change set.
    pub fn apply_compromise(&mut self, delta: &ChangeDelta) {
        self.change_history.push(RoundChanges {
            round: self.round,
            changes: self.proposed_changes.clone(),
        });
        self.proposed_changes = self.proposed_changes.apply(delta);
        self.touch();
    }

    /// Advances to the next evaluation round. The counter only increases.
    pub fn begin_next_round(&mut self) {
        self.round += 1;
        self.touch();
    }

    /// Records the consolidated artifact.
    pub fn set_artifact(&mut self, artifact: ArtifactRef) {
        self.artifact = Some(artifact);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
