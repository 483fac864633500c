//! Workflow event types for the audit feed.
//!
//! The engine emits one [`WorkflowEvent`] per committed state transition.
//! Events are append-only and delivered at-least-once; consumers dedupe by
//! `event_id` or by `(case_id, state_after, occurred_at)`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::{CaseId, CaseState, EventId, Timestamp};

/// Component that triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// The orchestration engine itself (structural transitions).
    Engine,
    /// The decision fan-out coordinator.
    FanOut,
    /// The conflict detector.
    ConflictDetector,
    /// The negotiation loop controller.
    Negotiation,
    /// The review gate.
    ReviewGate,
    /// The finalizer.
    Finalizer,
    /// An operator action (initiate, cancel, pause, resume).
    Operator,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStage::Engine => "engine",
            WorkflowStage::FanOut => "fan_out",
            WorkflowStage::ConflictDetector => "conflict_detector",
            WorkflowStage::Negotiation => "negotiation",
            WorkflowStage::ReviewGate => "review_gate",
            WorkflowStage::Finalizer => "finalizer",
            WorkflowStage::Operator => "operator",
        };
        write!(f, "{}", s)
    }
}

/// Append-only audit record of one committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// Unique event instance id (deduplication key).
    pub event_id: EventId,
    /// Case the transition belongs to.
    pub case_id: CaseId,
    /// State before the transition committed.
    pub state_before: CaseState,
    /// State after the transition committed.
    pub state_after: CaseState,
    /// Component that drove the transition.
    pub triggered_by: WorkflowStage,
    /// When the transition was committed.
    pub occurred_at: Timestamp,
    /// Free-form payload summary (round numbers, decisions, reasons).
    pub summary: JsonValue,
}

impl WorkflowEvent {
    /// Creates a new event for a committed transition.
    pub fn new(
        case_id: CaseId,
        state_before: CaseState,
        state_after: CaseState,
        triggered_by: WorkflowStage,
        summary: JsonValue,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            case_id,
            state_before,
            state_after,
            triggered_by,
            occurred_at: Timestamp::now(),
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_captures_transition_context() {
        let case_id = CaseId::new();
        let event = WorkflowEvent::new(
            case_id,
            CaseState::Evaluating,
            CaseState::ConflictDetected,
            WorkflowStage::ConflictDetector,
            json!({"round": 1, "disagreeing": 1}),
        );

        assert_eq!(event.case_id, case_id);
        assert_eq!(event.state_before, CaseState::Evaluating);
        assert_eq!(event.state_after, CaseState::ConflictDetected);
        assert_eq!(event.triggered_by, WorkflowStage::ConflictDetector);
        assert_eq!(event.summary["round"], 1);
    }

    #[test]
    fn events_have_unique_ids() {
        let case_id = CaseId::new();
        let make = || {
            WorkflowEvent::new(
                case_id,
                CaseState::Initiated,
                CaseState::Evaluating,
                WorkflowStage::Engine,
                json!({}),
            )
        };
        assert_ne!(make().event_id, make().event_id);
    }

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&WorkflowStage::FanOut).unwrap();
        assert_eq!(json, "\"fan_out\"");

        let json = serde_json::to_string(&WorkflowStage::ReviewGate).unwrap();
        assert_eq!(json, "\"review_gate\"");
    }

    #[test]
    fn stage_display_matches_serialization() {
        assert_eq!(format!("{}", WorkflowStage::ConflictDetector), "conflict_detector");
        assert_eq!(format!("{}", WorkflowStage::Operator), "operator");
    }

    #[test]
    fn event_serializes_to_json() {
        let event = WorkflowEvent::new(
            CaseId::new(),
            CaseState::Finalizing,
            CaseState::Completed,
            WorkflowStage::Finalizer,
            json!({"artifact": "artifact://msa-2026/v2"}),
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["state_before"], "finalizing");
        assert_eq!(value["state_after"], "completed");
        assert_eq!(value["triggered_by"], "finalizer");
    }
}
