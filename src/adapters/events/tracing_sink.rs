//! Event sink that logs transitions via tracing.
//!
//! Useful as the default sink when no distribution layer is attached: the
//! audit feed lands in the process logs.

use async_trait::async_trait;

use crate::domain::foundation::WorkflowEvent;
use crate::ports::{EventSink, SinkError};

/// Logs every committed transition at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    /// Creates the sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: WorkflowEvent) -> Result<(), SinkError> {
        tracing::info!(
            event_id = %event.event_id,
            case_id = %event.case_id,
            from = %event.state_before,
            to = %event.state_after,
            stage = %event.triggered_by,
            summary = %event.summary,
            "workflow event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CaseId, CaseState, WorkflowStage};
    use serde_json::json;

    #[tokio::test]
    async fn emit_never_fails() {
        let sink = TracingEventSink::new();
        let event = WorkflowEvent::new(
            CaseId::new(),
            CaseState::Initiated,
            CaseState::Evaluating,
            WorkflowStage::Engine,
            json!({"round": 1}),
        );
        assert!(sink.emit(event).await.is_ok());
    }
}
