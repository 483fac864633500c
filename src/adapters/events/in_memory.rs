//! In-memory event sink for testing.
//!
//! Captures emitted events for assertions. Not for production use; the
//! real-time distribution layer owns delivery there.
//!
//! # Panics
//!
//! Methods panic if the internal lock is poisoned.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{CaseId, WorkflowEvent};
use crate::ports::{EventSink, SinkError};

/// Capturing event sink for tests.
///
/// # Example
///
/// ```ignore
/// let sink = Arc::new(InMemoryEventSink::new());
/// engine_with(sink.clone()).run(case_id).await?;
/// assert!(sink.has_transition_to("completed"));
/// ```
pub struct InMemoryEventSink {
    events: RwLock<Vec<WorkflowEvent>>,
}

impl InMemoryEventSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    // === Test Helpers ===

    /// Returns all captured events in emission order.
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events
            .read()
            .expect("InMemoryEventSink: lock poisoned")
            .clone()
    }

    /// Returns the events for one case, in emission order.
    pub fn events_for_case(&self, case_id: CaseId) -> Vec<WorkflowEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.case_id == case_id)
            .collect()
    }

    /// Returns the number of captured events.
    pub fn event_count(&self) -> usize {
        self.events
            .read()
            .expect("InMemoryEventSink: lock poisoned")
            .len()
    }

    /// Checks whether any event transitioned into the named state.
    pub fn has_transition_to(&self, state_name: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.state_after.name() == state_name)
    }

    /// Clears captured events (for test isolation).
    pub fn clear(&self) {
        self.events
            .write()
            .expect("InMemoryEventSink: lock poisoned")
            .clear();
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn emit(&self, event: WorkflowEvent) -> Result<(), SinkError> {
        self.events
            .write()
            .expect("InMemoryEventSink: lock poisoned")
            .push(event);
        Ok(())
    }
}
