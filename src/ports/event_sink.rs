//! EventSink port - Interface for the real-time progress feed.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::WorkflowEvent;

/// Failure to hand an event to the distribution layer.
#[derive(Debug, Clone, Error)]
#[error("event sink failure: {0}")]
pub struct SinkError(pub String);

/// Port for emitting workflow events.
///
/// The engine emits exactly one event per committed transition, in commit
/// order per case. Delivery is at-least-once: after a crash between commit
/// and emission the engine re-emits from the last committed state, so
/// consumers must tolerate duplicates or dedupe by `event_id`.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits one workflow event.
    async fn emit(&self, event: WorkflowEvent) -> Result<(), SinkError>;
}
