//! Finalizer.
//!
//! Consolidates the accepted change set into the final artifact via the
//! external merge capability. The merge runs once; its outcome moves the
//! case to `completed` or `failed`, never anything in between.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::case::{ArtifactRef, Case};
use crate::domain::foundation::FailureReason;
use crate::ports::{CapabilityError, Merger};

use super::RetryPolicy;

/// Consolidation step for terminal success.
pub struct Finalizer {
    merger: Arc<dyn Merger>,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl Finalizer {
    /// Creates a finalizer.
    pub fn new(merger: Arc<dyn Merger>, retry: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            merger,
            retry,
            call_timeout,
        }
    }

    /// Merges the case's accepted changes into the final artifact.
    ///
    /// Transient merge errors are retried; a reported merge failure or an
    /// exhausted budget is fatal (`MergeFailed`).
    pub async fn consolidate(&self, case: &Case) -> Result<ArtifactRef, FailureReason> {
        let artifact = self
            .retry
            .run(|| async {
                match timeout(
                    self.call_timeout,
                    self.merger.merge(case.contract(), case.proposed_changes()),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(CapabilityError::timeout(self.call_timeout.as_secs())),
                }
            })
            .await
            .map_err(|err| FailureReason::merge_failed(err.to_string()))?;

        tracing::info!(
            case_id = %case.id(),
            artifact = %artifact.reference,
            "accepted changes consolidated"
        );
        Ok(artifact)
    }
}
