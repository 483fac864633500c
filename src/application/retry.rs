//! Bounded retry with exponential backoff for capability calls.
//!
//! Transient errors are fully absorbed here; only after the attempt budget
//! is exhausted does the last error surface to the caller, which converts
//! it into the appropriate case outcome.

use std::future::Future;
use std::time::Duration;

use crate::ports::CapabilityError;

/// Bounded retry policy shared by all capability callers.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and base delay.
    ///
    /// The delay doubles after each failed attempt. `max_attempts` is
    /// clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff delay after the given attempt (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Runs the operation, retrying retryable errors until the budget is
    /// exhausted. Non-retryable errors return immediately.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, CapabilityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CapabilityError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "capability call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
