//! Shared error type for external capability calls.

use thiserror::Error;

/// Errors returned by external capabilities (Decision Providers, mediation,
/// review, merge).
///
/// The retryable variants are absorbed by the engine's bounded retry
/// policy; only after the budget is exhausted do they surface, at which
/// point the owning component converts them into the appropriate case
/// outcome (timeout default, terminal failure reason).
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// The call did not complete within the configured timeout.
    #[error("capability call timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// The capability is temporarily unavailable.
    #[error("capability unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// The capability rate limited the caller.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Network error during the call.
    #[error("network error: {0}")]
    Network(String),

    /// The capability's response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The request was rejected as invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The capability ran and reported a definitive failure (e.g. the
    /// merge capability could not consolidate overlapping edits).
    /// Retrying will not change the outcome.
    #[error("capability reported failure: {0}")]
    Failed(String),
}

impl CapabilityError {
    /// Creates a timeout error.
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a reported failure error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns true if a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CapabilityError::Timeout { .. }
                | CapabilityError::Unavailable { .. }
                | CapabilityError::RateLimited { .. }
                | CapabilityError::Network(_)
        )
    }
}
