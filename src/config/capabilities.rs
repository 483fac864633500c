//! External capability call configuration.
//!
//! Every external call carries its own configured timeout; there is no
//! single global value.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timeouts and retry budget for external capability calls.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilitySettings {
    /// Per-round deadline for a party's whole evaluation, retries included.
    #[serde(default = "default_evaluation_round_secs")]
    pub evaluation_round_secs: u64,

    /// Per-attempt timeout for mediation calls.
    #[serde(default = "default_mediation_timeout_secs")]
    pub mediation_timeout_secs: u64,

    /// Per-attempt timeout for specialized review calls.
    #[serde(default = "default_review_timeout_secs")]
    pub review_timeout_secs: u64,

    /// Per-attempt timeout for merge calls.
    #[serde(default = "default_merge_timeout_secs")]
    pub merge_timeout_secs: u64,

    /// Attempt budget for transient capability failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds; doubles per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl CapabilitySettings {
    /// Per-round evaluation deadline as a Duration.
    pub fn evaluation_round(&self) -> Duration {
        Duration::from_secs(self.evaluation_round_secs)
    }

    /// Mediation call timeout as a Duration.
    pub fn mediation_timeout(&self) -> Duration {
        Duration::from_secs(self.mediation_timeout_secs)
    }

    /// Review call timeout as a Duration.
    pub fn review_timeout(&self) -> Duration {
        Duration::from_secs(self.review_timeout_secs)
    }

    /// Merge call timeout as a Duration.
    pub fn merge_timeout(&self) -> Duration {
        Duration::from_secs(self.merge_timeout_secs)
    }

    /// Retry backoff base as a Duration.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate capability settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.evaluation_round_secs == 0 {
            return Err(ValidationError::invalid_value(
                "capabilities.evaluation_round_secs",
                "must be at least 1",
            ));
        }
        if self.max_retries == 0 {
            return Err(ValidationError::invalid_value(
                "capabilities.max_retries",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for CapabilitySettings {
    fn default() -> Self {
        Self {
            evaluation_round_secs: default_evaluation_round_secs(),
            mediation_timeout_secs: default_mediation_timeout_secs(),
            review_timeout_secs: default_review_timeout_secs(),
            merge_timeout_secs: default_merge_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_evaluation_round_secs() -> u64 {
    120
}

fn default_mediation_timeout_secs() -> u64 {
    90
}

fn default_review_timeout_secs() -> u64 {
    60
}

fn default_merge_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    250
}
