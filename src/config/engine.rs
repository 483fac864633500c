//! Engine configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Workflow engine limits.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Maximum evaluation rounds before the case fails with
    /// `NegotiationExhausted`.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// How many `requested_changes` responses still count as agreement
    /// when no party rejected.
    #[serde(default = "default_tolerance")]
    pub requested_changes_tolerance: u32,
}

impl EngineSettings {
    /// Validate engine settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_rounds == 0 {
            return Err(ValidationError::invalid_value(
                "engine.max_rounds",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            requested_changes_tolerance: default_tolerance(),
        }
    }
}

fn default_max_rounds() -> u32 {
    5
}

fn default_tolerance() -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = EngineSettings::default();
        assert_eq!(settings.max_rounds, 5);
        assert_eq!(settings.requested_changes_tolerance, 0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let settings = EngineSettings {
            max_rounds: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
