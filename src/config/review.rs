//! Review gate criterion configuration.

use serde::Deserialize;

use crate::application::ReviewPolicy;

/// Configured criterion for the specialized review gate.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSettings {
    /// Review every case regardless of content.
    #[serde(default)]
    pub always_require: bool,

    /// Terms that flag a change item for review.
    #[serde(default = "default_flagged_terms")]
    pub flagged_terms: Vec<String>,

    /// Party count threshold for complexity review (zero disables).
    #[serde(default = "default_min_parties")]
    pub min_parties: usize,

    /// Change count threshold for complexity review (zero disables).
    #[serde(default = "default_min_changes")]
    pub min_changes: usize,
}

impl ReviewSettings {
    /// Builds the runtime review policy.
    pub fn to_policy(&self) -> ReviewPolicy {
        ReviewPolicy {
            always_require: self.always_require,
            flagged_terms: self.flagged_terms.clone(),
            min_parties: self.min_parties,
            min_changes: self.min_changes,
        }
    }
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            always_require: false,
            flagged_terms: default_flagged_terms(),
            min_parties: default_min_parties(),
            min_changes: default_min_changes(),
        }
    }
}

fn default_flagged_terms() -> Vec<String> {
    [
        "liability",
        "indemnification",
        "termination",
        "intellectual property",
        "confidentiality",
        "non-compete",
        "arbitration",
        "governing law",
        "force majeure",
        "warranty",
        "damages",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_min_parties() -> usize {
    3
}

fn default_min_changes() -> usize {
    3
}
