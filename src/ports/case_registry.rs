//! CaseRegistry port - Interface for case storage and retrieval.
//!
//! The registry is the only shared mutable resource in the system. It
//! guarantees that a read following an acknowledged commit observes that
//! commit (no stale reads), and it guards against double-advance with an
//! optimistic state check on every commit.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::case::Case;
use crate::domain::foundation::{CaseId, CaseState, ContractRef};

use super::CapabilityError;

/// Errors from case storage operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A case with this id already exists.
    #[error("case '{case_id}' already exists")]
    AlreadyExists { case_id: CaseId },

    /// No case with this id.
    #[error("case '{case_id}' not found")]
    NotFound { case_id: CaseId },

    /// The optimistic commit check failed: the stored state no longer
    /// matches what the caller observed. The caller must reload and
    /// retry; the registry never silently overwrites.
    #[error("state conflict on case '{case_id}': expected '{expected}', found '{actual}'")]
    StateConflict {
        case_id: CaseId,
        expected: String,
        actual: String,
    },

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<CapabilityError> for RegistryError {
    fn from(err: CapabilityError) -> Self {
        RegistryError::Storage(err.to_string())
    }
}

/// Filter for listing cases.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    /// Match only cases in one of these states (by state name). Empty
    /// means any state.
    pub states: Vec<String>,
    /// Match only cases for this subject document.
    pub contract: Option<ContractRef>,
}

impl CaseFilter {
    /// Matches everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restricts the filter to a state name.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.states.push(state.into());
        self
    }

    /// Restricts the filter to a subject document.
    pub fn with_contract(mut self, contract: ContractRef) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Returns true if the case matches this filter.
    pub fn matches(&self, case: &Case) -> bool {
        if !self.states.is_empty() && !self.states.iter().any(|s| s == case.state().name()) {
            return false;
        }
        if let Some(contract) = &self.contract {
            if contract != case.contract() {
                return false;
            }
        }
        true
    }
}

/// Port for case storage.
///
/// Implementations must ensure:
/// - `load` after an acknowledged `commit` observes that commit
/// - `commit` rejects with `StateConflict` when `expected_prior_state`
///   does not match the stored state (per-case serialization guard)
/// - cross-case operations are fully parallel; there is no global lock
#[async_trait]
pub trait CaseRegistry: Send + Sync {
    /// Stores a newly created case.
    async fn create(&self, case: Case) -> Result<(), RegistryError>;

    /// Loads the latest committed snapshot of a case.
    async fn load(&self, case_id: CaseId) -> Result<Case, RegistryError>;

    /// Commits a transitioned case, guarded by the state the caller
    /// observed before transitioning.
    async fn commit(
        &self,
        case_id: CaseId,
        expected_prior_state: &CaseState,
        case: Case,
    ) -> Result<(), RegistryError>;

    /// Lists cases matching the filter.
    async fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, RegistryError>;
}
