//! In-memory case registry.
//!
//! Per-case optimistic commits over a process-local map. Cross-case access
//! is fully parallel (one RwLock held only for map operations, never
//! across awaits); per-case serialization comes from the commit's state
//! check, exactly as the port contract requires. A durable registry would
//! implement the same contract against real storage.
//!
//! # Panics
//!
//! Methods panic if the internal lock is poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::case::Case;
use crate::domain::foundation::{CaseId, CaseState};
use crate::ports::{CaseFilter, CaseRegistry, RegistryError};

/// Process-local case registry.
pub struct InMemoryCaseRegistry {
    cases: RwLock<HashMap<CaseId, Case>>,
}

impl InMemoryCaseRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            cases: RwLock::new(HashMap::new()),
        }
    }

    // === Test Helpers ===

    /// Returns the number of stored cases.
    pub fn case_count(&self) -> usize {
        self.cases
            .read()
            .expect("InMemoryCaseRegistry: lock poisoned")
            .len()
    }
}

impl Default for InMemoryCaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaseRegistry for InMemoryCaseRegistry {
    async fn create(&self, case: Case) -> Result<(), RegistryError> {
        let mut cases = self
            .cases
            .write()
            .expect("InMemoryCaseRegistry: lock poisoned");
        let case_id = case.id();
        if cases.contains_key(&case_id) {
            return Err(RegistryError::AlreadyExists { case_id });
        }
        cases.insert(case_id, case);
        Ok(())
    }

    async fn load(&self, case_id: CaseId) -> Result<Case, RegistryError> {
        self.cases
            .read()
            .expect("InMemoryCaseRegistry: lock poisoned")
            .get(&case_id)
            .cloned()
            .ok_or(RegistryError::NotFound { case_id })
    }

    async fn commit(
        &self,
        case_id: CaseId,
        expected_prior_state: &CaseState,
        case: Case,
    ) -> Result<(), RegistryError> {
        let mut cases = self
            .cases
            .write()
            .expect("InMemoryCaseRegistry: lock poisoned");
        let stored = cases
            .get(&case_id)
            .ok_or(RegistryError::NotFound { case_id })?;

        if stored.state() != expected_prior_state {
            return Err(RegistryError::StateConflict {
                case_id,
                expected: expected_prior_state.name().to_string(),
                actual: stored.state().name().to_string(),
            });
        }

        cases.insert(case_id, case);
        Ok(())
    }

    async fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, RegistryError> {
        let cases = self
            .cases
            .read()
            .expect("InMemoryCaseRegistry: lock poisoned");
        Ok(cases
            .values()
            .filter(|case| filter.matches(case))
            .cloned()
            .collect())
    }
}
