//! Merger port - Interface to the external document merge capability.

use async_trait::async_trait;

use crate::domain::case::{ArtifactRef, ChangeSet};
use crate::domain::foundation::ContractRef;

use super::CapabilityError;

/// Port for consolidating accepted changes into the final artifact.
///
/// Invoked exactly once per case by the finalizer. The merge algorithm
/// itself is out of scope; the contract is: accepted changes in, merged
/// artifact or reported failure out.
#[async_trait]
pub trait Merger: Send + Sync {
    /// Merges the accepted change set into the subject document.
    async fn merge(
        &self,
        contract: &ContractRef,
        accepted: &ChangeSet,
    ) -> Result<ArtifactRef, CapabilityError>;
}
