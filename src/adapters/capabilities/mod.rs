//! Capability adapters.
//!
//! `RemoteCapabilityClient` talks to a capability service over HTTP;
//! the scripted adapters provide deterministic behavior for tests and
//! demos.

mod http;
mod scripted;

pub use http::RemoteCapabilityClient;
pub use scripted::{
    ScriptedDecisionProvider, ScriptedMediator, ScriptedMerger, ScriptedOutcome, ScriptedReviewer,
};
