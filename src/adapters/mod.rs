//! Adapters - Concrete implementations of the ports.

mod capabilities;
mod events;
mod registry;

pub use capabilities::{
    RemoteCapabilityClient, ScriptedDecisionProvider, ScriptedMediator, ScriptedMerger,
    ScriptedOutcome, ScriptedReviewer,
};
pub use events::{InMemoryEventSink, TracingEventSink};
pub use registry::InMemoryCaseRegistry;
