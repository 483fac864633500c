//! Conflict module - Pure detection of disagreement within a round.

mod detector;

pub use detector::{assess, Conflict, ConflictAssessment, Dissent};
