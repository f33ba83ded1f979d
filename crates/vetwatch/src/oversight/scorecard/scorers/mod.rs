//! Pure scoring functions: failure-weighted performance, absence-aware
//! integrity, and representative oversight effectiveness.
//!
//! Scorers never touch storage. The service gathers inputs, calls in here,
//! and persists the results, so every formula stays unit-testable on plain
//! values.

mod config;
pub mod integrity;
pub mod performance;
pub mod representative;

pub use config::{RepresentativeWeights, ScoringConfig};
pub use representative::EntityScoreFacts;

use super::domain::IssueTag;

/// Computation failures shared across the scorers.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScoreError {
    #[error("issue tag {0} has no severity weight configured")]
    UnknownIssueTag(IssueTag),
    #[error("no scored children available to aggregate")]
    InsufficientData,
    #[error("representative oversees no entities")]
    EmptyJurisdiction,
}
