//! Accountability scorecard engine.
//!
//! The engine keeps three concerns apart: the containment hierarchy and the
//! append-only integrity ledger (`hierarchy`), the pure scoring formulas
//! (`scorers`), and versioned scorecard storage (`repository`). The service
//! composes them behind one facade and the router exposes that facade over
//! HTTP.

pub mod domain;
pub mod hierarchy;
pub mod report;
pub mod repository;
pub mod router;
pub mod scorers;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Entity, EntityId, EntityKind, EventId, Freshness, IntegrityEvent, IntegrityEventDraft,
    IssueTag, Representative, RepresentativeId,
};
pub use report::{OversightInsights, OversightLevel, OversightSummary};
pub use repository::{
    AlertError, AlertPublisher, CriticalConditionAlert, RepositoryError, RepresentativeScoreView,
    ScorecardRecord, ScorecardRepository, ScorecardView,
};
pub use router::scorecard_router;
pub use scorers::{EntityScoreFacts, RepresentativeWeights, ScoreError, ScoringConfig};
pub use service::{
    EngineError, RecomputeOutcome, RefreshedEntity, ScorecardService, SkippedEntity,
};
