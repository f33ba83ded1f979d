//! Scorecard storage contract and read projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{EntityId, EntityKind, Freshness, RepresentativeId};

/// Stored scoring snapshot for one entity, versioned for optimistic writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardRecord {
    pub entity_id: EntityId,
    pub performance_score: Option<f64>,
    pub integrity_score: Option<f64>,
    /// Deduplicated performance issue categories contributing to the score.
    pub issues: Vec<String>,
    /// Deduplicated integrity event categories on record.
    pub integrity_issues: Vec<String>,
    /// Human-readable account of how the published numbers were derived.
    pub formula_explanation: String,
    /// `None` until the first successful recompute.
    pub last_computed_at: Option<DateTime<Utc>>,
    pub freshness: Freshness,
    /// Bumped only on the transition to `Fresh`; staleness marks leave it
    /// alone.
    pub version: u64,
    /// Set while the performance score sits below the critical threshold.
    pub critical_since: Option<DateTime<Utc>>,
}

impl ScorecardRecord {
    /// Placeholder for an entity that has never been computed.
    pub fn placeholder(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            performance_score: None,
            integrity_score: None,
            issues: Vec::new(),
            integrity_issues: Vec::new(),
            formula_explanation: String::new(),
            last_computed_at: None,
            freshness: Freshness::Stale,
            version: 0,
            critical_since: None,
        }
    }

    /// Public read projection with rendering hints for the portal.
    pub fn status_view(&self, name: &str, kind: EntityKind) -> ScorecardView {
        ScorecardView {
            entity_id: self.entity_id.clone(),
            entity_name: name.to_string(),
            kind,
            kind_label: kind.label(),
            performance_score: self.performance_score,
            performance_display: self.score_display(self.performance_score),
            integrity_score: self.integrity_score,
            integrity_display: self.score_display(self.integrity_score),
            issues: self.issues.clone(),
            integrity_issues: self.integrity_issues.clone(),
            formula_explanation: self.formula_explanation.clone(),
            last_computed_at: self.last_computed_at,
            freshness: self.freshness,
            freshness_label: self.freshness.label(),
            version: self.version,
        }
    }

    /// "Pending" before the first compute, "No data" when a compute ran and
    /// found nothing to score. The two must never collapse into one label.
    fn score_display(&self, score: Option<f64>) -> String {
        match (score, self.last_computed_at) {
            (Some(value), _) => format!("{value:.1}"),
            (None, Some(_)) => "No data".to_string(),
            (None, None) => "Pending".to_string(),
        }
    }
}

/// Read-facing scorecard projection.
#[derive(Debug, Clone, Serialize)]
pub struct ScorecardView {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub kind: EntityKind,
    pub kind_label: &'static str,
    pub performance_score: Option<f64>,
    pub performance_display: String,
    pub integrity_score: Option<f64>,
    pub integrity_display: String,
    pub issues: Vec<String>,
    pub integrity_issues: Vec<String>,
    pub formula_explanation: String,
    pub last_computed_at: Option<DateTime<Utc>>,
    pub freshness: Freshness,
    pub freshness_label: &'static str,
    pub version: u64,
}

/// Derived oversight score for a representative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeScoreView {
    pub representative_id: RepresentativeId,
    pub name: String,
    pub office: String,
    pub score: f64,
    pub jurisdiction_size: usize,
    pub scored_entities: usize,
    pub computed_at: DateTime<Utc>,
}

/// Storage abstraction so the engine can run against in-memory fakes in tests
/// and real persistence in deployments.
pub trait ScorecardRepository: Send + Sync {
    fn load(&self, id: &EntityId) -> Result<Option<ScorecardRecord>, RepositoryError>;

    /// Compare-and-swap store. Succeeds only while the stored version still
    /// matches `expected_version` (0 for a record that does not exist yet),
    /// then persists the record as `Fresh` at `expected_version + 1` and
    /// returns what was written.
    fn store(
        &self,
        record: ScorecardRecord,
        expected_version: u64,
    ) -> Result<ScorecardRecord, RepositoryError>;

    /// Flip the record to `Stale`, creating a placeholder when the entity has
    /// no record yet. Does not touch the version.
    fn mark_stale(&self, id: &EntityId) -> Result<(), RepositoryError>;

    /// Flip the record to `Computing`. Does not touch the version.
    fn mark_computing(&self, id: &EntityId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("scorecard not found")]
    NotFound,
    #[error("version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },
    #[error("scorecard storage unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook fired when an entity first crosses below the critical
/// performance threshold.
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: CriticalConditionAlert) -> Result<(), AlertError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalConditionAlert {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub performance_score: f64,
    pub threshold: f64,
    pub entered_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
