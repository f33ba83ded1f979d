use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::domain::IssueTag;

const DEFAULT_MAX_RECOMPUTE_ATTEMPTS: u32 = 4;

/// Weights governing the representative oversight score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeWeights {
    /// Coefficient on the jurisdiction performance average.
    pub performance_weight: f64,
    /// Coefficient on the jurisdiction integrity average.
    pub integrity_weight: f64,
    /// Performance score below which an entity counts as critical.
    pub critical_threshold: f64,
    /// Days an entity may stay critical before it draws a penalty; `None`
    /// disables penalties entirely.
    pub grace_period_days: Option<i64>,
    /// Points deducted per entity critical past the grace period.
    pub penalty_per_entity: f64,
}

impl Default for RepresentativeWeights {
    fn default() -> Self {
        Self {
            performance_weight: 0.7,
            integrity_weight: 0.3,
            critical_threshold: 20.0,
            grace_period_days: None,
            penalty_per_entity: 0.0,
        }
    }
}

/// Single configuration surface for every scorer. Methodology changes land
/// here, never as literals in the scorers or the render layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Deduction per performance issue tag. A tag absent from this table is a
    /// configuration error, not a zero-weight issue.
    pub severity_table: BTreeMap<IssueTag, f64>,
    /// Default severity per integrity-event category, applied when an event
    /// arrives without an explicit severity.
    pub integrity_defaults: BTreeMap<String, f64>,
    pub representative: RepresentativeWeights,
    /// Version-conflict retries allowed per node during a recompute walk.
    pub max_recompute_attempts: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            severity_table: BTreeMap::new(),
            integrity_defaults: BTreeMap::new(),
            representative: RepresentativeWeights::default(),
            max_recompute_attempts: DEFAULT_MAX_RECOMPUTE_ATTEMPTS,
        }
    }
}
