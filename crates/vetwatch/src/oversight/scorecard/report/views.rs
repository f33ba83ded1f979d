use serde::Serialize;

use super::super::domain::{EntityId, EntityKind};

/// Per-tier rollup for the oversight dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct TierBreakdownEntry {
    pub kind: EntityKind,
    pub kind_label: &'static str,
    pub entities: usize,
    pub scored: usize,
    pub stale: usize,
    pub below_critical: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_performance: Option<f64>,
}

/// One facility's standing in the worst-performers table.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityStanding {
    pub entity_id: EntityId,
    pub name: String,
    pub performance_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// One VISN's standing, ordered worst first; scoreless VISNs sort last.
#[derive(Debug, Clone, Serialize)]
pub struct VisnStanding {
    pub entity_id: EntityId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_score: Option<f64>,
}

/// Portfolio rollup across every registered entity.
#[derive(Debug, Clone, Serialize)]
pub struct OversightSummary {
    pub tiers: Vec<TierBreakdownEntry>,
    pub worst_facilities: Vec<FacilityStanding>,
    pub visn_standings: Vec<VisnStanding>,
    pub facilities_without_integrity_data: usize,
    pub below_critical: usize,
    pub stale_entities: usize,
}

/// Editorial severity band for the generated narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OversightLevel {
    Stable,
    Elevated,
    Crisis,
}

impl OversightLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stable => "Stable",
            Self::Elevated => "Elevated Concern",
            Self::Crisis => "Systemic Crisis",
        }
    }
}

/// Generated narrative derived from a summary.
#[derive(Debug, Clone, Serialize)]
pub struct OversightInsights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_performance: Option<f64>,
    pub level: OversightLevel,
    pub level_label: &'static str,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_visn: Option<String>,
}
