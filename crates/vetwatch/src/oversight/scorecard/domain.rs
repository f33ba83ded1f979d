use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a hierarchy entity (facility, VISN, or the national root).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

/// Identifier for a congressional representative tracked by the portal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepresentativeId(pub String);

/// Identifier for an integrity event, referenced by later corrections.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Named performance-issue category observed at a facility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IssueTag(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RepresentativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for IssueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tier of the containment hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Facility,
    Visn,
    National,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Facility => "Facility",
            Self::Visn => "VISN",
            Self::National => "National",
        }
    }

    /// Tier the parent of this kind must live in, `None` at the root.
    pub const fn parent_kind(self) -> Option<Self> {
        match self {
            Self::Facility => Some(Self::Visn),
            Self::Visn => Some(Self::National),
            Self::National => None,
        }
    }
}

/// Static fields of a hierarchy entity. Derived scores live in scorecard
/// storage, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub issue_tags: BTreeSet<IssueTag>,
}

/// Integrity violation charged against a facility, immutable once appended.
///
/// Corrections never rewrite history: a replacement event names the record it
/// supersedes and the original stays in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityEvent {
    pub id: EventId,
    pub entity_id: EntityId,
    pub category: String,
    pub severity: f64,
    #[serde(default)]
    pub source_citation: Option<String>,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub supersedes: Option<EventId>,
}

/// Ingestion-boundary shape for integrity events. Severity may be omitted and
/// resolved from the configured per-category defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityEventDraft {
    pub id: EventId,
    pub entity_id: EntityId,
    pub category: String,
    #[serde(default)]
    pub severity: Option<f64>,
    #[serde(default)]
    pub source_citation: Option<String>,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub supersedes: Option<EventId>,
}

/// Congressional representative with oversight jurisdiction over a set of
/// hierarchy entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representative {
    pub id: RepresentativeId,
    pub name: String,
    pub office: String,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub contact_url: Option<String>,
    pub jurisdiction: BTreeSet<EntityId>,
}

/// Recompute lifecycle of a stored scorecard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Stale,
    Computing,
    Fresh,
}

impl Freshness {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stale => "Stale",
            Self::Computing => "Computing",
            Self::Fresh => "Fresh",
        }
    }
}
