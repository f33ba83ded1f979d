//! Shared fixtures: in-memory storage and alert fakes plus a seeded
//! three-tier hierarchy.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::oversight::scorecard::domain::{
    Entity, EntityId, EntityKind, EventId, Freshness, IntegrityEventDraft, IssueTag,
    Representative, RepresentativeId,
};
use crate::oversight::scorecard::repository::{
    AlertError, AlertPublisher, CriticalConditionAlert, RepositoryError, ScorecardRecord,
    ScorecardRepository,
};
use crate::oversight::scorecard::scorers::{RepresentativeWeights, ScoringConfig};
use crate::oversight::scorecard::service::ScorecardService;

pub(super) type MemoryService = ScorecardService<MemoryRepository, MemoryAlerts>;

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<EntityId, ScorecardRecord>>,
}

impl MemoryRepository {
    pub(super) fn record(&self, id: &EntityId) -> Option<ScorecardRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl ScorecardRepository for MemoryRepository {
    fn load(&self, id: &EntityId) -> Result<Option<ScorecardRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn store(
        &self,
        mut record: ScorecardRecord,
        expected_version: u64,
    ) -> Result<ScorecardRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let found = guard
            .get(&record.entity_id)
            .map(|existing| existing.version)
            .unwrap_or(0);
        if found != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found,
            });
        }
        record.version = expected_version + 1;
        record.freshness = Freshness::Fresh;
        guard.insert(record.entity_id.clone(), record.clone());
        Ok(record)
    }

    fn mark_stale(&self, id: &EntityId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let entry = guard
            .entry(id.clone())
            .or_insert_with(|| ScorecardRecord::placeholder(id.clone()));
        entry.freshness = Freshness::Stale;
        Ok(())
    }

    fn mark_computing(&self, id: &EntityId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let entry = guard
            .entry(id.clone())
            .or_insert_with(|| ScorecardRecord::placeholder(id.clone()));
        entry.freshness = Freshness::Computing;
        Ok(())
    }
}

/// Storage that refuses every call, for exercising failure paths.
pub(super) struct UnavailableRepository;

impl ScorecardRepository for UnavailableRepository {
    fn load(&self, _id: &EntityId) -> Result<Option<ScorecardRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn store(
        &self,
        _record: ScorecardRecord,
        _expected_version: u64,
    ) -> Result<ScorecardRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn mark_stale(&self, _id: &EntityId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn mark_computing(&self, _id: &EntityId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }
}

/// Storage that reports a version conflict on the first `conflicts` stores,
/// then behaves like memory storage.
pub(super) struct FlakyRepository {
    inner: MemoryRepository,
    conflicts_remaining: AtomicU32,
}

impl FlakyRepository {
    pub(super) fn conflicting(times: u32) -> Self {
        Self {
            inner: MemoryRepository::default(),
            conflicts_remaining: AtomicU32::new(times),
        }
    }
}

impl ScorecardRepository for FlakyRepository {
    fn load(&self, id: &EntityId) -> Result<Option<ScorecardRecord>, RepositoryError> {
        self.inner.load(id)
    }

    fn store(
        &self,
        record: ScorecardRecord,
        expected_version: u64,
    ) -> Result<ScorecardRecord, RepositoryError> {
        let remaining = self.conflicts_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found: expected_version + 1,
            });
        }
        self.inner.store(record, expected_version)
    }

    fn mark_stale(&self, id: &EntityId) -> Result<(), RepositoryError> {
        self.inner.mark_stale(id)
    }

    fn mark_computing(&self, id: &EntityId) -> Result<(), RepositoryError> {
        self.inner.mark_computing(id)
    }
}

#[derive(Default)]
pub(super) struct MemoryAlerts {
    published: Mutex<Vec<CriticalConditionAlert>>,
}

impl MemoryAlerts {
    pub(super) fn published(&self) -> Vec<CriticalConditionAlert> {
        self.published
            .lock()
            .expect("alerts mutex poisoned")
            .clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: CriticalConditionAlert) -> Result<(), AlertError> {
        self.published
            .lock()
            .expect("alerts mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) fn scoring_config() -> ScoringConfig {
    let mut severity_table = BTreeMap::new();
    for (tag, weight) in [
        ("Patient Safety Violations", 45.0),
        ("Leadership Failures", 25.0),
        ("Infrastructure Deficiencies", 20.0),
        ("Staffing Shortages", 15.0),
        ("Whistleblower Retaliation", 11.8),
        ("Survey Compliance Issues", 10.0),
    ] {
        severity_table.insert(IssueTag(tag.to_string()), weight);
    }

    let mut integrity_defaults = BTreeMap::new();
    for (category, severity) in [
        ("Obstruction of Investigations", 30.0),
        ("Records Falsification", 25.0),
        ("Misleading Statements to Oversight", 15.0),
    ] {
        integrity_defaults.insert(category.to_string(), severity);
    }

    ScoringConfig {
        severity_table,
        integrity_defaults,
        representative: RepresentativeWeights::default(),
        max_recompute_attempts: 4,
    }
}

pub(super) fn build_service() -> (Arc<MemoryService>, Arc<MemoryRepository>, Arc<MemoryAlerts>) {
    let repository = Arc::new(MemoryRepository::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service = Arc::new(ScorecardService::new(
        repository.clone(),
        alerts.clone(),
        scoring_config(),
    ));
    (service, repository, alerts)
}

pub(super) fn national(id: &str, name: &str) -> Entity {
    Entity {
        id: EntityId(id.to_string()),
        kind: EntityKind::National,
        parent_id: None,
        name: name.to_string(),
        issue_tags: BTreeSet::new(),
    }
}

pub(super) fn visn(id: &str, name: &str, parent: &str) -> Entity {
    Entity {
        id: EntityId(id.to_string()),
        kind: EntityKind::Visn,
        parent_id: Some(EntityId(parent.to_string())),
        name: name.to_string(),
        issue_tags: BTreeSet::new(),
    }
}

pub(super) fn facility(id: &str, name: &str, parent: &str, tags: &[&str]) -> Entity {
    Entity {
        id: EntityId(id.to_string()),
        kind: EntityKind::Facility,
        parent_id: Some(EntityId(parent.to_string())),
        name: name.to_string(),
        issue_tags: tags.iter().map(|tag| IssueTag(tag.to_string())).collect(),
    }
}

pub(super) fn representative(id: &str, name: &str, office: &str, entities: &[&str]) -> Representative {
    Representative {
        id: RepresentativeId(id.to_string()),
        name: name.to_string(),
        office: office.to_string(),
        party: None,
        contact_url: None,
        jurisdiction: entities
            .iter()
            .map(|entity| EntityId(entity.to_string()))
            .collect(),
    }
}

pub(super) fn draft_event(id: &str, entity: &str, category: &str, severity: Option<f64>) -> IntegrityEventDraft {
    IntegrityEventDraft {
        id: EventId(id.to_string()),
        entity_id: EntityId(entity.to_string()),
        category: category.to_string(),
        severity,
        source_citation: Some("OIG-2026-01422".to_string()),
        recorded_at: timestamp(),
        supersedes: None,
    }
}

pub(super) fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

/// National root, two VISNs, three facilities scoring 55, 90, and 60.
pub(super) fn seed_hierarchy(service: &MemoryService) {
    service
        .upsert_entity(national("va-national", "Department of Veterans Affairs"))
        .expect("national upserts");
    service
        .upsert_entity(visn("visn-07", "VISN 7", "va-national"))
        .expect("visn-07 upserts");
    service
        .upsert_entity(visn("visn-16", "VISN 16", "va-national"))
        .expect("visn-16 upserts");
    service
        .upsert_entity(facility(
            "sta-508",
            "Atlanta VA Medical Center",
            "visn-07",
            &["Patient Safety Violations"],
        ))
        .expect("atlanta upserts");
    service
        .upsert_entity(facility(
            "sta-509",
            "Augusta VA Medical Center",
            "visn-07",
            &["Survey Compliance Issues"],
        ))
        .expect("augusta upserts");
    service
        .upsert_entity(facility(
            "sta-580",
            "Houston VA Medical Center",
            "visn-16",
            &["Leadership Failures", "Staffing Shortages"],
        ))
        .expect("houston upserts");
}

pub(super) async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

pub(super) fn entity_id(id: &str) -> EntityId {
    EntityId(id.to_string())
}
