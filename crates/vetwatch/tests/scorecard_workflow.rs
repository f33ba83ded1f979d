//! End-to-end engine flows through the public API, including concurrent
//! sibling recomputes against shared ancestors.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};

use vetwatch::oversight::scorecard::{
    AlertError, AlertPublisher, CriticalConditionAlert, Entity, EntityId, EntityKind, EventId,
    Freshness, IntegrityEventDraft, IssueTag, Representative, RepresentativeId, RepositoryError,
    RepresentativeWeights, ScorecardRecord, ScorecardRepository, ScorecardService, ScoringConfig,
};

#[derive(Default)]
struct InMemoryRepository {
    records: Mutex<HashMap<EntityId, ScorecardRecord>>,
}

impl InMemoryRepository {
    fn version_of(&self, id: &EntityId) -> Option<u64> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .map(|record| record.version)
    }
}

impl ScorecardRepository for InMemoryRepository {
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

#[derive(Default)]
struct RecordingAlerts {
    published: Mutex<Vec<CriticalConditionAlert>>,
}

impl RecordingAlerts {
    fn count(&self) -> usize {
        self.published.lock().expect("alerts mutex poisoned").len()
    }
}

impl AlertPublisher for RecordingAlerts {
    fn publish(&self, alert: CriticalConditionAlert) -> Result<(), AlertError> {
        self.published
            .lock()
            .expect("alerts mutex poisoned")
            .push(alert);
        Ok(())
    }
}

fn scoring_config() -> ScoringConfig {
    let mut severity_table = BTreeMap::new();
    for (tag, weight) in [
        ("Patient Safety Violations", 45.0),
        ("Leadership Failures", 25.0),
        ("Infrastructure Deficiencies", 20.0),
        ("Staffing Shortages", 15.0),
        ("Survey Compliance Issues", 10.0),
    ] {
        severity_table.insert(IssueTag(tag.to_string()), weight);
    }

    let mut integrity_defaults = BTreeMap::new();
    integrity_defaults.insert("Records Falsification".to_string(), 25.0);
    integrity_defaults.insert("Obstruction of Investigations".to_string(), 30.0);

    ScoringConfig {
        severity_table,
        integrity_defaults,
        representative: RepresentativeWeights::default(),
        max_recompute_attempts: 4,
    }
}

fn entity(id: &str, kind: EntityKind, parent: Option<&str>, name: &str, tags: &[&str]) -> Entity {
    Entity {
        id: EntityId(id.to_string()),
        kind,
        parent_id: parent.map(|parent| EntityId(parent.to_string())),
        name: name.to_string(),
        issue_tags: tags.iter().map(|tag| IssueTag(tag.to_string())).collect(),
    }
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn build_service() -> (
    Arc<ScorecardService<InMemoryRepository, RecordingAlerts>>,
    Arc<InMemoryRepository>,
    Arc<RecordingAlerts>,
) {
    let repository = Arc::new(InMemoryRepository::default());
    let alerts = Arc::new(RecordingAlerts::default());
    let service = Arc::new(ScorecardService::new(
        repository.clone(),
        alerts.clone(),
        scoring_config(),
    ));
    (service, repository, alerts)
}

#[test]
fn scorecards_flow_from_intake_to_published_views() {
    let (service, _repository, alerts) = build_service();

    service
        .upsert_entity(entity(
            "va-national",
            EntityKind::National,
            None,
            "Department of Veterans Affairs",
            &[],
        ))
        .expect("national upserts");
    service
        .upsert_entity(entity("visn-07", EntityKind::Visn, Some("va-national"), "VISN 7", &[]))
        .expect("visn upserts");
    service
        .upsert_entity(entity(
            "sta-508",
            EntityKind::Facility,
            Some("visn-07"),
            "Atlanta VA Medical Center",
            &["Patient Safety Violations"],
        ))
        .expect("atlanta upserts");
    service
        .upsert_entity(entity(
            "sta-509",
            EntityKind::Facility,
            Some("visn-07"),
            "Augusta VA Medical Center",
            &["Survey Compliance Issues"],
        ))
        .expect("augusta upserts");

    // an OIG finding lands against Atlanta, severity from category defaults
    let event = service
        .record_integrity_event(IntegrityEventDraft {
            id: EventId("oig-2026-0001".to_string()),
            entity_id: EntityId("sta-508".to_string()),
            category: "Records Falsification".to_string(),
            severity: None,
            source_citation: Some("OIG-2026-0001".to_string()),
            recorded_at: noon(),
            supersedes: None,
        })
        .expect("event records");
    assert_eq!(event.severity, 25.0);

    for id in ["sta-508", "sta-509"] {
        service
            .recompute_from(&EntityId(id.to_string()), noon())
            .expect("walk completes");
    }

    let atlanta = service
        .get_scorecard(&EntityId("sta-508".to_string()))
        .expect("atlanta view");
    assert_eq!(atlanta.performance_score, Some(55.0));
    assert_eq!(atlanta.integrity_score, Some(75.0));
    assert!(atlanta.formula_explanation.contains("Patient Safety Violations"));

    let augusta = service
        .get_scorecard(&EntityId("sta-509".to_string()))
        .expect("augusta view");
    assert_eq!(augusta.performance_score, Some(90.0));
    assert_eq!(augusta.integrity_display, "No data");

    // the VISN blends 55 and 90 down to 55, integrity only from Atlanta
    let parent = service
        .get_scorecard(&EntityId("visn-07".to_string()))
        .expect("visn view");
    assert_eq!(parent.performance_score, Some(55.0));
    assert_eq!(parent.integrity_score, Some(75.0));
    assert_eq!(parent.freshness, Freshness::Fresh);

    // a correction halves the deduction and reflows upward after recompute
    service
        .record_integrity_event(IntegrityEventDraft {
            id: EventId("oig-2026-0001-rev".to_string()),
            entity_id: EntityId("sta-508".to_string()),
            category: "Records Falsification".to_string(),
            severity: Some(12.5),
            source_citation: Some("OIG-2026-0001 (rev)".to_string()),
            recorded_at: noon(),
            supersedes: Some(EventId("oig-2026-0001".to_string())),
        })
        .expect("correction records");
    service
        .recompute_from(&EntityId("sta-508".to_string()), noon())
        .expect("walk completes");

    let corrected = service
        .get_scorecard(&EntityId("sta-508".to_string()))
        .expect("corrected view");
    assert_eq!(corrected.integrity_score, Some(87.5));

    // none of these facilities dipped below the critical threshold
    assert_eq!(alerts.count(), 0);

    // representative blends the jurisdiction averages
    service
        .upsert_representative(Representative {
            id: RepresentativeId("rep-ga-05".to_string()),
            name: "Rep. Jordan Ellis".to_string(),
            office: "GA-05".to_string(),
            party: None,
            contact_url: None,
            jurisdiction: [EntityId("sta-508".to_string()), EntityId("sta-509".to_string())]
                .into_iter()
                .collect::<BTreeSet<_>>(),
        })
        .expect("representative upserts");

    let oversight = service
        .representative_score(&RepresentativeId("rep-ga-05".to_string()), noon())
        .expect("representative scores");
    // 0.7 * mean(55, 90) + 0.3 * mean(87.5)
    assert!((oversight.score - (0.7 * 72.5 + 0.3 * 87.5)).abs() < 1e-9);
    assert_eq!(oversight.scored_entities, 2);
}

#[test]
fn concurrent_sibling_recomputes_converge_without_lost_updates() {
    let (service, repository, _alerts) = build_service();

    service
        .upsert_entity(entity(
            "va-national",
            EntityKind::National,
            None,
            "Department of Veterans Affairs",
            &[],
        ))
        .expect("national upserts");
    service
        .upsert_entity(entity("visn-07", EntityKind::Visn, Some("va-national"), "VISN 7", &[]))
        .expect("visn upserts");
    service
        .upsert_entity(entity(
            "sta-a",
            EntityKind::Facility,
            Some("visn-07"),
            "Alpha VAMC",
            &["Staffing Shortages"],
        ))
        .expect("alpha upserts");
    service
        .upsert_entity(entity(
            "sta-b",
            EntityKind::Facility,
            Some("visn-07"),
            "Bravo VAMC",
            &["Survey Compliance Issues"],
        ))
        .expect("bravo upserts");

    let workers: Vec<_> = ["sta-a", "sta-b"]
        .into_iter()
        .map(|id| {
            let service = service.clone();
            let target = EntityId(id.to_string());
            thread::spawn(move || service.recompute_from(&target, noon()))
        })
        .collect();
    for worker in workers {
        let outcome = worker
            .join()
            .expect("worker thread completes")
            .expect("walk completes");
        assert!(outcome.fully_refreshed());
    }

    // each facility was stored once, the shared ancestors exactly twice
    assert_eq!(repository.version_of(&EntityId("sta-a".to_string())), Some(1));
    assert_eq!(repository.version_of(&EntityId("sta-b".to_string())), Some(1));
    assert_eq!(repository.version_of(&EntityId("visn-07".to_string())), Some(2));
    assert_eq!(
        repository.version_of(&EntityId("va-national".to_string())),
        Some(2)
    );

    // the surviving VISN snapshot reflects both children: blend of 85 and 90
    let visn = service
        .get_scorecard(&EntityId("visn-07".to_string()))
        .expect("visn view");
    assert_eq!(visn.performance_score, Some(85.0));
    assert_eq!(visn.freshness, Freshness::Fresh);
}
