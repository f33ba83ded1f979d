use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use vetwatch::config::ScoringOverrides;
use vetwatch::oversight::scorecard::{
    AlertError, AlertPublisher, CriticalConditionAlert, EntityId, Freshness, IssueTag,
    RepositoryError, RepresentativeWeights, ScorecardRecord, ScorecardRepository, ScoringConfig,
};

/// Root of every imported hierarchy. Roster exports carry stations and
/// VISNs but never name the department itself.
pub(crate) const NATIONAL_ID: &str = "va-national";
pub(crate) const NATIONAL_NAME: &str = "Department of Veterans Affairs";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local scorecard store with the compare-and-swap contract the
/// engine's recompute walk relies on.
#[derive(Default, Clone)]
pub(crate) struct InMemoryScorecardRepository {
    records: Arc<Mutex<HashMap<EntityId, ScorecardRecord>>>,
}

impl ScorecardRepository for InMemoryScorecardRepository {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<CriticalConditionAlert>>>,
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: CriticalConditionAlert) -> Result<(), AlertError> {
        let mut guard = self.events.lock().expect("alert mutex poisoned");
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<CriticalConditionAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

/// Published scoring methodology. Severities mirror the portal's public
/// methodology page; changing one here changes every formula explanation.
/// Environment overrides adjust the oversight knobs only, never the
/// severity tables. `VETWATCH_GRACE_DAYS=0` disables the grace window.
pub(crate) fn default_scoring_config(overrides: &ScoringOverrides) -> ScoringConfig {
    let mut severity_table = BTreeMap::new();
    for (tag, weight) in [
        ("Patient Safety Violations", 45.0),
        ("Leadership Failures", 25.0),
        ("Retaliation Against Whistleblowers", 25.0),
        ("Wait Time Manipulation", 20.0),
        ("Infrastructure Deficiencies", 20.0),
        ("Staffing Shortages", 15.0),
        ("Budget Mismanagement", 15.0),
        ("Survey Compliance Issues", 10.0),
    ] {
        severity_table.insert(IssueTag(tag.to_string()), weight);
    }

    let mut integrity_defaults = BTreeMap::new();
    for (category, severity) in [
        ("Obstruction of Investigations", 30.0),
        ("Records Falsification", 25.0),
        ("Data Manipulation", 20.0),
        ("Misleading Statements", 15.0),
    ] {
        integrity_defaults.insert(category.to_string(), severity);
    }

    let grace_period_days = match overrides.grace_period_days {
        Some(0) => None,
        Some(days) => Some(days),
        None => Some(90),
    };

    ScoringConfig {
        severity_table,
        integrity_defaults,
        representative: RepresentativeWeights {
            performance_weight: 0.7,
            integrity_weight: 0.3,
            critical_threshold: overrides.critical_threshold.unwrap_or(40.0),
            grace_period_days,
            penalty_per_entity: overrides.penalty_per_entity.unwrap_or(5.0),
        },
        max_recompute_attempts: 4,
    }
}

pub(crate) fn parse_utc_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("failed to derive a timestamp from '{raw}'"))?;
    Ok(midnight.and_utc())
}
