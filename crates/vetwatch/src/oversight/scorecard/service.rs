//! Engine facade composing the hierarchy, the integrity ledger, scorecard
//! storage, and the alert hook.
//!
//! Writes only flip staleness; nothing computes a score until an explicit
//! recompute walk. The walk is strictly bottom-up so a child is always
//! finalized before its parent reads it, and every transition to `Fresh` goes
//! through the repository's version check so concurrent recomputes retry
//! instead of silently losing an update.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{
    Entity, EntityId, EntityKind, Freshness, IntegrityEvent, IntegrityEventDraft, IssueTag,
    Representative, RepresentativeId,
};
use super::hierarchy::{EntityGraph, EventLedger, HierarchyError, LedgerError};
use super::report::{self, OversightSummary};
use super::repository::{
    AlertError, AlertPublisher, CriticalConditionAlert, RepositoryError, RepresentativeScoreView,
    ScorecardRecord, ScorecardRepository, ScorecardView,
};
use super::scorers::{
    integrity, performance, representative, EntityScoreFacts, ScoreError, ScoringConfig,
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
    #[error("entity {0} is not registered")]
    EntityNotFound(EntityId),
    #[error("representative {0} is not registered")]
    RepresentativeNotFound(RepresentativeId),
    #[error("integrity events attach to facilities; {entity_id} is registered as a {}", .kind.label())]
    IntegrityTargetNotFacility { entity_id: EntityId, kind: EntityKind },
    #[error("integrity category {0:?} has no configured default severity")]
    UnknownIntegrityCategory(String),
    #[error("recompute of {entity_id} abandoned after {attempts} version conflicts")]
    RecomputeContention { entity_id: EntityId, attempts: u32 },
}

/// Result of one bottom-up recompute walk: nodes refreshed in walk order,
/// plus aggregates left stale for lack of scored children.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RecomputeOutcome {
    pub refreshed: Vec<RefreshedEntity>,
    pub skipped: Vec<SkippedEntity>,
}

impl RecomputeOutcome {
    pub fn fully_refreshed(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshedEntity {
    pub entity_id: EntityId,
    pub version: u64,
    pub performance_score: f64,
    pub integrity_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntity {
    pub entity_id: EntityId,
    pub reason: String,
}

enum NodeResult {
    Refreshed(RefreshedEntity),
    Skipped(String),
}

struct ComputedScores {
    entity_name: String,
    performance_score: f64,
    integrity_score: Option<f64>,
    issues: Vec<String>,
    integrity_issues: Vec<String>,
    formula_explanation: String,
}

pub struct ScorecardService<R, A> {
    graph: Mutex<EntityGraph>,
    ledger: Mutex<EventLedger>,
    repository: Arc<R>,
    alerts: Arc<A>,
    config: ScoringConfig,
}

impl<R, A> ScorecardService<R, A>
where
    R: ScorecardRepository + 'static,
    A: AlertPublisher + 'static,
{
    pub fn new(repository: Arc<R>, alerts: Arc<A>, config: ScoringConfig) -> Self {
        Self {
            graph: Mutex::new(EntityGraph::new()),
            ledger: Mutex::new(EventLedger::new()),
            repository,
            alerts,
            config,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Register or replace an entity, flipping it and every strict ancestor
    /// to stale. When a move changes parents, the former chain is flipped
    /// too, since its child set also changed.
    pub fn upsert_entity(&self, entity: Entity) -> Result<(), EngineError> {
        let entity_id = entity.id.clone();
        let mut stale = vec![entity_id.clone()];
        {
            let mut graph = self.graph.lock().expect("entity graph mutex poisoned");
            let previous_parent = graph
                .entity(&entity_id)
                .and_then(|existing| existing.parent_id.clone());
            graph.upsert_entity(entity)?;

            let current_parent = graph
                .entity(&entity_id)
                .and_then(|existing| existing.parent_id.clone());
            if let Some(old_parent) = previous_parent {
                if current_parent.as_ref() != Some(&old_parent) {
                    stale.extend(graph.ancestors(&old_parent));
                    stale.push(old_parent);
                }
            }
            stale.extend(graph.ancestors(&entity_id));
        }

        stale.sort();
        stale.dedup();
        for id in &stale {
            self.repository.mark_stale(id)?;
        }
        debug!(entity = %entity_id, marked_stale = stale.len(), "entity upserted");
        Ok(())
    }

    /// Register or replace a representative. Jurisdiction entries must name
    /// registered entities.
    pub fn upsert_representative(&self, representative: Representative) -> Result<(), EngineError> {
        let mut graph = self.graph.lock().expect("entity graph mutex poisoned");
        graph.upsert_representative(representative)?;
        Ok(())
    }

    /// Append an integrity event against a facility, resolving a missing
    /// severity from the per-category defaults, and flip the facility's chain
    /// stale. Returns the event as recorded.
    pub fn record_integrity_event(
        &self,
        draft: IntegrityEventDraft,
    ) -> Result<IntegrityEvent, EngineError> {
        let severity = match draft.severity {
            Some(value) => value,
            None => *self
                .config
                .integrity_defaults
                .get(&draft.category)
                .ok_or_else(|| EngineError::UnknownIntegrityCategory(draft.category.clone()))?,
        };

        let mut stale = Vec::new();
        {
            let graph = self.graph.lock().expect("entity graph mutex poisoned");
            let target = graph
                .entity(&draft.entity_id)
                .ok_or_else(|| EngineError::EntityNotFound(draft.entity_id.clone()))?;
            if target.kind != EntityKind::Facility {
                return Err(EngineError::IntegrityTargetNotFacility {
                    entity_id: target.id.clone(),
                    kind: target.kind,
                });
            }
            stale.push(target.id.clone());
            stale.extend(graph.ancestors(&target.id));
        }

        let event = IntegrityEvent {
            id: draft.id,
            entity_id: draft.entity_id,
            category: draft.category,
            severity,
            source_citation: draft.source_citation,
            recorded_at: draft.recorded_at,
            supersedes: draft.supersedes,
        };

        {
            let mut ledger = self.ledger.lock().expect("integrity ledger mutex poisoned");
            ledger.append(event.clone())?;
        }

        for id in &stale {
            self.repository.mark_stale(id)?;
        }
        Ok(event)
    }

    /// Recompute the entity and then every ancestor up to the national root.
    ///
    /// An aggregate with no scored children stays stale and is reported in
    /// the outcome without stopping the walk. An unknown issue tag aborts
    /// instead: a misconfigured severity table must never publish an
    /// understated score.
    pub fn recompute_from(
        &self,
        entity_id: &EntityId,
        computed_at: DateTime<Utc>,
    ) -> Result<RecomputeOutcome, EngineError> {
        let chain = {
            let graph = self.graph.lock().expect("entity graph mutex poisoned");
            let entity = graph
                .entity(entity_id)
                .ok_or_else(|| EngineError::EntityNotFound(entity_id.clone()))?;
            let mut chain = vec![entity.id.clone()];
            chain.extend(graph.ancestors(&entity.id));
            chain
        };

        let mut outcome = RecomputeOutcome::default();
        for node_id in chain {
            match self.recompute_node(&node_id, computed_at)? {
                NodeResult::Refreshed(entry) => outcome.refreshed.push(entry),
                NodeResult::Skipped(reason) => {
                    warn!(entity = %node_id, %reason, "aggregate left stale during recompute");
                    outcome.skipped.push(SkippedEntity {
                        entity_id: node_id,
                        reason,
                    });
                }
            }
        }
        Ok(outcome)
    }

    fn recompute_node(
        &self,
        node_id: &EntityId,
        computed_at: DateTime<Utc>,
    ) -> Result<NodeResult, EngineError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self
                .repository
                .load(node_id)?
                .unwrap_or_else(|| ScorecardRecord::placeholder(node_id.clone()));
            let expected_version = current.version;
            self.repository.mark_computing(node_id)?;

            let computed = match self.compute_scores(node_id) {
                Ok(computed) => computed,
                Err(EngineError::Score(ScoreError::InsufficientData)) => {
                    self.repository.mark_stale(node_id)?;
                    return Ok(NodeResult::Skipped(
                        "no scored children to aggregate".to_string(),
                    ));
                }
                Err(other) => {
                    // the original failure is the interesting one
                    let _ = self.repository.mark_stale(node_id);
                    return Err(other);
                }
            };

            let previous_critical = current.critical_since;
            let critical_since = if computed.performance_score
                < self.config.representative.critical_threshold
            {
                previous_critical.or(Some(computed_at))
            } else {
                None
            };

            let record = ScorecardRecord {
                entity_id: node_id.clone(),
                performance_score: Some(computed.performance_score),
                integrity_score: computed.integrity_score,
                issues: computed.issues.clone(),
                integrity_issues: computed.integrity_issues.clone(),
                formula_explanation: computed.formula_explanation.clone(),
                last_computed_at: Some(computed_at),
                freshness: Freshness::Fresh,
                version: expected_version,
                critical_since,
            };

            match self.repository.store(record, expected_version) {
                Ok(stored) => {
                    if previous_critical.is_none() {
                        if let Some(entered_at) = stored.critical_since {
                            self.alerts.publish(CriticalConditionAlert {
                                entity_id: stored.entity_id.clone(),
                                entity_name: computed.entity_name.clone(),
                                performance_score: computed.performance_score,
                                threshold: self.config.representative.critical_threshold,
                                entered_at,
                            })?;
                        }
                    }
                    return Ok(NodeResult::Refreshed(RefreshedEntity {
                        entity_id: stored.entity_id,
                        version: stored.version,
                        performance_score: computed.performance_score,
                        integrity_score: computed.integrity_score,
                    }));
                }
                Err(RepositoryError::VersionConflict { .. }) => {
                    if attempt >= self.config.max_recompute_attempts {
                        let _ = self.repository.mark_stale(node_id);
                        return Err(EngineError::RecomputeContention {
                            entity_id: node_id.clone(),
                            attempts: attempt,
                        });
                    }
                    debug!(entity = %node_id, attempt, "version conflict, retrying recompute");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    fn compute_scores(&self, node_id: &EntityId) -> Result<ComputedScores, EngineError> {
        let graph = self.graph.lock().expect("entity graph mutex poisoned");
        let entity = graph
            .entity(node_id)
            .ok_or_else(|| EngineError::EntityNotFound(node_id.clone()))?;

        match entity.kind {
            EntityKind::Facility => {
                let ledger = self.ledger.lock().expect("integrity ledger mutex poisoned");
                let events = ledger.active_events(&entity.id);

                let performance_score =
                    performance::score_facility(&entity.issue_tags, &self.config.severity_table)?;
                let integrity_score = integrity::score_from_events(&events);

                let issues: Vec<String> =
                    entity.issue_tags.iter().map(|tag| tag.0.clone()).collect();
                let mut integrity_issues: Vec<String> =
                    events.iter().map(|event| event.category.clone()).collect();
                integrity_issues.sort();
                integrity_issues.dedup();

                let deductions: f64 = events.iter().map(|event| event.severity).sum();
                let formula_explanation = facility_explanation(
                    &entity.issue_tags,
                    &self.config.severity_table,
                    performance_score,
                    events.len(),
                    deductions,
                    integrity_score,
                );

                Ok(ComputedScores {
                    entity_name: entity.name.clone(),
                    performance_score,
                    integrity_score,
                    issues,
                    integrity_issues,
                    formula_explanation,
                })
            }
            EntityKind::Visn | EntityKind::National => {
                let children = graph.children(&entity.id).unwrap_or_default();
                let total_children = children.len();
                let mut child_performance = Vec::new();
                let mut child_integrity = Vec::new();
                let mut issues = Vec::new();
                let mut integrity_issues = Vec::new();

                for child in &children {
                    match self.repository.load(&child.id)? {
                        Some(record) => {
                            if let Some(score) = record.performance_score {
                                child_performance.push(score);
                            }
                            child_integrity.push(record.integrity_score);
                            issues.extend(record.issues);
                            integrity_issues.extend(record.integrity_issues);
                        }
                        None => child_integrity.push(None),
                    }
                }

                let performance_score = performance::score_aggregate(&child_performance)?;
                let integrity_score = integrity::score_aggregate(&child_integrity);

                issues.sort();
                issues.dedup();
                integrity_issues.sort();
                integrity_issues.dedup();

                let formula_explanation = aggregate_explanation(
                    entity.kind,
                    total_children,
                    &child_performance,
                    performance_score,
                    integrity_score,
                );

                Ok(ComputedScores {
                    entity_name: entity.name.clone(),
                    performance_score,
                    integrity_score,
                    issues,
                    integrity_issues,
                    formula_explanation,
                })
            }
        }
    }

    /// Last stored snapshot as a public view. Never recomputes implicitly.
    pub fn get_scorecard(&self, entity_id: &EntityId) -> Result<ScorecardView, EngineError> {
        let (name, kind) = {
            let graph = self.graph.lock().expect("entity graph mutex poisoned");
            let entity = graph
                .entity(entity_id)
                .ok_or_else(|| EngineError::EntityNotFound(entity_id.clone()))?;
            (entity.name.clone(), entity.kind)
        };
        let record = self
            .repository
            .load(entity_id)?
            .unwrap_or_else(|| ScorecardRecord::placeholder(entity_id.clone()));
        Ok(record.status_view(&name, kind))
    }

    /// Oversight score for a representative over the stored jurisdiction
    /// snapshots as of `as_of`.
    pub fn representative_score(
        &self,
        representative_id: &RepresentativeId,
        as_of: DateTime<Utc>,
    ) -> Result<RepresentativeScoreView, EngineError> {
        let (name, office, jurisdiction) = {
            let graph = self.graph.lock().expect("entity graph mutex poisoned");
            let representative = graph
                .representative(representative_id)
                .ok_or_else(|| EngineError::RepresentativeNotFound(representative_id.clone()))?;
            (
                representative.name.clone(),
                representative.office.clone(),
                representative
                    .jurisdiction
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        };

        let mut facts = Vec::with_capacity(jurisdiction.len());
        for entity_id in &jurisdiction {
            let record = self.repository.load(entity_id)?;
            facts.push(EntityScoreFacts {
                entity_id: entity_id.clone(),
                performance: record.as_ref().and_then(|record| record.performance_score),
                integrity: record.as_ref().and_then(|record| record.integrity_score),
                critical_since: record.as_ref().and_then(|record| record.critical_since),
            });
        }

        let score =
            representative::score_representative(&facts, &self.config.representative, as_of)?;
        let scored_entities = facts.iter().filter(|entry| entry.performance.is_some()).count();

        Ok(RepresentativeScoreView {
            representative_id: representative_id.clone(),
            name,
            office,
            score,
            jurisdiction_size: jurisdiction.len(),
            scored_entities,
            computed_at: as_of,
        })
    }

    /// Portfolio snapshot across every registered entity.
    pub fn overview(&self) -> Result<OversightSummary, EngineError> {
        let entities: Vec<Entity> = {
            let graph = self.graph.lock().expect("entity graph mutex poisoned");
            graph.entities().cloned().collect()
        };

        let mut pairs = Vec::with_capacity(entities.len());
        for entity in entities {
            let record = self.repository.load(&entity.id)?;
            pairs.push((entity, record));
        }

        Ok(report::compile_summary(
            &pairs,
            self.config.representative.critical_threshold,
        ))
    }
}

fn facility_explanation(
    issue_tags: &BTreeSet<IssueTag>,
    severity_table: &BTreeMap<IssueTag, f64>,
    performance_score: f64,
    event_count: usize,
    integrity_deductions: f64,
    integrity_score: Option<f64>,
) -> String {
    let performance_sentence = if issue_tags.is_empty() {
        "No performance issues on record; performance holds at 100.0.".to_string()
    } else {
        let deductions: Vec<String> = issue_tags
            .iter()
            .map(|tag| {
                let weight = severity_table.get(tag).copied().unwrap_or_default();
                format!("{tag} (-{weight:.1})")
            })
            .collect();
        format!(
            "Performance started at 100.0 and deducted {}; published score {performance_score:.1}.",
            deductions.join(", ")
        )
    };

    let integrity_sentence = match integrity_score {
        Some(score) => format!(
            " Integrity deducted {integrity_deductions:.1} across {event_count} recorded event(s); published score {score:.1}."
        ),
        None => " No integrity events on record, so no integrity score is published.".to_string(),
    };

    format!("{performance_sentence}{integrity_sentence}")
}

fn aggregate_explanation(
    kind: EntityKind,
    total_children: usize,
    scored: &[f64],
    performance_score: f64,
    integrity_score: Option<f64>,
) -> String {
    let mut sorted = scored.to_vec();
    sorted.sort_by(f64::total_cmp);
    let low_count = sorted.len().div_ceil(2);
    let unit = match kind {
        EntityKind::National => "VISN scores",
        _ => "facility scores",
    };

    let mut explanation = format!(
        "Averaged the lowest {low_count} of {} scored {unit} and blended with the worst ({:.1}); published {} score {performance_score:.1}.",
        sorted.len(),
        sorted[0],
        kind.label(),
    );
    let unscored = total_children.saturating_sub(scored.len());
    if unscored > 0 {
        explanation.push_str(&format!(" {unscored} of {total_children} children have no score yet."));
    }
    match integrity_score {
        Some(score) => explanation.push_str(&format!(
            " Integrity aggregated over children with data; published score {score:.1}."
        )),
        None => explanation.push_str(" No child integrity data; integrity stays unpublished."),
    }
    explanation
}
