use super::super::domain::{Entity, EntityKind, Freshness};
use super::super::repository::ScorecardRecord;
use super::views::{
    FacilityStanding, OversightInsights, OversightSummary, TierBreakdownEntry, VisnStanding,
};

const WORST_FACILITY_LIMIT: usize = 5;

impl OversightSummary {
    pub fn insights(&self) -> OversightInsights {
        super::generate_insights(self)
    }
}

/// Roll registered entities and their stored scorecards into the dashboard
/// summary. Entities without a record count as stale; they have never been
/// computed.
pub fn compile_summary(
    pairs: &[(Entity, Option<ScorecardRecord>)],
    critical_threshold: f64,
) -> OversightSummary {
    let mut tiers: Vec<TierBreakdownEntry> = [
        EntityKind::National,
        EntityKind::Visn,
        EntityKind::Facility,
    ]
    .into_iter()
    .map(|kind| TierBreakdownEntry {
        kind,
        kind_label: kind.label(),
        entities: 0,
        scored: 0,
        stale: 0,
        below_critical: 0,
        average_performance: None,
    })
    .collect();
    let mut sums = [0.0f64; 3];
    let mut counts = [0usize; 3];

    let mut worst_facilities: Vec<FacilityStanding> = Vec::new();
    let mut visn_standings: Vec<VisnStanding> = Vec::new();
    let mut facilities_without_integrity_data = 0;
    let mut below_critical = 0;
    let mut stale_entities = 0;

    for (entity, record) in pairs {
        let slot = tier_slot(entity.kind);
        tiers[slot].entities += 1;

        if entity.kind == EntityKind::Visn {
            visn_standings.push(VisnStanding {
                entity_id: entity.id.clone(),
                name: entity.name.clone(),
                performance_score: record
                    .as_ref()
                    .and_then(|record| record.performance_score),
            });
        }

        let record = match record {
            Some(record) => record,
            None => {
                tiers[slot].stale += 1;
                stale_entities += 1;
                continue;
            }
        };

        if record.freshness != Freshness::Fresh {
            tiers[slot].stale += 1;
            stale_entities += 1;
        }

        if let Some(score) = record.performance_score {
            tiers[slot].scored += 1;
            sums[slot] += score;
            counts[slot] += 1;
            if score < critical_threshold {
                tiers[slot].below_critical += 1;
                below_critical += 1;
            }
            if entity.kind == EntityKind::Facility {
                worst_facilities.push(FacilityStanding {
                    entity_id: entity.id.clone(),
                    name: entity.name.clone(),
                    performance_score: score,
                    integrity_score: record.integrity_score,
                    issues: record.issues.clone(),
                });
            }
        }

        if entity.kind == EntityKind::Facility
            && record.last_computed_at.is_some()
            && record.integrity_score.is_none()
        {
            facilities_without_integrity_data += 1;
        }
    }

    for (slot, tier) in tiers.iter_mut().enumerate() {
        if counts[slot] > 0 {
            tier.average_performance = Some(sums[slot] / counts[slot] as f64);
        }
    }

    worst_facilities.sort_by(|a, b| a.performance_score.total_cmp(&b.performance_score));
    worst_facilities.truncate(WORST_FACILITY_LIMIT);

    visn_standings.sort_by(|a, b| match (a.performance_score, b.performance_score) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.entity_id.cmp(&b.entity_id),
    });

    OversightSummary {
        tiers,
        worst_facilities,
        visn_standings,
        facilities_without_integrity_data,
        below_critical,
        stale_entities,
    }
}

fn tier_slot(kind: EntityKind) -> usize {
    match kind {
        EntityKind::National => 0,
        EntityKind::Visn => 1,
        EntityKind::Facility => 2,
    }
}
