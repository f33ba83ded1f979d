use super::super::domain::EntityKind;
use super::views::{OversightInsights, OversightLevel, OversightSummary};

/// Derive the narrative block the portal publishes next to the raw numbers.
/// Deterministic on purpose: the same summary always reads the same way.
pub(crate) fn generate_insights(summary: &OversightSummary) -> OversightInsights {
    let national_performance = summary
        .tiers
        .iter()
        .find(|tier| tier.kind == EntityKind::National)
        .and_then(|tier| tier.average_performance);

    let facility_tier = summary
        .tiers
        .iter()
        .find(|tier| tier.kind == EntityKind::Facility);
    let scored_facilities = facility_tier.map(|tier| tier.scored).unwrap_or_default();
    let facilities_below = facility_tier
        .map(|tier| tier.below_critical)
        .unwrap_or_default();

    let level = match national_performance {
        Some(score) if score < 40.0 || facilities_below >= 3 => OversightLevel::Crisis,
        Some(score) if score < 70.0 || facilities_below > 0 => OversightLevel::Elevated,
        Some(_) => OversightLevel::Stable,
        // an uncomputed national score is itself a finding
        None => OversightLevel::Elevated,
    };

    let mut observations = Vec::new();
    match national_performance {
        Some(score) => observations.push(format!(
            "National performance stands at {score:.1} across {scored_facilities} scored facilities"
        )),
        None => observations.push("National performance has not been computed yet".to_string()),
    }
    if facilities_below > 0 {
        observations.push(format!(
            "{facilities_below} facility(ies) sit below the critical threshold"
        ));
    }
    if summary.facilities_without_integrity_data > 0 {
        observations.push(format!(
            "{} facility(ies) have no integrity data on record",
            summary.facilities_without_integrity_data
        ));
    }
    if summary.stale_entities > 0 {
        observations.push(format!(
            "{} scorecard(s) are stale and awaiting recompute",
            summary.stale_entities
        ));
    }

    let mut recommended_actions = Vec::new();
    if let Some(worst) = summary.worst_facilities.first() {
        recommended_actions.push(format!(
            "Prioritize corrective-action review at {} (score {:.1})",
            worst.name, worst.performance_score
        ));
    }
    if summary.stale_entities > 0 {
        recommended_actions
            .push("Run a recompute pass over stale scorecards before publishing".to_string());
    }
    if summary.facilities_without_integrity_data > 0 {
        recommended_actions.push(
            "Request OIG records for facilities with no integrity data rather than presuming a clean slate"
                .to_string(),
        );
    }

    let focus_visn = summary
        .visn_standings
        .first()
        .filter(|standing| standing.performance_score.is_some())
        .map(|standing| standing.name.clone());

    OversightInsights {
        national_performance,
        level,
        level_label: level.label(),
        observations,
        recommended_actions,
        focus_visn,
    }
}
