//! Oversight-effectiveness scoring for congressional representatives.

use chrono::{DateTime, Duration, Utc};

use super::super::domain::EntityId;
use super::config::RepresentativeWeights;
use super::ScoreError;

/// Scores gathered for one jurisdiction entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityScoreFacts {
    pub entity_id: EntityId,
    pub performance: Option<f64>,
    pub integrity: Option<f64>,
    /// When the entity last crossed below the critical threshold, if it is
    /// still there.
    pub critical_since: Option<DateTime<Utc>>,
}

/// Blend jurisdiction performance and integrity into a 0 to 100 oversight
/// score.
///
/// Entities without an integrity score are excluded from the integrity term;
/// when no jurisdiction entity has integrity data the blend renormalizes to
/// the performance average alone instead of treating absence as zero.
/// Entities critical for longer than the grace period each deduct the
/// configured penalty.
pub fn score_representative(
    facts: &[EntityScoreFacts],
    weights: &RepresentativeWeights,
    as_of: DateTime<Utc>,
) -> Result<f64, ScoreError> {
    if facts.is_empty() {
        return Err(ScoreError::EmptyJurisdiction);
    }

    let performance: Vec<f64> = facts.iter().filter_map(|entry| entry.performance).collect();
    if performance.is_empty() {
        return Err(ScoreError::InsufficientData);
    }
    let integrity: Vec<f64> = facts.iter().filter_map(|entry| entry.integrity).collect();

    let performance_mean = mean(&performance);
    let (weighted, weight_sum) = if integrity.is_empty() {
        (
            weights.performance_weight * performance_mean,
            weights.performance_weight,
        )
    } else {
        (
            weights.performance_weight * performance_mean
                + weights.integrity_weight * mean(&integrity),
            weights.performance_weight + weights.integrity_weight,
        )
    };
    let base = weighted / weight_sum;

    let penalties = match weights.grace_period_days {
        Some(days) => {
            let grace = Duration::days(days);
            let overdue = facts
                .iter()
                .filter(|entry| {
                    entry
                        .critical_since
                        .map(|since| as_of - since >= grace)
                        .unwrap_or(false)
                })
                .count();
            overdue as f64 * weights.penalty_per_entity
        }
        None => 0.0,
    };

    Ok((base - penalties).clamp(0.0, 100.0))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn facts(entries: &[(&str, Option<f64>, Option<f64>)]) -> Vec<EntityScoreFacts> {
        entries
            .iter()
            .map(|(id, performance, integrity)| EntityScoreFacts {
                entity_id: EntityId(id.to_string()),
                performance: *performance,
                integrity: *integrity,
                critical_since: None,
            })
            .collect()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn blends_performance_and_integrity_averages() {
        let facts = facts(&[
            ("sta-508", Some(80.0), Some(90.0)),
            ("sta-509", Some(40.0), None),
        ]);
        let score = score_representative(&facts, &RepresentativeWeights::default(), noon())
            .expect("jurisdiction scores");
        // 0.7 * 60 + 0.3 * 90
        assert!((score - 69.0).abs() < 1e-9);
    }

    #[test]
    fn renormalizes_when_no_integrity_data_exists() {
        let facts = facts(&[
            ("sta-508", Some(80.0), None),
            ("sta-509", Some(40.0), None),
        ]);
        let score = score_representative(&facts, &RepresentativeWeights::default(), noon())
            .expect("jurisdiction scores");
        assert!((score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn empty_jurisdiction_is_rejected() {
        let error = score_representative(&[], &RepresentativeWeights::default(), noon())
            .expect_err("no entities to oversee");
        assert_eq!(error, ScoreError::EmptyJurisdiction);
    }

    #[test]
    fn jurisdiction_without_any_performance_scores_is_insufficient() {
        let facts = facts(&[("sta-508", None, None), ("sta-509", None, Some(50.0))]);
        let error = score_representative(&facts, &RepresentativeWeights::default(), noon())
            .expect_err("nothing scored yet");
        assert_eq!(error, ScoreError::InsufficientData);
    }

    #[test]
    fn entities_critical_past_the_grace_period_draw_penalties() {
        let weights = RepresentativeWeights {
            grace_period_days: Some(90),
            penalty_per_entity: 5.0,
            ..RepresentativeWeights::default()
        };
        let mut entries = facts(&[
            ("sta-508", Some(80.0), Some(90.0)),
            ("sta-509", Some(40.0), None),
        ]);
        entries[1].critical_since = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        let score =
            score_representative(&entries, &weights, noon()).expect("jurisdiction scores");
        assert!((score - 64.0).abs() < 1e-9);
    }

    #[test]
    fn entities_inside_the_grace_period_are_spared() {
        let weights = RepresentativeWeights {
            grace_period_days: Some(90),
            penalty_per_entity: 5.0,
            ..RepresentativeWeights::default()
        };
        let mut entries = facts(&[
            ("sta-508", Some(80.0), Some(90.0)),
            ("sta-509", Some(40.0), None),
        ]);
        entries[1].critical_since = Some(Utc.with_ymd_and_hms(2026, 5, 20, 0, 0, 0).unwrap());

        let score =
            score_representative(&entries, &weights, noon()).expect("jurisdiction scores");
        assert!((score - 69.0).abs() < 1e-9);
    }

    #[test]
    fn score_clamps_to_zero_under_heavy_penalties() {
        let weights = RepresentativeWeights {
            grace_period_days: Some(0),
            penalty_per_entity: 80.0,
            ..RepresentativeWeights::default()
        };
        let mut entries = facts(&[("sta-508", Some(10.0), None)]);
        entries[0].critical_since = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        let score =
            score_representative(&entries, &weights, noon()).expect("jurisdiction scores");
        assert_eq!(score, 0.0);
    }
}
