//! Failure-weighted performance scoring.
//!
//! Facilities start from a perfect 100 and lose the configured weight per
//! observed issue category. Aggregates blend the mean of the lowest half of
//! their children with the single worst child, so one dangerous facility
//! cannot hide behind many adequate ones.

use std::collections::{BTreeMap, BTreeSet};

use super::super::domain::IssueTag;
use super::ScoreError;

/// Score a facility from its observed issue categories.
///
/// A tag missing from the severity table is rejected rather than skipped;
/// silently dropping a deduction would overstate the score.
pub fn score_facility(
    issue_tags: &BTreeSet<IssueTag>,
    severity_table: &BTreeMap<IssueTag, f64>,
) -> Result<f64, ScoreError> {
    let mut score = 100.0;
    for tag in issue_tags {
        let weight = severity_table
            .get(tag)
            .ok_or_else(|| ScoreError::UnknownIssueTag(tag.clone()))?;
        score -= weight;
    }
    Ok(score.clamp(0.0, 100.0))
}

/// Aggregate a tier from its children's performance scores.
pub fn score_aggregate(child_scores: &[f64]) -> Result<f64, ScoreError> {
    if child_scores.is_empty() {
        return Err(ScoreError::InsufficientData);
    }
    Ok(failure_weighted(child_scores))
}

/// Mean of the lowest `ceil(n / 2)` scores blended with the minimum. The
/// half-count rounds up so a lone worst performer is never averaged away.
pub(crate) fn failure_weighted(scores: &[f64]) -> f64 {
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let low_count = sorted.len().div_ceil(2);
    let low_mean = sorted[..low_count].iter().sum::<f64>() / low_count as f64;

    (low_mean + sorted[0]) / 2.0
}
