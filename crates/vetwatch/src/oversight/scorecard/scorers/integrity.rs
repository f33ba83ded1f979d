//! Deduction-based integrity scoring with first-class absence.
//!
//! An entity with zero recorded events has no integrity score at all, and
//! callers must render that distinctly from a verified-clean 100. Coercing
//! absence to a number in either direction fabricates an accountability
//! signal that nobody collected.

use super::super::domain::IntegrityEvent;
use super::performance::failure_weighted;

/// Score a facility from the integrity events charged against it, or report
/// absence when nothing is on record.
pub fn score_from_events(events: &[&IntegrityEvent]) -> Option<f64> {
    if events.is_empty() {
        return None;
    }
    let deductions: f64 = events.iter().map(|event| event.severity).sum();
    Some((100.0 - deductions).clamp(0.0, 100.0))
}

/// Aggregate children's integrity scores over the children that have one.
///
/// Absent children are excluded rather than defaulted, so an unscored child
/// neither inflates nor deflates the parent. A tier with no data anywhere
/// stays absent itself.
pub fn score_aggregate(child_scores: &[Option<f64>]) -> Option<f64> {
    let scored: Vec<f64> = child_scores.iter().filter_map(|score| *score).collect();
    if scored.is_empty() {
        return None;
    }
    Some(failure_weighted(&scored))
}
