//! Score threshold with a minimum-result guarantee.

use crate::search::types::Candidate;

/// Drops candidates scoring below `threshold`.
///
/// When fewer than `min_results` candidates pass but the pool holds at least
/// `min_results`, the top `min_results` are kept regardless of score. Input must
/// be sorted by descending `final_score`; order is preserved.
pub fn apply_threshold(
    mut candidates: Vec<Candidate>,
    threshold: Option<f32>,
    min_results: usize,
) -> Vec<Candidate> {
    let Some(threshold) = threshold else {
        return candidates;
    };
    let passing = candidates
        .iter()
        .filter(|c| c.final_score >= threshold)
        .count();
    if passing < min_results && candidates.len() >= min_results {
        candidates.truncate(min_results);
    } else {
        candidates.retain(|c| c.final_score >= threshold);
    }
    candidates
}
