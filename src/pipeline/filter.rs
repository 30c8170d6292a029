use crate::models::ScoredMatch;

use super::scoring::ConfidenceScorer;

/// Keep the matches the scorer considers interesting, in input order,
/// truncated to the first `cap` when given.
pub fn filter_matches(
    scored: Vec<ScoredMatch>,
    scorer: &dyn ConfidenceScorer,
    cap: Option<usize>,
) -> Vec<ScoredMatch> {
    scored
        .into_iter()
        .filter(|m| scorer.qualifies(m))
        .take(cap.unwrap_or(usize::MAX))
        .collect()
}
