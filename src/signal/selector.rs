//! Candidate selection

use super::ScoreResult;
use std::cmp::Ordering;

/// Order scores strictly descending, ties broken by ascending code
pub fn rank_candidates(scores: impl IntoIterator<Item = ScoreResult>) -> Vec<ScoreResult> {
    let mut ranked: Vec<ScoreResult> = scores.into_iter().collect();
    ranked.sort_by(compare);
    ranked
}

/// The best `k` scores
pub fn top_k(scores: impl IntoIterator<Item = ScoreResult>, k: usize) -> Vec<ScoreResult> {
    let mut ranked = rank_candidates(scores);
    ranked.truncate(k);
    ranked
}

fn compare(a: &ScoreResult, b: &ScoreResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.code.cmp(&b.code))
}
