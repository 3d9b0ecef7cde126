//! Partial-credit strategies.
//!
//! Each strategy turns raw match counts into a fraction in `[0, 1]`. The
//! fraction is multiplied by the question's `pointsPossible` when the
//! result is built. Evaluators only call these where the question type
//! defines partial credit; nothing here decides *whether* partial credit
//! applies.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Clamped ratio; an empty or non-finite denominator scores zero.
pub fn ratio(matched: f64, total: f64) -> f64 {
    if !matched.is_finite() || !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    (matched / total).clamp(0.0, 1.0)
}

/// `proportional`: share of the total weight that was earned.
///
/// Negative weights count as zero.
pub fn proportional<I>(weights: I) -> f64
where
    I: IntoIterator<Item = (f64, bool)>,
{
    let (earned, total) = weights
        .into_iter()
        .fold((0.0, 0.0), |(earned, total), (weight, hit)| {
            let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
            (if hit { earned + weight } else { earned }, total + weight)
        });
    ratio(earned, total)
}

/// `per_pair`: correct pairs over the pair count being judged.
pub fn per_pair(correct_pairs: usize, total_pairs: usize) -> f64 {
    ratio(correct_pairs as f64, total_pairs as f64)
}

/// Outcome of the `adjacent_pairs` strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacentPairsScore {
    /// Adjacent pairs of the submission that are also adjacent, in the same
    /// direction, in the correct order.
    pub matched: usize,
    /// `n - 1`, where `n` is the item count.
    pub total: usize,
    pub fraction: f64,
}

/// `adjacent_pairs`: direction-sensitive adjacency agreement.
///
/// For each consecutive `(x, y)` in `submitted`, counts one if `y`
/// immediately follows `x` in `correct_order`. The denominator is `n - 1`
/// with `n` the longer of the two sequences, so padding a submission with
/// extra items never raises its score.
pub fn adjacent_pairs(submitted: &[String], correct_order: &[String]) -> AdjacentPairsScore {
    let successors: HashSet<(&str, &str)> = correct_order
        .windows(2)
        .map(|w| (w[0].as_str(), w[1].as_str()))
        .collect();

    let matched = submitted
        .windows(2)
        .filter(|w| successors.contains(&(w[0].as_str(), w[1].as_str())))
        .count();
    let total = correct_order.len().max(submitted.len()).saturating_sub(1);

    AdjacentPairsScore {
        matched,
        total,
        fraction: ratio(matched as f64, total as f64),
    }
}
