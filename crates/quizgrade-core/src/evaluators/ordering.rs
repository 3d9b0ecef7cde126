//! Ordering evaluator.

use crate::model::{OrderingContent, PartialCreditStrategy};
use crate::partial_credit;
use crate::results::{Evaluation, GradingDetails, OrderingDetails, Outcome};

/// Element-for-element comparison with `correct_order`, plus
/// direction-sensitive adjacency credit under `adjacent_pairs`.
pub fn evaluate(content: &OrderingContent, submitted: &[String]) -> Evaluation {
    let correct_order = &content.correct_order;
    let correct_positions = submitted
        .iter()
        .zip(correct_order)
        .filter(|(a, b)| a == b)
        .count();

    let strategy = content.partial_credit_strategy;
    let adjacency = (strategy == Some(PartialCreditStrategy::AdjacentPairs))
        .then(|| partial_credit::adjacent_pairs(submitted, correct_order));

    let outcome = if !correct_order.is_empty() && submitted == correct_order.as_slice() {
        Outcome::Correct
    } else if let Some(score) = adjacency {
        // Only an exact match earns full credit.
        Outcome::Partial(score.fraction.min(1.0 - f64::EPSILON))
    } else {
        Outcome::Incorrect
    };

    Evaluation::new(
        outcome,
        GradingDetails::Ordering(OrderingDetails {
            submitted: submitted.to_vec(),
            correct_order: correct_order.clone(),
            correct_positions,
            correct_adjacent_pairs: adjacency.map(|s| s.matched),
            total_adjacent_pairs: adjacency.map(|s| s.total),
            strategy,
        }),
    )
}
