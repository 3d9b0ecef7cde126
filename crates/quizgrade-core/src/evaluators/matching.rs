//! Matching evaluator.

use std::collections::HashSet;

use crate::model::{MatchPair, MatchingContent, PartialCreditStrategy};
use crate::partial_credit;
use crate::results::{Evaluation, GradingDetails, MatchingDetails, Outcome, PairVerdict};

/// Check each submitted pair for membership in `correct_pairs`.
///
/// Exact duplicate submissions count once. The response is correct when
/// every submitted pair is correct and exactly `total_pairs` were submitted.
/// Under `per_pair`, the fraction is `correct / max(total, submitted)` so
/// extra guesses cannot reach full credit.
pub fn evaluate(content: &MatchingContent, submitted: &[MatchPair]) -> Evaluation {
    let correct: HashSet<&MatchPair> = content.correct_pairs.iter().collect();
    let total_pairs = correct.len();

    let mut seen = HashSet::new();
    let pairs: Vec<PairVerdict> = submitted
        .iter()
        .filter(|pair| seen.insert(*pair))
        .map(|pair| PairVerdict {
            pair: pair.clone(),
            correct: correct.contains(pair),
        })
        .collect();

    let submitted_pairs = pairs.len();
    let correct_pairs = pairs.iter().filter(|p| p.correct).count();
    let all_correct = correct_pairs == submitted_pairs && submitted_pairs == total_pairs;

    let strategy = content.partial_credit_strategy;
    let outcome = if all_correct && total_pairs > 0 {
        Outcome::Correct
    } else if strategy == Some(PartialCreditStrategy::PerPair) {
        Outcome::Partial(partial_credit::per_pair(
            correct_pairs,
            total_pairs.max(submitted_pairs),
        ))
    } else {
        Outcome::Incorrect
    };

    Evaluation::new(
        outcome,
        GradingDetails::Matching(MatchingDetails {
            correct_pairs,
            total_pairs,
            submitted_pairs,
            pairs,
            strategy,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(strategy: Option<PartialCreditStrategy>) -> MatchingContent {
        MatchingContent {
            left_items: vec![],
            right_items: vec![],
            correct_pairs: vec![
                MatchPair::new("H", "Hydrogen"),
                MatchPair::new("O", "Oxygen"),
                MatchPair::new("N", "Nitrogen"),
            ],
            partial_credit_strategy: strategy,
        }
    }

    fn details(eval: &Evaluation) -> &MatchingDetails {
        match &eval.details {
            GradingDetails::Matching(d) => d,
            other => panic!("expected matching details, got {other:?}"),
        }
    }

    #[test]
    fn all_pairs_correct() {
        let eval = evaluate(
            &content(None),
            &[
                MatchPair::new("O", "Oxygen"),
                MatchPair::new("H", "Hydrogen"),
                MatchPair::new("N", "Nitrogen"),
            ],
        );
        assert_eq!(eval.outcome, Outcome::Correct);
        assert_eq!(details(&eval).correct_pairs, 3);
    }

    #[test]
    fn two_of_three_per_pair() {
        let eval = evaluate(
            &content(Some(PartialCreditStrategy::PerPair)),
            &[MatchPair::new("H", "Hydrogen"), MatchPair::new("O", "Oxygen")],
        );
        let d = details(&eval);
        assert_eq!((d.correct_pairs, d.total_pairs), (2, 3));
        match eval.outcome {
            Outcome::Partial(f) => assert!((f - 2.0 / 3.0).abs() < 1e-12),
            other => panic!("expected partial, got {other:?}"),
        }
    }

    #[test]
    fn missing_pairs_without_strategy_is_incorrect() {
        let eval = evaluate(
            &content(None),
            &[MatchPair::new("H", "Hydrogen"), MatchPair::new("O", "Oxygen")],
        );
        assert_eq!(eval.outcome, Outcome::Incorrect);
    }

    #[test]
    fn wrong_pair_is_flagged() {
        let eval = evaluate(
            &content(Some(PartialCreditStrategy::PerPair)),
            &[
                MatchPair::new("H", "Oxygen"),
                MatchPair::new("O", "Hydrogen"),
                MatchPair::new("N", "Nitrogen"),
            ],
        );
        let d = details(&eval);
        assert_eq!(d.correct_pairs, 1);
        assert!(!d.pairs[0].correct);
        assert!(d.pairs[2].correct);
    }

    #[test]
    fn extra_guess_cannot_reach_full_credit() {
        let eval = evaluate(
            &content(Some(PartialCreditStrategy::PerPair)),
            &[
                MatchPair::new("H", "Hydrogen"),
                MatchPair::new("O", "Oxygen"),
                MatchPair::new("N", "Nitrogen"),
                MatchPair::new("N", "Neon"),
            ],
        );
        match eval.outcome {
            Outcome::Partial(f) => assert!((f - 0.75).abs() < 1e-12),
            other => panic!("expected partial, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_pairs_count_once() {
        let eval = evaluate(
            &content(None),
            &[
                MatchPair::new("H", "Hydrogen"),
                MatchPair::new("H", "Hydrogen"),
                MatchPair::new("O", "Oxygen"),
                MatchPair::new("N", "Nitrogen"),
            ],
        );
        assert_eq!(eval.outcome, Outcome::Correct);
        assert_eq!(details(&eval).submitted_pairs, 3);
    }

    #[test]
    fn adjacent_strategy_is_not_applied_to_matching() {
        let eval = evaluate(
            &content(Some(PartialCreditStrategy::AdjacentPairs)),
            &[MatchPair::new("H", "Hydrogen")],
        );
        assert_eq!(eval.outcome, Outcome::Incorrect);
    }
}
