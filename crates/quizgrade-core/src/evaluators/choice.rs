//! Multiple choice (single and multi) and true/false evaluators.

use std::collections::BTreeSet;

use crate::model::{MultiChoiceContent, SingleChoiceContent, TrueFalseContent};
use crate::results::{
    Evaluation, GradingDetails, MultiChoiceDetails, Outcome, SingleChoiceDetails, TrueFalseDetails,
};

/// Exact, case-sensitive id match. No partial credit.
pub fn evaluate_single(content: &SingleChoiceContent, selected: &str) -> Evaluation {
    let outcome = if selected == content.correct_answer {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    Evaluation::new(
        outcome,
        GradingDetails::MultipleChoiceSingle(SingleChoiceDetails {
            selected: selected.to_string(),
            correct_answer: content.correct_answer.clone(),
        }),
    )
}

/// Set equality against `correct_answers`, ignoring order and duplicates.
///
/// `partial_credit_rule` is deliberately not consulted: a subset of the
/// correct answers scores zero.
pub fn evaluate_multi(content: &MultiChoiceContent, selected: &BTreeSet<String>) -> Evaluation {
    let correct: BTreeSet<String> = content.correct_answers.iter().cloned().collect();

    let missing: Vec<String> = correct.difference(selected).cloned().collect();
    let extra: Vec<String> = selected.difference(&correct).cloned().collect();
    let outcome = if missing.is_empty() && extra.is_empty() {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    Evaluation::new(
        outcome,
        GradingDetails::MultipleChoiceMulti(MultiChoiceDetails {
            selected: selected.iter().cloned().collect(),
            correct_answers: correct.into_iter().collect(),
            missing,
            extra,
        }),
    )
}

pub fn evaluate_true_false(content: &TrueFalseContent, selected: bool) -> Evaluation {
    let outcome = if selected == content.correct_answer {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    Evaluation::new(
        outcome,
        GradingDetails::TrueFalse(TrueFalseDetails {
            selected,
            correct_answer: content.correct_answer,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(correct: &str) -> SingleChoiceContent {
        SingleChoiceContent {
            options: vec![],
            correct_answer: correct.into(),
        }
    }

    fn multi(correct: &[&str]) -> MultiChoiceContent {
        MultiChoiceContent {
            options: vec![],
            correct_answers: correct.iter().map(|s| s.to_string()).collect(),
            partial_credit_rule: Some("proportional".into()),
        }
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_choice_exact_match() {
        assert_eq!(evaluate_single(&single("b"), "b").outcome, Outcome::Correct);
        assert_eq!(evaluate_single(&single("b"), "a").outcome, Outcome::Incorrect);
    }

    #[test]
    fn single_choice_is_case_sensitive() {
        assert_eq!(evaluate_single(&single("b"), "B").outcome, Outcome::Incorrect);
    }

    #[test]
    fn multi_choice_set_equality() {
        let content = multi(&["a", "c"]);
        assert_eq!(evaluate_multi(&content, &set(&["c", "a"])).outcome, Outcome::Correct);
    }

    #[test]
    fn multi_choice_subset_gets_nothing() {
        let eval = evaluate_multi(&multi(&["a", "c"]), &set(&["a"]));
        assert_eq!(eval.outcome, Outcome::Incorrect);
        let GradingDetails::MultipleChoiceMulti(details) = eval.details else {
            panic!("expected multi choice details");
        };
        assert_eq!(details.missing, vec!["c".to_string()]);
        assert!(details.extra.is_empty());
    }

    #[test]
    fn multi_choice_superset_is_incorrect() {
        let eval = evaluate_multi(&multi(&["a", "c"]), &set(&["a", "b", "c"]));
        assert_eq!(eval.outcome, Outcome::Incorrect);
        let GradingDetails::MultipleChoiceMulti(details) = eval.details else {
            panic!("expected multi choice details");
        };
        assert_eq!(details.extra, vec!["b".to_string()]);
    }

    #[test]
    fn duplicate_correct_answers_collapse() {
        let eval = evaluate_multi(&multi(&["a", "a", "c"]), &set(&["a", "c"]));
        assert_eq!(eval.outcome, Outcome::Correct);
    }

    #[test]
    fn true_false() {
        let content = TrueFalseContent {
            correct_answer: false,
        };
        assert_eq!(evaluate_true_false(&content, false).outcome, Outcome::Correct);
        assert_eq!(evaluate_true_false(&content, true).outcome, Outcome::Incorrect);
    }
}
