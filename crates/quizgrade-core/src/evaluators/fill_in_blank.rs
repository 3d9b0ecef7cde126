//! Fill-in-the-blank evaluator.

use crate::model::FillInBlankContent;
use crate::results::{BlankVerdict, Evaluation, FillInBlankDetails, GradingDetails, Outcome};

/// Trim and lower-case a blank answer for comparison.
pub fn fold(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Position-wise membership check; every blank must match.
///
/// Missing blanks count as empty answers. Answers beyond the last blank are
/// ignored. `case_sensitive` on a blank is not applied.
pub fn evaluate(content: &FillInBlankContent, submitted: &[String]) -> Evaluation {
    let blanks: Vec<BlankVerdict> = content
        .blanks
        .iter()
        .enumerate()
        .map(|(index, blank)| {
            let answer = submitted.get(index).map(String::as_str).unwrap_or("");
            let folded = fold(answer);
            let correct = !folded.is_empty()
                && blank.accepted_answers.iter().any(|a| fold(a) == folded);
            BlankVerdict {
                index,
                id: blank.id.clone(),
                submitted: answer.to_string(),
                correct,
            }
        })
        .collect();

    let total_blanks = blanks.len();
    let correct_blanks = blanks.iter().filter(|b| b.correct).count();
    let outcome = if total_blanks > 0 && correct_blanks == total_blanks {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    };

    Evaluation::new(
        outcome,
        GradingDetails::FillInBlank(FillInBlankDetails {
            blanks,
            correct_blanks,
            total_blanks,
        }),
    )
}
