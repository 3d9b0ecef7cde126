//! Per-question-type evaluators.
//!
//! Each evaluator compares a canonical answer against the question's
//! content and returns an `Evaluation`. Evaluators never compute points;
//! the result builder does.

pub mod choice;
pub mod fill_in_blank;
pub mod matching;
pub mod ordering;
pub mod program;
pub mod short_answer;

use crate::model::QuestionType;
use crate::normalize::MalformedAnswer;
use crate::results::{Evaluation, GradingDetails, MalformedAnswerDetails, Outcome};

/// Fail-open evaluation for a payload the normalizer rejected.
pub fn malformed(question_type: QuestionType, error: &MalformedAnswer) -> Evaluation {
    Evaluation::new(
        Outcome::Incorrect,
        GradingDetails::MalformedAnswer(MalformedAnswerDetails {
            question_type,
            reason: error.to_string(),
        }),
    )
}
