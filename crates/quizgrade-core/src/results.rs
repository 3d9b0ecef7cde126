//! Grading result types and the result builder.
//!
//! Evaluators describe *what* they found as an `Evaluation` (an outcome plus
//! type-specific details). `GradingResult::build` turns that into the
//! record callers persist, and is the only place points are computed, so
//! the score invariants hold for every question type:
//!
//! - `0 <= points_earned <= points_possible`
//! - `is_correct` implies `points_earned == points_possible`
//! - only auto-graded results claim correctness

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GradingError;
use crate::model::{MatchPair, PartialCreditStrategy, QuestionType};

/// Where a graded response sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingStatus {
    /// Score finalized by the engine.
    AutoGraded,
    /// Needs a human (short answers, sandbox failures).
    PendingManualReview,
    /// Finalized by the manual-grading workflow.
    Graded,
}

impl fmt::Display for GradingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingStatus::AutoGraded => write!(f, "auto_graded"),
            GradingStatus::PendingManualReview => write!(f, "pending_manual_review"),
            GradingStatus::Graded => write!(f, "graded"),
        }
    }
}

/// What an evaluator concluded, before points are attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Correct,
    Incorrect,
    /// Fraction of full credit from a partial-credit strategy.
    Partial(f64),
    /// The engine cannot finalize this response.
    PendingReview,
}

/// Evaluator output: an outcome plus the details shown to the learner.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub outcome: Outcome,
    pub details: GradingDetails,
}

impl Evaluation {
    pub fn new(outcome: Outcome, details: GradingDetails) -> Self {
        Self { outcome, details }
    }
}

/// The final grading record for one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub points_earned: f64,
    pub points_possible: f64,
    pub is_correct: bool,
    pub auto_graded: bool,
    pub status: GradingStatus,
    pub grading_details: GradingDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl GradingResult {
    /// Assemble a result from an evaluation.
    ///
    /// `points_possible` always comes from the trusted question definition.
    pub fn build(points_possible: f64, evaluation: Evaluation, with_feedback: bool) -> Self {
        let points_possible = if points_possible.is_finite() {
            points_possible.max(0.0)
        } else {
            0.0
        };

        let outcome = match evaluation.outcome {
            Outcome::Partial(fraction) if !fraction.is_finite() || fraction <= 0.0 => {
                Outcome::Incorrect
            }
            Outcome::Partial(fraction) if fraction >= 1.0 => Outcome::Correct,
            other => other,
        };

        let (points_earned, is_correct, auto_graded, status) = match outcome {
            Outcome::Correct => (points_possible, true, true, GradingStatus::AutoGraded),
            Outcome::Incorrect => (0.0, false, true, GradingStatus::AutoGraded),
            Outcome::Partial(fraction) => (
                (points_possible * fraction).min(points_possible),
                false,
                true,
                GradingStatus::AutoGraded,
            ),
            Outcome::PendingReview => (0.0, false, false, GradingStatus::PendingManualReview),
        };

        let feedback = with_feedback.then(|| feedback_for(outcome, &evaluation.details));

        GradingResult {
            points_earned,
            points_possible,
            is_correct,
            auto_graded,
            status,
            grading_details: evaluation.details,
            feedback,
        }
    }

    /// Apply the score decided by the manual-grading workflow.
    ///
    /// Only results awaiting review can transition, and the score must lie
    /// within `0..=points_possible`.
    pub fn apply_manual_grade(
        mut self,
        points: f64,
        feedback: Option<String>,
    ) -> Result<Self, GradingError> {
        if self.status != GradingStatus::PendingManualReview {
            return Err(GradingError::InvalidTransition { from: self.status });
        }
        if !points.is_finite() || points < 0.0 || points > self.points_possible {
            return Err(GradingError::ManualGradeOutOfRange {
                points,
                points_possible: self.points_possible,
            });
        }

        self.points_earned = points;
        self.is_correct = points == self.points_possible;
        self.status = GradingStatus::Graded;
        if feedback.is_some() {
            self.feedback = feedback;
        }
        Ok(self)
    }

    /// Fraction of the available points earned, or 0 for zero-point questions.
    pub fn score_fraction(&self) -> f64 {
        if self.points_possible > 0.0 {
            self.points_earned / self.points_possible
        } else {
            0.0
        }
    }
}

/// Type-specific grading explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GradingDetails {
    MultipleChoiceSingle(SingleChoiceDetails),
    MultipleChoiceMulti(MultiChoiceDetails),
    TrueFalse(TrueFalseDetails),
    Matching(MatchingDetails),
    Ordering(OrderingDetails),
    FillInBlank(FillInBlankDetails),
    ShortAnswer(ShortAnswerDetails),
    ProgramSubmission(ProgramDetails),
    /// The payload could not be read for the question's type.
    MalformedAnswer(MalformedAnswerDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleChoiceDetails {
    pub selected: String,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChoiceDetails {
    pub selected: Vec<String>,
    pub correct_answers: Vec<String>,
    /// Correct ids the learner did not select.
    pub missing: Vec<String>,
    /// Selected ids that are not correct.
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalseDetails {
    pub selected: bool,
    pub correct_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairVerdict {
    #[serde(flatten)]
    pub pair: MatchPair,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingDetails {
    pub correct_pairs: usize,
    pub total_pairs: usize,
    pub submitted_pairs: usize,
    pub pairs: Vec<PairVerdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<PartialCreditStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingDetails {
    pub submitted: Vec<String>,
    pub correct_order: Vec<String>,
    /// Items sitting at their correct index (informational only).
    pub correct_positions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_adjacent_pairs: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_adjacent_pairs: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<PartialCreditStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankVerdict {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub submitted: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInBlankDetails {
    pub blanks: Vec<BlankVerdict>,
    pub correct_blanks: usize,
    pub total_blanks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordHit {
    pub keyword: String,
    pub found: bool,
    /// The keyword or synonym that matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_term: Option<String>,
    pub weight: f64,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortAnswerDetails {
    pub word_count: usize,
    pub character_count: usize,
    pub keywords: Vec<KeywordHit>,
    pub keyword_score: f64,
    pub all_required_found: bool,
    pub within_word_limits: bool,
    /// Assistive only; never applied as `points_earned`.
    pub suggested_points: f64,
}

/// One externally executed test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub passed: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub timed_out: bool,
}

fn default_weight() -> f64 {
    1.0
}

impl TestResult {
    /// A failed result for a test the sandbox never completed.
    pub fn runtime_errored(test_id: impl Into<String>, weight: f64, error: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            name: None,
            passed: false,
            weight,
            execution_time_ms: 0,
            error: Some(error.into()),
            timed_out: false,
        }
    }

    /// A failed result for a test that exceeded its time budget.
    pub fn timed_out(test_id: impl Into<String>, weight: f64, limit_ms: u64) -> Self {
        Self {
            test_id: test_id.into(),
            name: None,
            passed: false,
            weight,
            execution_time_ms: limit_ms,
            error: Some(format!("timed out after {limit_ms}ms")),
            timed_out: true,
        }
    }
}

/// What the external sandbox produced for a program submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SandboxExecution {
    /// Every test case ran (possibly failing or timing out).
    #[serde(rename_all = "camelCase")]
    Completed {
        test_results: Vec<TestResult>,
        #[serde(default)]
        syntax_errors: Vec<String>,
        #[serde(default)]
        runtime_errors: Vec<String>,
    },
    /// The sandbox could not be reached or the run was cancelled.
    #[serde(rename_all = "camelCase")]
    Failed {
        reason: String,
        #[serde(default)]
        completed: Vec<TestResult>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDetails {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub weighted_score: f64,
    pub test_results: Vec<TestResult>,
    pub syntax_errors: Vec<String>,
    pub runtime_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MalformedAnswerDetails {
    pub question_type: QuestionType,
    pub reason: String,
}

fn feedback_for(outcome: Outcome, details: &GradingDetails) -> String {
    match details {
        GradingDetails::MalformedAnswer(_) => {
            "Your answer could not be read for this question.".to_string()
        }
        GradingDetails::ShortAnswer(_) => "Submitted for instructor review.".to_string(),
        GradingDetails::ProgramSubmission(p) if p.sandbox_error.is_some() => {
            "Your code could not be run right now; it has been queued for review.".to_string()
        }
        GradingDetails::ProgramSubmission(p) if !p.syntax_errors.is_empty() => {
            "Your code did not compile.".to_string()
        }
        GradingDetails::ProgramSubmission(p) => {
            format!("{} of {} tests passed.", p.passed, p.total)
        }
        GradingDetails::Matching(m) if matches!(outcome, Outcome::Partial(_)) => {
            format!("{} of {} pairs matched correctly.", m.correct_pairs, m.total_pairs)
        }
        GradingDetails::Ordering(o) if matches!(outcome, Outcome::Partial(_)) => format!(
            "{} of {} neighbouring items are in the right order.",
            o.correct_adjacent_pairs.unwrap_or(0),
            o.total_adjacent_pairs.unwrap_or(0)
        ),
        GradingDetails::FillInBlank(f) if outcome != Outcome::Correct => {
            format!("{} of {} blanks are correct.", f.correct_blanks, f.total_blanks)
        }
        _ => match outcome {
            Outcome::Correct => "Correct.".to_string(),
            Outcome::PendingReview => "Submitted for instructor review.".to_string(),
            _ => "Incorrect.".to_string(),
        },
    }
}
