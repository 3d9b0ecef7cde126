//! Central grading engine.
//!
//! Routes a raw answer payload through normalization, the evaluator for the
//! question's type and the result builder. The engine holds no state between
//! calls; it is safe to share and call concurrently.

use serde_json::Value;

use crate::error::GradingError;
use crate::evaluators::{self, choice, fill_in_blank, matching, ordering, program, short_answer};
use crate::model::{QuestionContent, QuestionDefinition};
use crate::normalize::{normalize, CanonicalAnswer, MalformedAnswer};
use crate::results::{Evaluation, GradingResult, SandboxExecution};

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingConfig {
    /// Attach a short human-readable feedback string to each result.
    pub include_feedback: bool,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            include_feedback: true,
        }
    }
}

/// The grading engine.
#[derive(Debug, Clone, Default)]
pub struct GradingEngine {
    config: GradingConfig,
}

impl GradingEngine {
    pub fn new(config: GradingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    /// Grade a response. Program submissions graded this way have no
    /// execution results and go to manual review.
    pub fn evaluate(&self, question: &QuestionDefinition, answer: &Value) -> GradingResult {
        self.evaluate_with_execution(question, answer, None)
    }

    /// Grade a response, supplying the sandbox execution record for
    /// program submissions. `execution` is ignored for other types.
    pub fn evaluate_with_execution(
        &self,
        question: &QuestionDefinition,
        answer: &Value,
        execution: Option<&SandboxExecution>,
    ) -> GradingResult {
        let question_type = question.question_type();
        let evaluation = dispatch(question, answer, execution).unwrap_or_else(|e| {
            tracing::warn!(%question_type, error = %e, "malformed answer payload");
            evaluators::malformed(question_type, &e)
        });

        let result = GradingResult::build(
            question.points_possible,
            evaluation,
            self.config.include_feedback,
        );
        tracing::debug!(
            %question_type,
            points_earned = result.points_earned,
            points_possible = result.points_possible,
            status = %result.status,
            "evaluated response"
        );
        result
    }

    /// Grade against a question definition given as JSON.
    ///
    /// Unknown question types and unparseable definitions are returned as
    /// errors; the caller must treat the response as ungraded.
    pub fn evaluate_json(
        &self,
        question: &Value,
        answer: &Value,
        execution: Option<&SandboxExecution>,
    ) -> Result<GradingResult, GradingError> {
        let question = QuestionDefinition::from_json(question)?;
        Ok(self.evaluate_with_execution(&question, answer, execution))
    }
}

fn dispatch(
    question: &QuestionDefinition,
    answer: &Value,
    execution: Option<&SandboxExecution>,
) -> Result<Evaluation, MalformedAnswer> {
    let question_type = question.question_type();
    Ok(match (&question.content, normalize(question_type, answer)?) {
        (QuestionContent::MultipleChoiceSingle(c), CanonicalAnswer::SingleChoice(selected)) => {
            choice::evaluate_single(c, &selected)
        }
        (QuestionContent::MultipleChoiceMulti(c), CanonicalAnswer::MultiChoice(selected)) => {
            choice::evaluate_multi(c, &selected)
        }
        (QuestionContent::TrueFalse(c), CanonicalAnswer::TrueFalse(selected)) => {
            choice::evaluate_true_false(c, selected)
        }
        (QuestionContent::Matching(c), CanonicalAnswer::Matching(pairs)) => {
            matching::evaluate(c, &pairs)
        }
        (QuestionContent::Ordering(c), CanonicalAnswer::Ordering(order)) => {
            ordering::evaluate(c, &order)
        }
        (QuestionContent::FillInBlank(c), CanonicalAnswer::FillInBlank(blanks)) => {
            fill_in_blank::evaluate(c, &blanks)
        }
        (QuestionContent::ShortAnswer(c), CanonicalAnswer::ShortAnswer(text)) => {
            short_answer::evaluate(c, &text, question.points_possible)
        }
        (QuestionContent::ProgramSubmission(c), CanonicalAnswer::Program(submission)) => {
            program::evaluate(c, &submission, execution)
        }
        (_, canonical) => {
            return Err(MalformedAnswer {
                expected: question_type.as_str(),
                found: format!("a {} answer", canonical.question_type()),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{GradingDetails, GradingStatus, TestResult};
    use serde_json::json;

    fn engine() -> GradingEngine {
        GradingEngine::default()
    }

    fn question(value: Value) -> QuestionDefinition {
        QuestionDefinition::from_json(&value).unwrap()
    }

    fn single_choice() -> QuestionDefinition {
        question(json!({
            "questionType": "multiple_choice_single",
            "pointsPossible": 2,
            "content": {
                "options": [{"id": "a", "text": "Mercury"}, {"id": "b", "text": "Venus"}],
                "correctAnswer": "b"
            }
        }))
    }

    fn multi_choice() -> QuestionDefinition {
        question(json!({
            "questionType": "multiple_choice_multi",
            "pointsPossible": 1,
            "content": {"correctAnswers": ["a", "c"], "partialCreditRule": "proportional"}
        }))
    }

    #[test]
    fn single_choice_correct_and_incorrect() {
        let q = single_choice();
        let right = engine().evaluate(&q, &json!("b"));
        assert_eq!(right.points_earned, 2.0);
        assert!(right.is_correct);

        let wrong = engine().evaluate(&q, &json!({"selectedOption": "a"}));
        assert_eq!(wrong.points_earned, 0.0);
        assert!(!wrong.is_correct);
        assert!(wrong.auto_graded);
    }

    #[test]
    fn single_choice_is_case_sensitive() {
        let result = engine().evaluate(&single_choice(), &json!("B"));
        assert!(!result.is_correct);
    }

    #[test]
    fn multi_choice_ignores_order_and_duplicates() {
        let q = multi_choice();
        assert!(engine().evaluate(&q, &json!(["c", "a"])).is_correct);
        assert!(engine().evaluate(&q, &json!(["a", "c", "a"])).is_correct);
        assert!(engine().evaluate(&q, &json!({"selectedOptions": ["a", "c"]})).is_correct);

        let partial = engine().evaluate(&q, &json!(["a"]));
        assert!(!partial.is_correct);
        assert_eq!(partial.points_earned, 0.0);
    }

    #[test]
    fn matching_per_pair_scales_points() {
        let q = question(json!({
            "questionType": "matching",
            "pointsPossible": 3,
            "content": {
                "correctPairs": [
                    {"left": "H", "right": "Hydrogen"},
                    {"left": "O", "right": "Oxygen"},
                    {"left": "N", "right": "Nitrogen"}
                ],
                "partialCreditStrategy": "per_pair"
            }
        }));
        let result = engine().evaluate(
            &q,
            &json!({"pairs": [
                {"left": "H", "right": "Hydrogen"},
                {"left": "O", "right": "Oxygen"}
            ]}),
        );
        assert!((result.points_earned - 2.0).abs() < 1e-9);
        assert!(!result.is_correct);
        let GradingDetails::Matching(d) = &result.grading_details else {
            panic!("expected matching details");
        };
        assert_eq!((d.correct_pairs, d.total_pairs), (2, 3));
    }

    #[test]
    fn ordering_adjacent_pairs() {
        let q = question(json!({
            "questionType": "ordering",
            "pointsPossible": 3,
            "content": {
                "correctOrder": ["a", "b", "c", "d"],
                "partialCreditStrategy": "adjacent_pairs"
            }
        }));
        assert!(engine().evaluate(&q, &json!(["a", "b", "c", "d"])).is_correct);

        let result = engine().evaluate(&q, &json!({"order": ["a", "b", "d", "c"]}));
        assert!((result.points_earned - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fill_in_blank_folding() {
        let q = question(json!({
            "questionType": "fill_in_blank",
            "pointsPossible": 1,
            "content": {"blanks": [{"acceptedAnswers": ["paris"]}]}
        }));
        assert!(engine().evaluate(&q, &json!(["  Paris "])).is_correct);
        assert!(!engine().evaluate(&q, &json!(["paris!"])).is_correct);
    }

    #[test]
    fn short_answer_never_auto_graded() {
        let q = question(json!({
            "questionType": "short_answer",
            "pointsPossible": 5,
            "content": {"keywords": [{"keyword": "mitochondria"}]}
        }));
        let result = engine().evaluate(&q, &json!("The mitochondria is the powerhouse."));
        assert!(!result.auto_graded);
        assert!(!result.is_correct);
        assert_eq!(result.points_earned, 0.0);
        assert_eq!(result.status, GradingStatus::PendingManualReview);
        let GradingDetails::ShortAnswer(d) = &result.grading_details else {
            panic!("expected short answer details");
        };
        assert_eq!(d.suggested_points, 5.0);
    }

    #[test]
    fn program_submission_with_execution() {
        let q = question(json!({
            "questionType": "program_submission",
            "pointsPossible": 10,
            "content": {"testCases": [{"id": "t1", "weight": 1}, {"id": "t2", "weight": 3}]}
        }));
        let execution = SandboxExecution::Completed {
            test_results: vec![
                TestResult {
                    test_id: "t1".into(),
                    name: None,
                    passed: true,
                    weight: 1.0,
                    execution_time_ms: 5,
                    error: None,
                    timed_out: false,
                },
                TestResult::timed_out("t2", 3.0, 2000),
            ],
            syntax_errors: vec![],
            runtime_errors: vec![],
        };
        let result = engine().evaluate_with_execution(
            &q,
            &json!({"code": "print(1)", "language": "python"}),
            Some(&execution),
        );
        assert!((result.points_earned - 2.5).abs() < 1e-9);
        assert!(result.auto_graded);
    }

    #[test]
    fn program_submission_without_execution_is_pending() {
        let q = question(json!({
            "questionType": "program_submission",
            "pointsPossible": 10,
            "content": {"testCases": [{"id": "t1"}]}
        }));
        let result = engine().evaluate(&q, &json!("print(1)"));
        assert_eq!(result.status, GradingStatus::PendingManualReview);
        assert!(!result.auto_graded);
        assert_eq!(result.points_earned, 0.0);
    }

    #[test]
    fn malformed_payload_fails_open() {
        let q = single_choice();
        for payload in [
            json!(1),
            json!(null),
            json!({"selectedOption": "b", "pointsPossible": 100}),
            json!({"wrong": "b"}),
        ] {
            let result = engine().evaluate(&q, &payload);
            assert_eq!(result.points_earned, 0.0, "payload {payload}");
            assert!(!result.is_correct);
            assert!(matches!(
                result.grading_details,
                GradingDetails::MalformedAnswer(_)
            ));
        }
    }

    #[test]
    fn strings_are_not_coerced_to_booleans() {
        let q = question(json!({
            "questionType": "true_false",
            "pointsPossible": 1,
            "content": {"correctAnswer": true}
        }));
        assert!(engine().evaluate(&q, &json!(true)).is_correct);
        assert!(engine().evaluate(&q, &json!({"value": true})).is_correct);
        assert!(!engine().evaluate(&q, &json!("true")).is_correct);
    }

    #[test]
    fn unsupported_type_is_an_error() {
        let err = engine()
            .evaluate_json(
                &json!({"questionType": "essay", "pointsPossible": 1, "content": {}}),
                &json!("text"),
                None,
            )
            .unwrap_err();
        assert_eq!(err, GradingError::UnsupportedQuestionType("essay".into()));
    }

    #[test]
    fn invalid_definition_is_an_error() {
        let err = engine()
            .evaluate_json(
                &json!({"questionType": "true_false", "pointsPossible": 1, "content": {}}),
                &json!(true),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, GradingError::InvalidQuestionDefinition { .. }));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let q = multi_choice();
        let answer = json!({"selectedOptions": ["c", "b"]});
        let first = serde_json::to_string(&engine().evaluate(&q, &answer)).unwrap();
        let second = serde_json::to_string(&engine().evaluate(&q, &answer)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn feedback_can_be_disabled() {
        let quiet = GradingEngine::new(GradingConfig {
            include_feedback: false,
        });
        assert!(quiet.evaluate(&single_choice(), &json!("b")).feedback.is_none());
        assert!(engine().evaluate(&single_choice(), &json!("b")).feedback.is_some());
    }

    #[test]
    fn points_never_exceed_possible() {
        let q = question(json!({
            "questionType": "matching",
            "pointsPossible": 4,
            "content": {
                "correctPairs": [{"left": "a", "right": "1"}, {"left": "b", "right": "2"}],
                "partialCreditStrategy": "per_pair"
            }
        }));
        for answer in [
            json!([{"left": "a", "right": "1"}, {"left": "b", "right": "2"}]),
            json!([{"left": "a", "right": "1"}, {"left": "b", "right": "2"}, {"left": "a", "right": "2"}]),
            json!([]),
        ] {
            let result = engine().evaluate(&q, &answer);
            assert!(result.points_earned >= 0.0);
            assert!(result.points_earned <= result.points_possible);
            if result.is_correct {
                assert_eq!(result.points_earned, result.points_possible);
            }
        }
    }
}
