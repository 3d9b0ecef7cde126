//! Program submission evaluator.
//!
//! The engine never runs code. It aggregates the `TestResult`s an external
//! sandbox produced and decides what the submission scores. When the
//! sandbox could not be reached, every outstanding test is recorded as
//! runtime-errored and the response goes to manual review instead of
//! scoring zero on merit.

use std::collections::HashSet;

use crate::model::ProgramContent;
use crate::normalize::ProgramAnswer;
use crate::partial_credit;
use crate::results::{Evaluation, GradingDetails, Outcome, ProgramDetails, SandboxExecution, TestResult};

const MISSING_EXECUTION: &str = "no execution results were provided";

pub fn evaluate(
    content: &ProgramContent,
    answer: &ProgramAnswer,
    execution: Option<&SandboxExecution>,
) -> Evaluation {
    if answer.code.trim().is_empty() {
        let results = fill_missing(content, Vec::new(), "no code was submitted");
        return completed(results, Vec::new(), Vec::new());
    }

    match execution {
        None => unavailable(content, &[], MISSING_EXECUTION),
        Some(SandboxExecution::Failed { reason, completed }) => {
            unavailable(content, completed, reason)
        }
        Some(SandboxExecution::Completed {
            test_results,
            syntax_errors,
            runtime_errors,
        }) => {
            let results = fill_missing(
                content,
                test_results.clone(),
                "no result was reported for this test",
            );
            completed(results, syntax_errors.clone(), runtime_errors.clone())
        }
    }
}

fn completed(
    test_results: Vec<TestResult>,
    syntax_errors: Vec<String>,
    runtime_errors: Vec<String>,
) -> Evaluation {
    let total = test_results.len();
    let passed = test_results.iter().filter(|t| t.passed).count();

    let total_weight: f64 = test_results
        .iter()
        .map(|t| if t.weight.is_finite() { t.weight.max(0.0) } else { 0.0 })
        .sum();
    let weighted_score = if total_weight > 0.0 {
        partial_credit::proportional(test_results.iter().map(|t| (t.weight, t.passed)))
    } else {
        partial_credit::ratio(passed as f64, total as f64)
    };

    let outcome = if total == 0 && syntax_errors.is_empty() {
        // Nothing ran and nothing explains why; a human has to look.
        Outcome::PendingReview
    } else {
        Outcome::Partial(weighted_score)
    };

    Evaluation::new(
        outcome,
        GradingDetails::ProgramSubmission(ProgramDetails {
            passed,
            failed: total - passed,
            total,
            weighted_score,
            test_results,
            syntax_errors,
            runtime_errors,
            sandbox_error: None,
        }),
    )
}

fn unavailable(content: &ProgramContent, completed: &[TestResult], reason: &str) -> Evaluation {
    let test_results = fill_missing(
        content,
        completed.to_vec(),
        &format!("sandbox unavailable: {reason}"),
    );
    let total = test_results.len();
    let passed = test_results.iter().filter(|t| t.passed).count();

    Evaluation::new(
        Outcome::PendingReview,
        GradingDetails::ProgramSubmission(ProgramDetails {
            passed,
            failed: total - passed,
            total,
            weighted_score: 0.0,
            test_results,
            syntax_errors: Vec::new(),
            runtime_errors: Vec::new(),
            sandbox_error: Some(reason.to_string()),
        }),
    )
}

/// Append a runtime-errored result for every declared test without one,
/// and copy declared names onto results that lack them.
fn fill_missing(content: &ProgramContent, mut results: Vec<TestResult>, error: &str) -> Vec<TestResult> {
    let reported: HashSet<String> = results.iter().map(|r| r.test_id.clone()).collect();

    for result in &mut results {
        if result.name.is_none() {
            result.name = content
                .test_cases
                .iter()
                .find(|tc| tc.id == result.test_id)
                .and_then(|tc| tc.name.clone());
        }
    }

    for case in &content.test_cases {
        if !reported.contains(&case.id) {
            let mut missing = TestResult::runtime_errored(&case.id, case.weight, error);
            missing.name = case.name.clone();
            results.push(missing);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProgramTestCase;

    fn content() -> ProgramContent {
        ProgramContent {
            language: Some("python".into()),
            test_cases: vec![
                ProgramTestCase {
                    id: "t1".into(),
                    name: Some("adds".into()),
                    input: None,
                    expected_output: None,
                    weight: 3.0,
                    hidden: false,
                },
                ProgramTestCase {
                    id: "t2".into(),
                    name: None,
                    input: None,
                    expected_output: None,
                    weight: 1.0,
                    hidden: true,
                },
            ],
            time_limit_ms: Some(1000),
        }
    }

    fn answer() -> ProgramAnswer {
        ProgramAnswer {
            code: "def add(a, b): return a + b".into(),
            language: None,
        }
    }

    fn result(id: &str, passed: bool, weight: f64) -> TestResult {
        TestResult {
            test_id: id.into(),
            name: None,
            passed,
            weight,
            execution_time_ms: 12,
            error: (!passed).then(|| "AssertionError".to_string()),
            timed_out: false,
        }
    }

    fn details(eval: &Evaluation) -> &ProgramDetails {
        match &eval.details {
            GradingDetails::ProgramSubmission(d) => d,
            other => panic!("expected program details, got {other:?}"),
        }
    }

    #[test]
    fn weighted_aggregation() {
        let execution = SandboxExecution::Completed {
            test_results: vec![result("t1", true, 3.0), result("t2", false, 1.0)],
            syntax_errors: vec![],
            runtime_errors: vec!["IndexError: list index out of range".into()],
        };
        let eval = evaluate(&content(), &answer(), Some(&execution));
        let d = details(&eval);
        assert_eq!((d.passed, d.failed, d.total), (1, 1, 2));
        assert!((d.weighted_score - 0.75).abs() < f64::EPSILON);
        assert_eq!(d.runtime_errors, vec!["IndexError: list index out of range".to_string()]);
        assert_eq!(d.test_results[0].name.as_deref(), Some("adds"));
        assert_eq!(eval.outcome, Outcome::Partial(0.75));
    }

    #[test]
    fn all_passing_is_full_fraction() {
        let execution = SandboxExecution::Completed {
            test_results: vec![result("t1", true, 3.0), result("t2", true, 1.0)],
            syntax_errors: vec![],
            runtime_errors: vec![],
        };
        let eval = evaluate(&content(), &answer(), Some(&execution));
        assert_eq!(eval.outcome, Outcome::Partial(1.0));
    }

    #[test]
    fn unreported_declared_test_counts_as_failed() {
        let execution = SandboxExecution::Completed {
            test_results: vec![result("t1", true, 3.0)],
            syntax_errors: vec![],
            runtime_errors: vec![],
        };
        let eval = evaluate(&content(), &answer(), Some(&execution));
        let d = details(&eval);
        assert_eq!(d.total, 2);
        assert!(!d.test_results[1].passed);
        assert!((d.weighted_score - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn syntax_errors_surface_verbatim() {
        let execution = SandboxExecution::Completed {
            test_results: vec![result("t1", false, 3.0), result("t2", false, 1.0)],
            syntax_errors: vec!["line 1: invalid syntax".into()],
            runtime_errors: vec![],
        };
        let eval = evaluate(&content(), &answer(), Some(&execution));
        assert_eq!(details(&eval).syntax_errors, vec!["line 1: invalid syntax".to_string()]);
        assert_eq!(eval.outcome, Outcome::Partial(0.0));
    }

    #[test]
    fn sandbox_failure_goes_to_review() {
        let execution = SandboxExecution::Failed {
            reason: "connection refused".into(),
            completed: vec![result("t1", true, 3.0)],
        };
        let eval = evaluate(&content(), &answer(), Some(&execution));
        assert_eq!(eval.outcome, Outcome::PendingReview);
        let d = details(&eval);
        assert_eq!(d.weighted_score, 0.0);
        assert_eq!(d.sandbox_error.as_deref(), Some("connection refused"));
        let outstanding = &d.test_results[1];
        assert_eq!(outstanding.test_id, "t2");
        assert!(outstanding
            .error
            .as_deref()
            .is_some_and(|e| e.contains("connection refused")));
    }

    #[test]
    fn missing_execution_goes_to_review() {
        let eval = evaluate(&content(), &answer(), None);
        assert_eq!(eval.outcome, Outcome::PendingReview);
        assert_eq!(details(&eval).failed, 2);
    }

    #[test]
    fn empty_code_fails_every_test() {
        let empty = ProgramAnswer {
            code: "   ".into(),
            language: None,
        };
        let eval = evaluate(&content(), &empty, None);
        assert_eq!(eval.outcome, Outcome::Partial(0.0));
        assert_eq!(details(&eval).failed, 2);
    }

    #[test]
    fn zero_weights_fall_back_to_counts() {
        let content = ProgramContent {
            language: None,
            test_cases: vec![],
            time_limit_ms: None,
        };
        let execution = SandboxExecution::Completed {
            test_results: vec![result("a", true, 0.0), result("b", false, 0.0)],
            syntax_errors: vec![],
            runtime_errors: vec![],
        };
        let eval = evaluate(&content, &answer(), Some(&execution));
        assert_eq!(details(&eval).weighted_score, 0.5);
    }

    #[test]
    fn nothing_to_aggregate_goes_to_review() {
        let content = ProgramContent {
            language: None,
            test_cases: vec![],
            time_limit_ms: None,
        };
        let execution = SandboxExecution::Completed {
            test_results: vec![],
            syntax_errors: vec![],
            runtime_errors: vec![],
        };
        let eval = evaluate(&content, &answer(), Some(&execution));
        assert_eq!(eval.outcome, Outcome::PendingReview);
    }
}
