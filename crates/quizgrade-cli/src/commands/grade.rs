//! The `quizgrade grade` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use quizgrade_core::model::{QuestionBank, QuestionContent};
use quizgrade_core::report::{BatchEntry, BatchOutcome, BatchReport};
use quizgrade_core::{GradingEngine, SandboxExecution};
use quizgrade_sandbox::SandboxRunner;

use super::Completion;

/// One learner response in a submissions file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Submission {
    question_id: String,
    answer: Value,
    /// A recorded sandbox execution, used instead of running the sandbox.
    #[serde(default)]
    execution: Option<SandboxExecution>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubmissionsFile {
    List(Vec<Submission>),
    Wrapped { submissions: Vec<Submission> },
}

impl SubmissionsFile {
    fn into_vec(self) -> Vec<Submission> {
        match self {
            SubmissionsFile::List(s) | SubmissionsFile::Wrapped { submissions: s } => s,
        }
    }
}

pub async fn execute(
    bank_path: PathBuf,
    submissions_path: PathBuf,
    output: Option<PathBuf>,
    run_sandbox: bool,
    config_path: Option<PathBuf>,
) -> Result<Completion> {
    let config = super::load_config(config_path)?;
    let bank = quizgrade_core::parser::parse_bank(&bank_path)?;
    let submissions: SubmissionsFile = serde_json::from_value(super::read_json(&submissions_path)?)
        .with_context(|| format!("invalid submissions file: {}", submissions_path.display()))?;
    let submissions = submissions.into_vec();

    let runner = if run_sandbox {
        Some(super::sandbox_runner(&config)?)
    } else {
        None
    };
    let engine = GradingEngine::new(config.grading_config());

    eprintln!(
        "Grading {} submission(s) against {} ({} questions)",
        submissions.len(),
        bank.name,
        bank.question_count()
    );

    let start = Instant::now();
    let mut entries = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let outcome = grade_one(&engine, runner.as_ref(), &bank, &submission).await;
        entries.push(BatchEntry {
            question_id: submission.question_id,
            outcome,
        });
    }
    let report = BatchReport::new(&bank, entries, start.elapsed().as_millis() as u64);

    print_summary(&report);

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)?;
    let path = output.join(report.file_name());
    report.save_json(&path)?;
    eprintln!("Results saved to: {}", path.display());

    if report.summary.ungraded > 0 {
        Ok(Completion::Ungraded)
    } else {
        Ok(Completion::Done)
    }
}

async fn grade_one(
    engine: &GradingEngine,
    runner: Option<&SandboxRunner>,
    bank: &QuestionBank,
    submission: &Submission,
) -> BatchOutcome {
    let Some(question) = bank.get(&submission.question_id) else {
        let reason = match bank.rejection(&submission.question_id) {
            Some(rejected) => rejected.error.to_string(),
            None => "unknown question id".to_string(),
        };
        tracing::warn!(question = %submission.question_id, %reason, "submission not graded");
        return BatchOutcome::Ungraded { reason };
    };

    let definition = &question.definition;
    let execution = match (&submission.execution, &definition.content, runner) {
        (Some(recorded), _, _) => Some(recorded.clone()),
        (None, QuestionContent::ProgramSubmission(content), Some(runner)) => {
            super::run_program(runner, content, &submission.answer).await
        }
        _ => None,
    };

    let result = engine.evaluate_with_execution(definition, &submission.answer, execution.as_ref());
    BatchOutcome::Graded { result }
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Question", "Status", "Points", "Feedback"]);

    for entry in &report.entries {
        let row = match &entry.outcome {
            BatchOutcome::Graded { result } => vec![
                Cell::new(&entry.question_id),
                Cell::new(result.status),
                Cell::new(format!(
                    "{:.2} / {:.2}",
                    result.points_earned, result.points_possible
                )),
                Cell::new(result.feedback.as_deref().unwrap_or("")),
            ],
            BatchOutcome::Ungraded { reason } => vec![
                Cell::new(&entry.question_id),
                Cell::new("ungraded"),
                Cell::new("-"),
                Cell::new(reason),
            ],
        };
        table.add_row(row);
    }

    eprintln!("\n{table}");

    let summary = &report.summary;
    eprintln!(
        "Total: {:.2} / {:.2} ({:.1}%), {} pending review, {} ungraded{}",
        summary.points_earned,
        summary.points_possible,
        summary.percentage,
        summary.pending_review,
        summary.ungraded,
        if summary.provisional { " (provisional)" } else { "" }
    );
}
