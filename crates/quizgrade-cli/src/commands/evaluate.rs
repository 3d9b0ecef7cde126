//! The `quizgrade evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizgrade_core::model::QuestionContent;
use quizgrade_core::{GradingEngine, QuestionDefinition, SandboxExecution};

use super::Completion;

pub async fn execute(
    question_path: PathBuf,
    answer_path: PathBuf,
    execution_path: Option<PathBuf>,
    run_sandbox: bool,
    config_path: Option<PathBuf>,
    no_feedback: bool,
) -> Result<Completion> {
    let config = super::load_config(config_path)?;
    let question_json = super::read_json(&question_path)?;
    let answer = super::read_json(&answer_path)?;

    let question = match QuestionDefinition::from_json(&question_json) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Ungraded: {e}");
            return Ok(Completion::Ungraded);
        }
    };

    let execution: Option<SandboxExecution> = match (&execution_path, &question.content) {
        (Some(path), _) => {
            let value = super::read_json(path)?;
            Some(
                serde_json::from_value(value)
                    .with_context(|| format!("invalid execution record: {}", path.display()))?,
            )
        }
        (None, QuestionContent::ProgramSubmission(content)) if run_sandbox => {
            let runner = super::sandbox_runner(&config)?;
            super::run_program(&runner, content, &answer).await
        }
        _ => None,
    };

    let mut grading = config.grading_config();
    grading.include_feedback &= !no_feedback;
    let engine = GradingEngine::new(grading);
    let result = engine.evaluate_with_execution(&question, &answer, execution.as_ref());

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(Completion::Done)
}
