//! CLI subcommands.

pub mod evaluate;
pub mod grade;
pub mod init;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use quizgrade_core::model::ProgramContent;
use quizgrade_core::normalize;
use quizgrade_core::results::SandboxExecution;
use quizgrade_sandbox::{cancellation, load_config_from, QuizgradeConfig, SandboxRunner};

/// Exit code when a response could not be graded at all.
pub const EXIT_UNGRADED: i32 = 2;

/// How a command finished when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    /// The response was not graded; no score may be recorded.
    Ungraded,
}

pub fn load_config(path: Option<PathBuf>) -> Result<QuizgradeConfig> {
    load_config_from(path.as_deref())
}

pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON: {}", path.display()))
}

pub fn sandbox_runner(config: &QuizgradeConfig) -> Result<SandboxRunner> {
    config.runner()?.ok_or_else(|| {
        anyhow::anyhow!(
            "--execute needs a sandbox: add a [sandbox] section to quizgrade.toml \
             or set QUIZGRADE_SANDBOX_URL"
        )
    })
}

/// Run a program answer through the sandbox, cancelling on Ctrl-C.
///
/// Returns `None` when the payload is not a readable program answer; the
/// engine reports that as malformed.
pub async fn run_program(
    runner: &SandboxRunner,
    content: &ProgramContent,
    payload: &Value,
) -> Option<SandboxExecution> {
    let answer = normalize::program(payload).ok()?;
    let (handle, signal) = cancellation();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling sandbox execution");
            handle.cancel();
        }
    });

    tracing::info!(
        sandbox = runner.client_name(),
        tests = content.test_cases.len(),
        "running program submission"
    );
    let execution = runner.execute(content, &answer, None, signal).await;
    interrupt.abort();
    Some(execution)
}
