//! Sandbox client seam.
//!
//! The grading engine never executes code. Program submissions are run by
//! an external sandbox, one test case per call, through this trait. It is
//! implemented by the `quizgrade-sandbox` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;
use crate::model::ProgramTestCase;

/// Trait for external code-execution sandboxes.
#[async_trait]
pub trait SandboxClient: Send + Sync {
    /// Human-readable client name (e.g. "http").
    fn name(&self) -> &str;

    /// Run one test case against the submitted code.
    async fn run_test(&self, request: &TestRunRequest) -> Result<TestRunReport, SandboxError>;
}

/// Request to run a single test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunRequest {
    /// Language of the submission, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// The learner's source code.
    pub code: String,
    /// The test case to run.
    pub test_case: ProgramTestCase,
    /// Time limit the sandbox should enforce, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
}

/// What the sandbox reported for one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunReport {
    pub passed: bool,
    #[serde(default)]
    pub execution_time_ms: u64,
    /// Failure message (assertion output, wrong answer).
    #[serde(default)]
    pub error: Option<String>,
    /// The code did not compile or parse.
    #[serde(default)]
    pub syntax_error: Option<String>,
    /// The code crashed while running this test.
    #[serde(default)]
    pub runtime_error: Option<String>,
}
