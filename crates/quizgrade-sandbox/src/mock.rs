//! Mock sandbox client for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use quizgrade_core::error::SandboxError;
use quizgrade_core::traits::{SandboxClient, TestRunReport, TestRunRequest};

/// A sandbox client with scripted per-test outcomes.
///
/// Tests without a scripted outcome get the default report.
pub struct MockSandboxClient {
    default_report: TestRunReport,
    outcomes: HashMap<String, Result<TestRunReport, SandboxError>>,
    delays: HashMap<String, Duration>,
    /// Remaining transient failures per test id.
    transient: Mutex<HashMap<String, (u32, SandboxError)>>,
    call_count: AtomicU32,
    last_request: Mutex<Option<TestRunRequest>>,
}

impl MockSandboxClient {
    pub fn with_default(report: TestRunReport) -> Self {
        Self {
            default_report: report,
            outcomes: HashMap::new(),
            delays: HashMap::new(),
            transient: Mutex::new(HashMap::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A client where every test passes.
    pub fn passing() -> Self {
        Self::with_default(Self::pass())
    }

    /// A passing report.
    pub fn pass() -> TestRunReport {
        TestRunReport {
            passed: true,
            execution_time_ms: 1,
            error: None,
            syntax_error: None,
            runtime_error: None,
        }
    }

    /// A failing report with the given message.
    pub fn fail(message: &str) -> TestRunReport {
        TestRunReport {
            passed: false,
            execution_time_ms: 1,
            error: Some(message.to_string()),
            syntax_error: None,
            runtime_error: None,
        }
    }

    pub fn with_outcome(mut self, test_id: &str, report: TestRunReport) -> Self {
        self.outcomes.insert(test_id.to_string(), Ok(report));
        self
    }

    pub fn with_error(mut self, test_id: &str, error: SandboxError) -> Self {
        self.outcomes.insert(test_id.to_string(), Err(error));
        self
    }

    pub fn with_delay(mut self, test_id: &str, delay: Duration) -> Self {
        self.delays.insert(test_id.to_string(), delay);
        self
    }

    /// Fail the first `times` calls for `test_id` with `error`, then behave normally.
    pub fn with_transient_failures(self, test_id: &str, times: u32, error: SandboxError) -> Self {
        if let Ok(mut transient) = self.transient.lock() {
            transient.insert(test_id.to_string(), (times, error));
        }
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<TestRunRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    fn take_transient(&self, test_id: &str) -> Option<SandboxError> {
        let mut transient = self.transient.lock().ok()?;
        let (remaining, error) = transient.get_mut(test_id)?;
        if *remaining == 0 {
            return None;
        }
        *remaining -= 1;
        Some(error.clone())
    }
}

#[async_trait]
impl SandboxClient for MockSandboxClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run_test(&self, request: &TestRunRequest) -> Result<TestRunReport, SandboxError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let test_id = request.test_case.id.as_str();
        if let Some(delay) = self.delays.get(test_id) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.take_transient(test_id) {
            return Err(error);
        }

        match self.outcomes.get(test_id) {
            Some(outcome) => outcome.clone(),
            None => Ok(self.default_report.clone()),
        }
    }
}
