//! quizgrade-sandbox: the bounded boundary to an external code sandbox.
//!
//! Runs every declared test case of a program question through a
//! `SandboxClient`, each call bounded by a timeout, with limited
//! parallelism and cooperative cancellation. The outcome is a
//! `SandboxExecution` the grading engine can aggregate.

pub mod config;
pub mod http;
pub mod mock;

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{watch, Semaphore};
use tokio::time::Instant;

use quizgrade_core::error::SandboxError;
use quizgrade_core::model::{ProgramContent, ProgramTestCase};
use quizgrade_core::normalize::ProgramAnswer;
use quizgrade_core::results::{SandboxExecution, TestResult};
use quizgrade_core::traits::{SandboxClient, TestRunReport, TestRunRequest};

pub use config::{create_client, load_config, load_config_from, QuizgradeConfig, SandboxConfig};
pub use http::HttpSandboxClient;
pub use mock::MockSandboxClient;

/// Fires cancellation for the paired `CancelSignal`s.
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observed by a running execution; cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation fires. Never resolves if the handle was
    /// dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancellation handle and signal.
pub fn cancellation() -> (CancellationHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancellationHandle { tx }, CancelSignal { rx })
}

/// Runs program submissions against a sandbox client.
pub struct SandboxRunner {
    client: Arc<dyn SandboxClient>,
    /// Maximum concurrent test-case calls.
    parallelism: usize,
    /// Per-test timeout when neither the caller nor the question sets one.
    default_timeout: Duration,
    /// Retries on transient sandbox errors (not test failures).
    max_retries: u32,
    /// Delay between retries when the sandbox gives no hint.
    retry_delay: Duration,
}

enum TestOutcome {
    Report(TestRunReport),
    TimedOut,
    Failed(SandboxError),
}

impl SandboxRunner {
    pub fn new(client: Arc<dyn SandboxClient>) -> Self {
        Self {
            client,
            parallelism: 4,
            default_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Execute every declared test case.
    ///
    /// `timeout` bounds each test-case call; it falls back to the question's
    /// `timeLimitMs`, then to the runner default. A timed-out test is
    /// recorded as failed. A sandbox communication failure or cancellation
    /// aborts outstanding calls and yields `SandboxExecution::Failed` with
    /// the results completed so far.
    pub async fn execute(
        &self,
        content: &ProgramContent,
        answer: &ProgramAnswer,
        timeout: Option<Duration>,
        mut cancel: CancelSignal,
    ) -> SandboxExecution {
        let limit = timeout
            .or_else(|| content.time_limit_ms.map(Duration::from_millis))
            .unwrap_or(self.default_timeout);
        let limit_ms = limit.as_millis() as u64;
        let language = answer.language.clone().or_else(|| content.language.clone());
        let semaphore = Arc::new(Semaphore::new(self.parallelism));

        let mut futures = FuturesUnordered::new();
        for (index, case) in content.test_cases.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let request = TestRunRequest {
                language: language.clone(),
                code: answer.code.clone(),
                test_case: case.clone(),
                time_limit_ms: Some(limit_ms),
            };
            let max_retries = self.max_retries;
            let retry_delay = self.retry_delay;

            futures.push(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        run_with_retries(client.as_ref(), &request, limit, max_retries, retry_delay)
                            .await
                    }
                    Err(_) => TestOutcome::Failed(SandboxError::Network("semaphore closed".into())),
                };
                (index, request.test_case, outcome)
            });
        }

        let mut completed: Vec<(usize, TestResult)> = Vec::new();
        let mut syntax_errors: Vec<String> = Vec::new();
        let mut runtime_errors: Vec<String> = Vec::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(
                        completed = completed.len(),
                        total = content.test_cases.len(),
                        "sandbox execution cancelled"
                    );
                    return failed("execution cancelled", completed);
                }
                next = futures.next() => {
                    let Some((index, case, outcome)) = next else {
                        break;
                    };
                    match outcome {
                        TestOutcome::Report(report) => {
                            push_unique(&mut syntax_errors, report.syntax_error.clone());
                            push_unique(&mut runtime_errors, report.runtime_error.clone());
                            completed.push((index, to_test_result(&case, report)));
                        }
                        TestOutcome::TimedOut => {
                            tracing::debug!(test_id = %case.id, limit_ms, "test case timed out");
                            let mut result = TestResult::timed_out(&case.id, case.weight, limit_ms);
                            result.name = case.name.clone();
                            completed.push((index, result));
                        }
                        TestOutcome::Failed(error) => {
                            tracing::warn!(
                                client = self.client.name(),
                                test_id = %case.id,
                                %error,
                                "sandbox communication failed"
                            );
                            return failed(error.to_string(), completed);
                        }
                    }
                }
            }
        }

        SandboxExecution::Completed {
            test_results: in_declared_order(completed),
            syntax_errors,
            runtime_errors,
        }
    }
}

/// Every attempt and every retry delay share one deadline, so `limit`
/// bounds the whole test case.
async fn run_with_retries(
    client: &dyn SandboxClient,
    request: &TestRunRequest,
    limit: Duration,
    max_retries: u32,
    retry_delay: Duration,
) -> TestOutcome {
    let deadline = Instant::now() + limit;
    let mut attempt = 0;
    loop {
        match tokio::time::timeout_at(deadline, client.run_test(request)).await {
            Err(_) => return TestOutcome::TimedOut,
            Ok(Ok(report)) => return TestOutcome::Report(report),
            Ok(Err(e)) if attempt < max_retries && !e.is_permanent() => {
                attempt += 1;
                let delay = e
                    .retry_after_ms()
                    .map(Duration::from_millis)
                    .unwrap_or(retry_delay);
                if delay >= deadline.saturating_duration_since(Instant::now()) {
                    tracing::debug!(
                        test_id = %request.test_case.id,
                        delay_ms = delay.as_millis() as u64,
                        "retry delay exceeds the time limit"
                    );
                    return TestOutcome::TimedOut;
                }
                tracing::debug!(
                    test_id = %request.test_case.id,
                    attempt,
                    error = %e,
                    "retrying sandbox call"
                );
                tokio::time::sleep(delay).await;
            }
            Ok(Err(e)) => return TestOutcome::Failed(e),
        }
    }
}

fn to_test_result(case: &ProgramTestCase, report: TestRunReport) -> TestResult {
    let error = report
        .error
        .or(report.runtime_error)
        .or(report.syntax_error);
    TestResult {
        test_id: case.id.clone(),
        name: case.name.clone(),
        passed: report.passed,
        weight: case.weight,
        execution_time_ms: report.execution_time_ms,
        error,
        timed_out: false,
    }
}

fn push_unique(list: &mut Vec<String>, message: Option<String>) {
    if let Some(message) = message {
        if !list.contains(&message) {
            list.push(message);
        }
    }
}

fn in_declared_order(mut completed: Vec<(usize, TestResult)>) -> Vec<TestResult> {
    completed.sort_by_key(|(index, _)| *index);
    completed.into_iter().map(|(_, result)| result).collect()
}

fn failed(reason: impl Into<String>, completed: Vec<(usize, TestResult)>) -> SandboxExecution {
    SandboxExecution::Failed {
        reason: reason.into(),
        completed: in_declared_order(completed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSandboxClient;

    fn content(ids: &[&str]) -> ProgramContent {
        ProgramContent {
            language: Some("python".into()),
            test_cases: ids
                .iter()
                .map(|id| ProgramTestCase {
                    id: id.to_string(),
                    name: None,
                    input: None,
                    expected_output: None,
                    weight: 1.0,
                    hidden: false,
                })
                .collect(),
            time_limit_ms: None,
        }
    }

    fn answer() -> ProgramAnswer {
        ProgramAnswer {
            code: "print(42)".into(),
            language: None,
        }
    }

    #[tokio::test]
    async fn results_follow_declared_order() {
        let client = MockSandboxClient::passing().with_outcome("b", MockSandboxClient::fail("wrong answer"));
        let runner = SandboxRunner::new(Arc::new(client)).with_parallelism(3);

        let execution = runner
            .execute(&content(&["a", "b", "c"]), &answer(), None, CancelSignal::never())
            .await;
        let SandboxExecution::Completed { test_results, .. } = execution else {
            panic!("expected completed execution");
        };
        let ids: Vec<_> = test_results.iter().map(|r| r.test_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(!test_results[1].passed);
        assert_eq!(test_results[1].error.as_deref(), Some("wrong answer"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_test_times_out() {
        let client = MockSandboxClient::passing().with_delay("slow", Duration::from_secs(30));
        let runner = SandboxRunner::new(Arc::new(client));

        let execution = runner
            .execute(
                &content(&["fast", "slow"]),
                &answer(),
                Some(Duration::from_secs(2)),
                CancelSignal::never(),
            )
            .await;
        let SandboxExecution::Completed { test_results, .. } = execution else {
            panic!("expected completed execution");
        };
        assert!(test_results[0].passed);
        assert!(test_results[1].timed_out);
        assert!(!test_results[1].passed);
        assert_eq!(test_results[1].execution_time_ms, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn communication_failure_returns_partial_results() {
        let client = MockSandboxClient::passing()
            .with_error("b", SandboxError::AuthenticationFailed("bad key".into()))
            .with_delay("c", Duration::from_secs(5));
        let runner = SandboxRunner::new(Arc::new(client)).with_parallelism(1);

        let execution = runner
            .execute(&content(&["a", "b", "c"]), &answer(), None, CancelSignal::never())
            .await;
        let SandboxExecution::Failed { reason, completed } = execution else {
            panic!("expected failed execution");
        };
        assert!(reason.contains("bad key"));
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].test_id, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let client = Arc::new(
            MockSandboxClient::passing()
                .with_transient_failures("a", 2, SandboxError::Network("reset".into())),
        );
        let runner = SandboxRunner::new(client.clone());

        let execution = runner
            .execute(&content(&["a"]), &answer(), None, CancelSignal::never())
            .await;
        assert!(matches!(execution, SandboxExecution::Completed { .. }));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_retries_stay_within_time_limit() {
        let client = Arc::new(MockSandboxClient::passing().with_transient_failures(
            "a",
            2,
            SandboxError::RateLimited {
                retry_after_ms: 3_600_000,
            },
        ));
        let runner = SandboxRunner::new(client.clone());

        let start = Instant::now();
        let execution = runner
            .execute(
                &content(&["a"]),
                &answer(),
                Some(Duration::from_secs(2)),
                CancelSignal::never(),
            )
            .await;

        assert!(start.elapsed() <= Duration::from_secs(2));
        assert_eq!(client.call_count(), 1);
        let SandboxExecution::Completed { test_results, .. } = execution else {
            panic!("expected completed execution");
        };
        assert!(test_results[0].timed_out);
        assert!(!test_results[0].passed);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_share_one_deadline() {
        let client = Arc::new(
            MockSandboxClient::passing()
                .with_transient_failures("a", 2, SandboxError::Network("reset".into()))
                .with_delay("a", Duration::from_millis(800)),
        );
        let runner = SandboxRunner::new(client.clone())
            .with_retries(2, Duration::from_millis(100));

        let start = Instant::now();
        let execution = runner
            .execute(
                &content(&["a"]),
                &answer(),
                Some(Duration::from_secs(1)),
                CancelSignal::never(),
            )
            .await;

        assert!(start.elapsed() <= Duration::from_secs(1));
        let SandboxExecution::Completed { test_results, .. } = execution else {
            panic!("expected completed execution");
        };
        assert!(test_results[0].timed_out);
        assert_eq!(test_results[0].execution_time_ms, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_outstanding_calls() {
        let client = MockSandboxClient::passing().with_delay("slow", Duration::from_secs(60));
        let runner = SandboxRunner::new(Arc::new(client)).with_timeout(Duration::from_secs(120));
        let (handle, signal) = cancellation();

        let program = content(&["quick", "slow"]);
        let submission = answer();
        let task = runner.execute(&program, &submission, None, signal);
        let cancel_later = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.cancel();
        };
        let (execution, ()) = tokio::join!(task, cancel_later);

        let SandboxExecution::Failed { reason, completed } = execution else {
            panic!("expected failed execution");
        };
        assert_eq!(reason, "execution cancelled");
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].test_id, "quick");
    }

    #[tokio::test]
    async fn no_test_cases_completes_empty() {
        let runner = SandboxRunner::new(Arc::new(MockSandboxClient::passing()));
        let execution = runner
            .execute(&content(&[]), &answer(), None, CancelSignal::never())
            .await;
        assert_eq!(
            execution,
            SandboxExecution::Completed {
                test_results: vec![],
                syntax_errors: vec![],
                runtime_errors: vec![],
            }
        );
    }

    #[tokio::test]
    async fn syntax_errors_are_collected_once() {
        let report = TestRunReport {
            passed: false,
            execution_time_ms: 0,
            error: None,
            syntax_error: Some("line 1: invalid syntax".into()),
            runtime_error: None,
        };
        let client = MockSandboxClient::with_default(report);
        let runner = SandboxRunner::new(Arc::new(client));

        let execution = runner
            .execute(&content(&["a", "b"]), &answer(), None, CancelSignal::never())
            .await;
        let SandboxExecution::Completed { syntax_errors, test_results, .. } = execution else {
            panic!("expected completed execution");
        };
        assert_eq!(syntax_errors, vec!["line 1: invalid syntax".to_string()]);
        assert_eq!(test_results[0].error.as_deref(), Some("line 1: invalid syntax"));
    }

    #[test]
    fn never_signal_is_not_cancelled() {
        assert!(!CancelSignal::never().is_cancelled());
        let (handle, signal) = cancellation();
        handle.cancel();
        assert!(signal.is_cancelled());
    }
}
