//! HTTP sandbox client.
//!
//! Talks JSON to an execution service: one `POST {base_url}/v1/executions`
//! per test case, with the `TestRunRequest` as body and a `TestRunReport`
//! as response.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::instrument;

use quizgrade_core::error::SandboxError;
use quizgrade_core::traits::{SandboxClient, TestRunReport, TestRunRequest};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Sandbox client for an HTTP execution service.
pub struct HttpSandboxClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpSandboxClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// `timeout` bounds a whole HTTP exchange, on top of the runner's
    /// per-test limit.
    pub fn with_timeout(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SandboxClient for HttpSandboxClient {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(test_id = %request.test_case.id))]
    async fn run_test(&self, request: &TestRunRequest) -> Result<TestRunReport, SandboxError> {
        let mut req = self
            .client
            .post(format!("{}/v1/executions", self.base_url))
            .header("content-type", "application/json");

        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.json(request).send().await.map_err(|e| {
            if e.is_timeout() {
                SandboxError::Timeout(self.timeout.as_millis() as u64)
            } else {
                SandboxError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok());
            return Err(SandboxError::RateLimited {
                retry_after_ms: retry_after_ms(retry_after),
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(SandboxError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SandboxError::ApiError {
                status,
                message: body,
            });
        }

        response
            .json::<TestRunReport>()
            .await
            .map_err(|e| SandboxError::InvalidResponse(format!("failed to parse response: {e}")))
    }
}

/// `retry-after` seconds as milliseconds, defaulting to one second.
fn retry_after_ms(header: Option<&str>) -> u64 {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(1)
        .saturating_mul(1000)
}
