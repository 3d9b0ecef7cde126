//! Configuration loading and sandbox client factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizgrade_core::traits::SandboxClient;
use quizgrade_core::GradingConfig;

use crate::http::HttpSandboxClient;
use crate::SandboxRunner;

/// Which sandbox program submissions are sent to.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SandboxConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
    },
    /// Program submissions are graded without execution (pending review).
    #[default]
    Disabled,
}

impl std::fmt::Debug for SandboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxConfig::Http { base_url, api_key } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .finish(),
            SandboxConfig::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Top-level quizgrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizgradeConfig {
    /// Attach feedback strings to grading results.
    #[serde(default = "default_true")]
    pub include_feedback: bool,
    /// Per-test-case sandbox timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Max concurrent sandbox calls per submission.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Retries on transient sandbox errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Output directory for batch reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

fn default_true() -> bool {
    true
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_parallelism() -> usize {
    4
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizgrade-reports")
}

impl Default for QuizgradeConfig {
    fn default() -> Self {
        Self {
            include_feedback: true,
            timeout_ms: default_timeout_ms(),
            parallelism: default_parallelism(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_output_dir(),
            sandbox: SandboxConfig::default(),
        }
    }
}

impl QuizgradeConfig {
    pub fn grading_config(&self) -> GradingConfig {
        GradingConfig {
            include_feedback: self.include_feedback,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Build a runner for the configured sandbox, or `None` when disabled.
    pub fn runner(&self) -> Result<Option<SandboxRunner>> {
        let Some(client) = create_client(&self.sandbox)? else {
            return Ok(None);
        };
        Ok(Some(
            SandboxRunner::new(client)
                .with_parallelism(self.parallelism)
                .with_timeout(self.timeout())
                .with_retries(self.max_retries, Duration::from_millis(self.retry_delay_ms)),
        ))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_sandbox_config(config: &SandboxConfig) -> SandboxConfig {
    match config {
        SandboxConfig::Http { base_url, api_key } => SandboxConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key.as_ref().map(|k| resolve_env_vars(k)),
        },
        SandboxConfig::Disabled => SandboxConfig::Disabled,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizgrade.toml` in the current directory
/// 2. `~/.config/quizgrade/config.toml`
///
/// Environment variable overrides: `QUIZGRADE_SANDBOX_URL`, `QUIZGRADE_SANDBOX_KEY`.
pub fn load_config() -> Result<QuizgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizgradeConfig::default(),
    };

    Ok(apply_overrides(
        config,
        std::env::var("QUIZGRADE_SANDBOX_URL").ok(),
        std::env::var("QUIZGRADE_SANDBOX_KEY").ok(),
    ))
}

fn parse_config(content: &str) -> Result<QuizgradeConfig> {
    Ok(toml::from_str(content)?)
}

fn apply_overrides(
    mut config: QuizgradeConfig,
    url: Option<String>,
    key: Option<String>,
) -> QuizgradeConfig {
    if let Some(url) = url {
        let api_key = match &config.sandbox {
            SandboxConfig::Http { api_key, .. } => api_key.clone(),
            SandboxConfig::Disabled => None,
        };
        config.sandbox = SandboxConfig::Http {
            base_url: url,
            api_key,
        };
    }

    if let (Some(key), SandboxConfig::Http { api_key, .. }) = (key, &mut config.sandbox) {
        *api_key = Some(key);
    }

    config.sandbox = resolve_sandbox_config(&config.sandbox);
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizgrade"))
}

/// Create a sandbox client from its configuration, or `None` when disabled.
pub fn create_client(config: &SandboxConfig) -> Result<Option<Arc<dyn SandboxClient>>> {
    match config {
        SandboxConfig::Http { base_url, api_key } => {
            if base_url.trim().is_empty() {
                anyhow::bail!("sandbox base_url is empty");
            }
            let client = HttpSandboxClient::new(base_url, api_key.clone())?;
            Ok(Some(Arc::new(client)))
        }
        SandboxConfig::Disabled => Ok(None),
    }
}
