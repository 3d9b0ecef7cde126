//! Batch grading report with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::QuestionBank;
use crate::results::GradingResult;
use crate::statistics::{summarize, AttemptSummary};

/// The record of one batch grading run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The bank the submissions were graded against.
    pub bank: BankSummary,
    /// One entry per submission, in submission order.
    pub entries: Vec<BatchEntry>,
    /// Totals over every graded entry.
    pub summary: AttemptSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a question bank (without the definitions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub total_points: f64,
}

impl From<&QuestionBank> for BankSummary {
    fn from(bank: &QuestionBank) -> Self {
        Self {
            id: bank.id.clone(),
            name: bank.name.clone(),
            question_count: bank.question_count(),
            total_points: bank.total_points(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub question_id: String,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchOutcome {
    Graded { result: GradingResult },
    /// No score may be recorded for this response.
    Ungraded { reason: String },
}

impl BatchReport {
    /// Build a report and its summary from finished entries.
    pub fn new(bank: &QuestionBank, entries: Vec<BatchEntry>, duration_ms: u64) -> Self {
        let graded: Vec<GradingResult> = entries
            .iter()
            .filter_map(|e| match &e.outcome {
                BatchOutcome::Graded { result } => Some(result.clone()),
                BatchOutcome::Ungraded { .. } => None,
            })
            .collect();
        let ungraded = entries.len() - graded.len();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            bank: BankSummary::from(bank),
            summary: summarize(&graded, ungraded),
            entries,
            duration_ms,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Default file name for this report, e.g. `geo-101-<uuid>.json`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.bank.id, self.id)
    }
}
