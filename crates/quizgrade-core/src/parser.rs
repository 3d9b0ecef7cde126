//! Question bank parser.
//!
//! Loads question banks from TOML or JSON files and directories, and
//! validates them for authoring mistakes the engine would otherwise grade
//! silently.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    BankQuestion, PartialCreditStrategy, QuestionBank, QuestionContent, QuestionDefinition,
    RawQuestionDefinition, RejectedQuestion,
};

/// Intermediate structure shared by TOML and JSON bank files.
#[derive(Debug, Deserialize)]
struct BankFile {
    bank: BankHeader,
    #[serde(default)]
    questions: Vec<RawBankQuestion>,
}

#[derive(Debug, Deserialize)]
struct BankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBankQuestion {
    id: String,
    #[serde(default)]
    title: Option<String>,
    question_type: String,
    points_possible: f64,
    #[serde(default)]
    content: serde_json::Value,
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn is_bank_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml" || ext == "json")
}

/// Parse a single bank file.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse bank content; the format follows `source_path`'s extension
/// (`.json`, anything else is TOML).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: BankFile = if is_json(source_path) {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?
    } else {
        toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?
    };

    let mut questions = Vec::new();
    let mut rejected = Vec::new();

    for q in parsed.questions {
        let raw = RawQuestionDefinition {
            question_type: q.question_type,
            points_possible: q.points_possible,
            content: q.content,
        };
        match QuestionDefinition::try_from(raw) {
            Ok(definition) => questions.push(BankQuestion {
                id: q.id,
                title: q.title,
                definition,
            }),
            Err(error) => {
                tracing::warn!(question_id = %q.id, %error, "question cannot be graded");
                rejected.push(RejectedQuestion { id: q.id, error });
            }
        }
    }

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
        rejected,
    })
}

/// Recursively load all `.toml` and `.json` banks from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if is_bank_file(&path) {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank file, or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_bank(path)?])
    }
}

/// A warning from question bank validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a bank for common authoring issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.question_count() == 0 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank contains no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    let ids = bank
        .questions
        .iter()
        .map(|q| &q.id)
        .chain(bank.rejected.iter().map(|q| &q.id));
    for id in ids {
        if !seen_ids.insert(id) {
            warnings.push(ValidationWarning::question(id, format!("duplicate question ID: {id}")));
        }
    }

    for rejected in &bank.rejected {
        warnings.push(ValidationWarning::question(
            &rejected.id,
            format!("question cannot be graded: {}", rejected.error),
        ));
    }

    for q in &bank.questions {
        if q.definition.points_possible == 0.0 {
            warnings.push(ValidationWarning::question(&q.id, "question is worth zero points"));
        }
        for message in content_warnings(&q.definition.content) {
            warnings.push(ValidationWarning::question(&q.id, message));
        }
    }

    warnings
}

fn content_warnings(content: &QuestionContent) -> Vec<String> {
    let mut out = Vec::new();

    match content {
        QuestionContent::MultipleChoiceSingle(c) => {
            if !c.options.is_empty() && !c.options.iter().any(|o| o.id == c.correct_answer) {
                out.push(format!(
                    "correctAnswer '{}' is not one of the options",
                    c.correct_answer
                ));
            }
        }
        QuestionContent::MultipleChoiceMulti(c) => {
            if c.correct_answers.is_empty() {
                out.push("correctAnswers is empty".into());
            }
            if !c.options.is_empty() {
                for id in &c.correct_answers {
                    if !c.options.iter().any(|o| &o.id == id) {
                        out.push(format!("correct answer '{id}' is not one of the options"));
                    }
                }
            }
            if let Some(rule) = &c.partial_credit_rule {
                out.push(format!(
                    "partialCreditRule '{rule}' is not applied; grading is all-or-nothing"
                ));
            }
        }
        QuestionContent::TrueFalse(_) => {}
        QuestionContent::Matching(c) => {
            if c.correct_pairs.is_empty() {
                out.push("correctPairs is empty; no answer can be correct".into());
            }
            if !c.left_items.is_empty() || !c.right_items.is_empty() {
                for pair in &c.correct_pairs {
                    if !c.left_items.is_empty() && !c.left_items.contains(&pair.left) {
                        out.push(format!("pair left '{}' is not in leftItems", pair.left));
                    }
                    if !c.right_items.is_empty() && !c.right_items.contains(&pair.right) {
                        out.push(format!("pair right '{}' is not in rightItems", pair.right));
                    }
                }
            }
            if let Some(strategy) = unapplied_strategy(
                c.partial_credit_strategy,
                PartialCreditStrategy::PerPair,
            ) {
                out.push(format!(
                    "partialCreditStrategy '{strategy}' does not apply to matching"
                ));
            }
        }
        QuestionContent::Ordering(c) => {
            if c.correct_order.is_empty() {
                out.push("correctOrder is empty; no answer can be correct".into());
            }
            for id in &c.correct_order {
                if !c.items.is_empty() && !c.items.contains(id) {
                    out.push(format!("correctOrder item '{id}' is not in items"));
                }
            }
            if let Some(strategy) = unapplied_strategy(
                c.partial_credit_strategy,
                PartialCreditStrategy::AdjacentPairs,
            ) {
                out.push(format!(
                    "partialCreditStrategy '{strategy}' does not apply to ordering"
                ));
            }
        }
        QuestionContent::FillInBlank(c) => {
            if c.blanks.is_empty() {
                out.push("no blanks defined; no answer can be correct".into());
            }
            for (index, blank) in c.blanks.iter().enumerate() {
                let label = blank.id.clone().unwrap_or_else(|| format!("#{index}"));
                if blank.accepted_answers.iter().all(|a| a.trim().is_empty()) {
                    out.push(format!("blank {label} has no usable acceptedAnswers"));
                }
                if blank.case_sensitive {
                    out.push(format!(
                        "blank {label}: caseSensitive is not applied; matching ignores case"
                    ));
                }
            }
        }
        QuestionContent::ShortAnswer(c) => {
            if c.keywords.is_empty() {
                out.push("no keywords defined; keyword statistics will be empty".into());
            }
            if let (Some(min), Some(max)) = (c.min_words, c.max_words) {
                if min > max {
                    out.push(format!("minWords ({min}) is greater than maxWords ({max})"));
                }
            }
        }
        QuestionContent::ProgramSubmission(c) => {
            if c.test_cases.is_empty() {
                out.push("no test cases defined; submissions will need manual review".into());
            }
            let mut seen = HashSet::new();
            for case in &c.test_cases {
                if !seen.insert(&case.id) {
                    out.push(format!("duplicate test case ID: {}", case.id));
                }
                if case.weight.is_nan() || case.weight <= 0.0 {
                    out.push(format!(
                        "test case '{}' has weight {} and will not count",
                        case.id, case.weight
                    ));
                }
            }
        }
    }

    out
}

/// The declared strategy if it is neither all-or-nothing nor the one
/// strategy the type applies.
fn unapplied_strategy(
    declared: Option<PartialCreditStrategy>,
    applied: PartialCreditStrategy,
) -> Option<PartialCreditStrategy> {
    declared.filter(|s| *s != applied && *s != PartialCreditStrategy::AllOrNothing)
}
