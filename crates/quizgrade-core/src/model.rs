//! Question data model.
//!
//! A `QuestionDefinition` is the trusted, authored description of a question:
//! its point value and its type-specific correct-answer content. It arrives
//! as JSON (or TOML in question banks) shaped as
//! `{ "questionType": "...", "pointsPossible": 2, "content": { ... } }`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GradingError;

/// Every question shape the engine can grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoiceSingle,
    MultipleChoiceMulti,
    TrueFalse,
    Matching,
    Ordering,
    FillInBlank,
    ShortAnswer,
    ProgramSubmission,
}

impl QuestionType {
    pub const ALL: [QuestionType; 8] = [
        QuestionType::MultipleChoiceSingle,
        QuestionType::MultipleChoiceMulti,
        QuestionType::TrueFalse,
        QuestionType::Matching,
        QuestionType::Ordering,
        QuestionType::FillInBlank,
        QuestionType::ShortAnswer,
        QuestionType::ProgramSubmission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoiceSingle => "multiple_choice_single",
            QuestionType::MultipleChoiceMulti => "multiple_choice_multi",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Matching => "matching",
            QuestionType::Ordering => "ordering",
            QuestionType::FillInBlank => "fill_in_blank",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::ProgramSubmission => "program_submission",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| GradingError::UnsupportedQuestionType(s.to_string()))
    }
}

/// Named policy for turning partial matches into a fractional score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialCreditStrategy {
    AllOrNothing,
    Proportional,
    PerPair,
    AdjacentPairs,
}

impl fmt::Display for PartialCreditStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialCreditStrategy::AllOrNothing => write!(f, "all_or_nothing"),
            PartialCreditStrategy::Proportional => write!(f, "proportional"),
            PartialCreditStrategy::PerPair => write!(f, "per_pair"),
            PartialCreditStrategy::AdjacentPairs => write!(f, "adjacent_pairs"),
        }
    }
}

/// A selectable option shown to the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleChoiceContent {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChoiceContent {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    pub correct_answers: Vec<String>,
    /// Declared by authors but not applied; grading is exact set equality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_credit_rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalseContent {
    pub correct_answer: bool,
}

/// A `{left, right}` association, used both in content and in answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

impl MatchPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingContent {
    #[serde(default)]
    pub left_items: Vec<String>,
    #[serde(default)]
    pub right_items: Vec<String>,
    pub correct_pairs: Vec<MatchPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_credit_strategy: Option<PartialCreditStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingContent {
    #[serde(default)]
    pub items: Vec<String>,
    pub correct_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_credit_strategy: Option<PartialCreditStrategy>,
}

/// One blank in a fill-in-the-blank question, matched by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blank {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub accepted_answers: Vec<String>,
    /// Parsed for completeness; matching is always case-insensitive.
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInBlankContent {
    pub blanks: Vec<Blank>,
}

/// A keyword a grader expects to see in a short answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub keyword: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortAnswerContent {
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_words: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_words: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
}

/// A test case the external sandbox runs against a program submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramTestCase {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<ProgramTestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
}

fn default_weight() -> f64 {
    1.0
}

/// Type-specific correct-answer content, one variant per question type.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionContent {
    MultipleChoiceSingle(SingleChoiceContent),
    MultipleChoiceMulti(MultiChoiceContent),
    TrueFalse(TrueFalseContent),
    Matching(MatchingContent),
    Ordering(OrderingContent),
    FillInBlank(FillInBlankContent),
    ShortAnswer(ShortAnswerContent),
    ProgramSubmission(ProgramContent),
}

impl QuestionContent {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionContent::MultipleChoiceSingle(_) => QuestionType::MultipleChoiceSingle,
            QuestionContent::MultipleChoiceMulti(_) => QuestionType::MultipleChoiceMulti,
            QuestionContent::TrueFalse(_) => QuestionType::TrueFalse,
            QuestionContent::Matching(_) => QuestionType::Matching,
            QuestionContent::Ordering(_) => QuestionType::Ordering,
            QuestionContent::FillInBlank(_) => QuestionType::FillInBlank,
            QuestionContent::ShortAnswer(_) => QuestionType::ShortAnswer,
            QuestionContent::ProgramSubmission(_) => QuestionType::ProgramSubmission,
        }
    }

    /// Parse type-specific content for an already-resolved question type.
    pub fn from_value(
        question_type: QuestionType,
        content: serde_json::Value,
    ) -> Result<Self, GradingError> {
        fn parse<T: serde::de::DeserializeOwned>(
            question_type: QuestionType,
            content: serde_json::Value,
        ) -> Result<T, GradingError> {
            serde_json::from_value(content)
                .map_err(|e| GradingError::invalid(question_type.as_str(), e.to_string()))
        }

        Ok(match question_type {
            QuestionType::MultipleChoiceSingle => {
                QuestionContent::MultipleChoiceSingle(parse(question_type, content)?)
            }
            QuestionType::MultipleChoiceMulti => {
                QuestionContent::MultipleChoiceMulti(parse(question_type, content)?)
            }
            QuestionType::TrueFalse => QuestionContent::TrueFalse(parse(question_type, content)?),
            QuestionType::Matching => QuestionContent::Matching(parse(question_type, content)?),
            QuestionType::Ordering => {
                let ordering: OrderingContent = parse(question_type, content)?;
                if let Some(id) = first_duplicate(&ordering.correct_order) {
                    return Err(GradingError::invalid(
                        question_type.as_str(),
                        format!("correctOrder lists '{id}' more than once"),
                    ));
                }
                QuestionContent::Ordering(ordering)
            }
            QuestionType::FillInBlank => {
                QuestionContent::FillInBlank(parse(question_type, content)?)
            }
            QuestionType::ShortAnswer => {
                QuestionContent::ShortAnswer(parse(question_type, content)?)
            }
            QuestionType::ProgramSubmission => {
                QuestionContent::ProgramSubmission(parse(question_type, content)?)
            }
        })
    }

    fn to_value(&self) -> serde_json::Value {
        let value = match self {
            QuestionContent::MultipleChoiceSingle(c) => serde_json::to_value(c),
            QuestionContent::MultipleChoiceMulti(c) => serde_json::to_value(c),
            QuestionContent::TrueFalse(c) => serde_json::to_value(c),
            QuestionContent::Matching(c) => serde_json::to_value(c),
            QuestionContent::Ordering(c) => serde_json::to_value(c),
            QuestionContent::FillInBlank(c) => serde_json::to_value(c),
            QuestionContent::ShortAnswer(c) => serde_json::to_value(c),
            QuestionContent::ProgramSubmission(c) => serde_json::to_value(c),
        };
        // Plain derived structs with string keys always serialize.
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// Repeated ids make adjacency credit ambiguous.
fn first_duplicate(ids: &[String]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().find(|id| !seen.insert(id.as_str())).map(String::as_str)
}

/// A trusted question definition: point value plus typed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawQuestionDefinition",
    into = "RawQuestionDefinition"
)]
pub struct QuestionDefinition {
    pub points_possible: f64,
    pub content: QuestionContent,
}

impl QuestionDefinition {
    pub fn new(points_possible: f64, content: QuestionContent) -> Self {
        Self {
            points_possible,
            content,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.content.question_type()
    }

    /// Parse a definition from JSON, keeping "unknown type" distinct from
    /// "known type with broken content".
    pub fn from_json(value: &serde_json::Value) -> Result<Self, GradingError> {
        let raw: RawQuestionDefinition = serde_json::from_value(value.clone())
            .map_err(|e| GradingError::invalid("question", e.to_string()))?;
        Self::try_from(raw)
    }
}

/// Wire shape of a question definition before the type is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestionDefinition {
    pub question_type: String,
    pub points_possible: f64,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl TryFrom<RawQuestionDefinition> for QuestionDefinition {
    type Error = GradingError;

    fn try_from(raw: RawQuestionDefinition) -> Result<Self, Self::Error> {
        let question_type: QuestionType = raw.question_type.parse()?;
        if !raw.points_possible.is_finite() || raw.points_possible < 0.0 {
            return Err(GradingError::invalid(
                question_type.as_str(),
                format!(
                    "pointsPossible must be a finite, non-negative number (got {})",
                    raw.points_possible
                ),
            ));
        }
        let content = QuestionContent::from_value(question_type, raw.content)?;
        Ok(QuestionDefinition {
            points_possible: raw.points_possible,
            content,
        })
    }
}

impl From<QuestionDefinition> for RawQuestionDefinition {
    fn from(def: QuestionDefinition) -> Self {
        RawQuestionDefinition {
            question_type: def.question_type().to_string(),
            points_possible: def.points_possible,
            content: def.content.to_value(),
        }
    }
}

/// A named collection of question definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Questions whose definitions parsed.
    pub questions: Vec<BankQuestion>,
    /// Questions that cannot be graded, kept so callers can report them.
    pub rejected: Vec<RejectedQuestion>,
}

impl QuestionBank {
    pub fn get(&self, question_id: &str) -> Option<&BankQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn rejection(&self, question_id: &str) -> Option<&RejectedQuestion> {
        self.rejected.iter().find(|q| q.id == question_id)
    }

    /// Number of questions, graded or not.
    pub fn question_count(&self) -> usize {
        self.questions.len() + self.rejected.len()
    }

    /// Sum of `points_possible` over gradable questions.
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.definition.points_possible).sum()
    }
}

/// A question in a bank.
#[derive(Debug, Clone, PartialEq)]
pub struct BankQuestion {
    pub id: String,
    pub title: Option<String>,
    pub definition: QuestionDefinition,
}

/// A bank entry whose definition could not be turned into a gradable question.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedQuestion {
    pub id: String,
    pub error: GradingError,
}
