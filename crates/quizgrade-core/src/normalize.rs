//! Answer payload normalization.
//!
//! Clients submit answers either as the bare value (`"b"`, `["a", "c"]`,
//! `true`) or wrapped in a single-field object (`{"selectedOption": "b"}`).
//! Every accepted shape reduces to one canonical value per question type.
//! Anything else is a `MalformedAnswer`, which the engine grades as
//! not-correct instead of failing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{MatchPair, QuestionType};

/// Key every question type accepts as a wrapper, in addition to its own.
const GENERIC_WRAPPER_KEY: &str = "answer";

/// The payload did not have a shape the question type accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct MalformedAnswer {
    pub expected: &'static str,
    pub found: String,
}

impl MalformedAnswer {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: describe(value),
        }
    }
}

/// A program submission after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramAnswer {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// One canonical answer value per question type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalAnswer {
    SingleChoice(String),
    MultiChoice(BTreeSet<String>),
    TrueFalse(bool),
    Matching(Vec<MatchPair>),
    Ordering(Vec<String>),
    FillInBlank(Vec<String>),
    ShortAnswer(String),
    Program(ProgramAnswer),
}

impl CanonicalAnswer {
    /// The question type this answer was normalized for.
    pub fn question_type(&self) -> QuestionType {
        match self {
            CanonicalAnswer::SingleChoice(_) => QuestionType::MultipleChoiceSingle,
            CanonicalAnswer::MultiChoice(_) => QuestionType::MultipleChoiceMulti,
            CanonicalAnswer::TrueFalse(_) => QuestionType::TrueFalse,
            CanonicalAnswer::Matching(_) => QuestionType::Matching,
            CanonicalAnswer::Ordering(_) => QuestionType::Ordering,
            CanonicalAnswer::FillInBlank(_) => QuestionType::FillInBlank,
            CanonicalAnswer::ShortAnswer(_) => QuestionType::ShortAnswer,
            CanonicalAnswer::Program(_) => QuestionType::ProgramSubmission,
        }
    }
}

/// Normalize a raw payload for the given question type.
pub fn normalize(
    question_type: QuestionType,
    value: &Value,
) -> Result<CanonicalAnswer, MalformedAnswer> {
    Ok(match question_type {
        QuestionType::MultipleChoiceSingle => CanonicalAnswer::SingleChoice(single_choice(value)?),
        QuestionType::MultipleChoiceMulti => CanonicalAnswer::MultiChoice(multi_choice(value)?),
        QuestionType::TrueFalse => CanonicalAnswer::TrueFalse(true_false(value)?),
        QuestionType::Matching => CanonicalAnswer::Matching(matching(value)?),
        QuestionType::Ordering => CanonicalAnswer::Ordering(ordering(value)?),
        QuestionType::FillInBlank => CanonicalAnswer::FillInBlank(fill_in_blank(value)?),
        QuestionType::ShortAnswer => CanonicalAnswer::ShortAnswer(short_answer(value)?),
        QuestionType::ProgramSubmission => CanonicalAnswer::Program(program(value)?),
    })
}

pub fn single_choice(value: &Value) -> Result<String, MalformedAnswer> {
    const EXPECTED: &str = "an option id or {\"selectedOption\": id}";
    let inner = unwrap_single(value, "selectedOption", EXPECTED)?;
    as_string(inner).ok_or_else(|| MalformedAnswer::new(EXPECTED, value))
}

pub fn multi_choice(value: &Value) -> Result<BTreeSet<String>, MalformedAnswer> {
    const EXPECTED: &str = "an array of option ids or {\"selectedOptions\": [...]}";
    let inner = unwrap_single(value, "selectedOptions", EXPECTED)?;
    string_array(inner)
        .map(|ids| ids.into_iter().collect())
        .ok_or_else(|| MalformedAnswer::new(EXPECTED, value))
}

pub fn true_false(value: &Value) -> Result<bool, MalformedAnswer> {
    const EXPECTED: &str = "a boolean or {\"value\": bool}";
    let inner = unwrap_single(value, "value", EXPECTED)?;
    inner
        .as_bool()
        .ok_or_else(|| MalformedAnswer::new(EXPECTED, value))
}

pub fn matching(value: &Value) -> Result<Vec<MatchPair>, MalformedAnswer> {
    const EXPECTED: &str = "an array of {left, right} pairs or {\"pairs\": [...]}";
    let inner = unwrap_single(value, "pairs", EXPECTED)?;
    let items = inner
        .as_array()
        .ok_or_else(|| MalformedAnswer::new(EXPECTED, value))?;

    items
        .iter()
        .map(|item| {
            let obj = item
                .as_object()
                .filter(|o| o.len() == 2)
                .ok_or_else(|| MalformedAnswer::new(EXPECTED, value))?;
            let left = obj.get("left").and_then(as_string);
            let right = obj.get("right").and_then(as_string);
            match (left, right) {
                (Some(left), Some(right)) => Ok(MatchPair { left, right }),
                _ => Err(MalformedAnswer::new(EXPECTED, value)),
            }
        })
        .collect()
}

pub fn ordering(value: &Value) -> Result<Vec<String>, MalformedAnswer> {
    const EXPECTED: &str = "an array of item ids or {\"order\": [...]}";
    let inner = unwrap_single(value, "order", EXPECTED)?;
    string_array(inner).ok_or_else(|| MalformedAnswer::new(EXPECTED, value))
}

/// Blanks are positional; `null` marks a blank the learner left empty.
pub fn fill_in_blank(value: &Value) -> Result<Vec<String>, MalformedAnswer> {
    const EXPECTED: &str = "an array of strings or {\"blanks\": [...]}";
    let inner = unwrap_single(value, "blanks", EXPECTED)?;
    let items = inner
        .as_array()
        .ok_or_else(|| MalformedAnswer::new(EXPECTED, value))?;

    items
        .iter()
        .map(|item| match item {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s.clone()),
            _ => Err(MalformedAnswer::new(EXPECTED, value)),
        })
        .collect()
}

pub fn short_answer(value: &Value) -> Result<String, MalformedAnswer> {
    const EXPECTED: &str = "a string or {\"text\": string}";
    let inner = unwrap_single(value, "text", EXPECTED)?;
    as_string(inner).ok_or_else(|| MalformedAnswer::new(EXPECTED, value))
}

pub fn program(value: &Value) -> Result<ProgramAnswer, MalformedAnswer> {
    const EXPECTED: &str = "source code or {\"code\": string, \"language\"?: string}";
    match value {
        Value::String(code) => Ok(ProgramAnswer {
            code: code.clone(),
            language: None,
        }),
        Value::Object(obj) => {
            let code_key = ["code", GENERIC_WRAPPER_KEY]
                .into_iter()
                .find(|k| obj.contains_key(*k))
                .ok_or_else(|| MalformedAnswer::new(EXPECTED, value))?;
            let allowed = |k: &String| k == code_key || k == "language";
            if !obj.keys().all(allowed) {
                return Err(MalformedAnswer::new(EXPECTED, value));
            }

            let code = obj
                .get(code_key)
                .and_then(as_string)
                .ok_or_else(|| MalformedAnswer::new(EXPECTED, value))?;
            let language = match obj.get("language") {
                None | Some(Value::Null) => None,
                Some(Value::String(l)) => Some(l.clone()),
                Some(_) => return Err(MalformedAnswer::new(EXPECTED, value)),
            };
            Ok(ProgramAnswer { code, language })
        }
        _ => Err(MalformedAnswer::new(EXPECTED, value)),
    }
}

/// Strip a single-field wrapper object, or pass a bare value through.
///
/// Objects are only accepted as wrappers; a matching pair object at the
/// top level is not an answer on its own.
fn unwrap_single<'a>(
    value: &'a Value,
    key: &str,
    expected: &'static str,
) -> Result<&'a Value, MalformedAnswer> {
    match value {
        Value::Object(obj) => single_field(obj, key)
            .ok_or_else(|| MalformedAnswer::new(expected, value)),
        other => Ok(other),
    }
}

fn single_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if obj.len() != 1 {
        return None;
    }
    obj.get(key).or_else(|| obj.get(GENERIC_WRAPPER_KEY))
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(as_string)
        .collect::<Option<Vec<_>>>()
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "a boolean".into(),
        Value::Number(_) => "a number".into(),
        Value::String(_) => "a string".into(),
        Value::Array(items) => format!("an array of {} item(s)", items.len()),
        Value::Object(obj) => {
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            format!("an object with keys [{}]", keys.join(", "))
        }
    }
}
