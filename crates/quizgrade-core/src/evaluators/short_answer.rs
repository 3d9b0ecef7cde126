//! Short answer evaluator (assistive only).
//!
//! Short answers are always left for a human grader. The statistics here
//! help that grader; they never become `points_earned`.

use crate::model::{Keyword, ShortAnswerContent};
use crate::partial_credit;
use crate::results::{Evaluation, GradingDetails, KeywordHit, Outcome, ShortAnswerDetails};

pub fn evaluate(content: &ShortAnswerContent, text: &str, points_possible: f64) -> Evaluation {
    let words = tokenize(text);
    let keywords: Vec<KeywordHit> = content
        .keywords
        .iter()
        .map(|keyword| detect(keyword, &words))
        .collect();

    let keyword_score = partial_credit::proportional(keywords.iter().map(|k| (k.weight, k.found)));
    let all_required_found = keywords.iter().filter(|k| k.required).all(|k| k.found);

    let word_count = text.split_whitespace().count();
    let within_word_limits = content.min_words.map_or(true, |min| word_count >= min)
        && content.max_words.map_or(true, |max| word_count <= max);

    Evaluation::new(
        Outcome::PendingReview,
        GradingDetails::ShortAnswer(ShortAnswerDetails {
            word_count,
            character_count: text.trim().chars().count(),
            keywords,
            keyword_score,
            all_required_found,
            within_word_limits,
            suggested_points: keyword_score * points_possible.max(0.0),
        }),
    )
}

fn detect(keyword: &Keyword, words: &[String]) -> KeywordHit {
    let matched_term = std::iter::once(&keyword.keyword)
        .chain(&keyword.synonyms)
        .find(|term| contains_phrase(words, &tokenize(term)))
        .cloned();

    KeywordHit {
        keyword: keyword.keyword.clone(),
        found: matched_term.is_some(),
        matched_term,
        weight: keyword.weight,
        required: keyword.required,
    }
}

/// Lower-cased alphanumeric words.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whole-word, contiguous phrase match.
fn contains_phrase(words: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && words.windows(phrase.len()).any(|window| window == phrase)
}
