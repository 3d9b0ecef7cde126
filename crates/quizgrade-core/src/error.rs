//! Grading and sandbox error types.
//!
//! `GradingError` covers everything that means "the engine could not judge"
//! as opposed to "the learner was wrong". `SandboxError` is defined here so
//! the sandbox runner and the engine agree on how communication failures
//! are classified without string matching.

use thiserror::Error;

use crate::results::GradingStatus;

/// Errors that stop a response from being graded at all.
///
/// A caller receiving any of these must treat the response as ungraded and
/// must not persist a score for it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    /// The question type string is not one the engine knows how to grade.
    #[error("unsupported question type: {0}")]
    UnsupportedQuestionType(String),

    /// The trusted question definition does not match its type's schema.
    #[error("invalid {question_type} definition: {reason}")]
    InvalidQuestionDefinition {
        question_type: String,
        reason: String,
    },

    /// A manual grade was applied to a result that is not awaiting review.
    #[error("cannot apply a manual grade to a result in state {from}")]
    InvalidTransition { from: GradingStatus },

    /// A manual grade fell outside `0..=points_possible`.
    #[error("manual grade {points} is outside 0..={points_possible}")]
    ManualGradeOutOfRange { points: f64, points_possible: f64 },
}

impl GradingError {
    pub(crate) fn invalid(question_type: impl Into<String>, reason: impl Into<String>) -> Self {
        GradingError::InvalidQuestionDefinition {
            question_type: question_type.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur when talking to an external code-execution sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// The sandbox returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The sandbox returned an error response.
    #[error("sandbox error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request to the sandbox itself timed out.
    #[error("sandbox request timed out after {0}ms")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The sandbox answered with something that could not be decoded.
    #[error("invalid sandbox response: {0}")]
    InvalidResponse(String),
}

impl SandboxError {
    /// Returns `true` if retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            SandboxError::AuthenticationFailed(_) | SandboxError::InvalidResponse(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SandboxError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
