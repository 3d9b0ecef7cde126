//! quizgrade-core: answer evaluation and auto-grading engine.
//!
//! This crate defines the question data model, answer normalization, the
//! per-type evaluators, partial-credit strategies and the grading result
//! that the rest of quizgrade builds on.

pub mod engine;
pub mod error;
pub mod evaluators;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod partial_credit;
pub mod report;
pub mod results;
pub mod statistics;
pub mod traits;

pub use engine::{GradingConfig, GradingEngine};
pub use error::{GradingError, SandboxError};
pub use model::{QuestionContent, QuestionDefinition, QuestionType};
pub use results::{GradingDetails, GradingResult, GradingStatus, SandboxExecution, TestResult};
