//! Interview question generation
//!
//! The controller turns a [`TurnContext`] into the next question, guarding
//! against the model repeating itself. Session state (visited topics, turn
//! numbers) lives in [`crate::session`]; this module only reads it through the
//! context it is handed.

pub mod controller;
pub mod duplicate;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod types;

pub use controller::QuestionGenerationController;
pub use duplicate::{DuplicateDetector, normalize_question};
pub use error::GenerationError;
pub use parser::parse_question;
pub use prompt::{PromptBuilder, PromptMode};
pub use types::{GeneratedQuestion, QuestionOutcome, QuestionPayload, TurnContext};
