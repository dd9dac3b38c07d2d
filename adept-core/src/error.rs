//! Error types for adept-core

use thiserror::Error;

use crate::machine::StateTag;
use crate::types::Difficulty;

/// Result type alias using the interview error type.
pub type Result<T> = std::result::Result<T, InterviewError>;

/// Top-level error type for the interview engine
#[derive(Error, Debug)]
pub enum InterviewError {
    /// An operation needed text generation but none is configured.
    #[error("Text generation service is not configured")]
    ServiceUnavailable,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No questions available for {difficulty} difficulty{}", category_suffix(.category))]
    NoQuestionsAvailable {
        difficulty: Difficulty,
        category: Option<String>,
    },

    /// Model output could not be parsed. Never leaves the evaluator; the
    /// heuristic parser takes over.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: StateTag, to: StateTag },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InterviewError {
    /// Whether the caller should see this error as a direct `Err` rather
    /// than as an interview moved into the error state.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable
                | Self::Validation(_)
                | Self::NotFound(_)
                | Self::InvalidTransition { .. }
        )
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

fn category_suffix(category: &Option<String>) -> String {
    match category {
        Some(c) => format!(" in category {c}"),
        None => String::new(),
    }
}
