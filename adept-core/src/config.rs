//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::evaluation::Rubric;
use crate::types::Difficulty;
use crate::{InterviewError, Result};

/// Upper bound on questions per session.
pub const MAX_TOTAL_QUESTIONS: u32 = 50;

/// Defaults and behavior switches for [`InterviewMachine`](crate::InterviewMachine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub default_topic: String,
    pub default_difficulty: Difficulty,
    pub default_total_questions: u32,
    /// Per-call budget for the text generation service.
    pub generation_timeout_secs: u64,
    /// Ask the model for personalized feedback after each answer.
    pub adaptive_feedback: bool,
    /// Refuse to start sessions when no text generator is configured.
    /// When false the engine runs entirely on fallbacks.
    pub require_generator: bool,
    pub rubric: Rubric,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            default_topic: "Excel".to_string(),
            default_difficulty: Difficulty::Intermediate,
            default_total_questions: 5,
            generation_timeout_secs: 30,
            adaptive_feedback: true,
            require_generator: true,
            rubric: Rubric::default(),
        }
    }
}

impl InterviewConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_total_questions == 0 || self.default_total_questions > MAX_TOTAL_QUESTIONS
        {
            return Err(InterviewError::Validation(format!(
                "default_total_questions must be between 1 and {MAX_TOTAL_QUESTIONS}"
            )));
        }
        if self.generation_timeout_secs == 0 {
            return Err(InterviewError::validation(
                "generation_timeout_secs must be positive",
            ));
        }
        self.rubric.validate()
    }
}
