//! Answer evaluation: rubric prompt, structured parsing with a heuristic
//! fallback, weighted scoring.

mod evaluator;
mod parse;
mod prompt;
mod rubric;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use evaluator::{AnswerEvaluator, BatchEvaluation, BatchItem, BatchSummary, PerformanceLevel};
pub use parse::{ParseError, parse_heuristic, parse_strict};
pub use prompt::evaluation_prompt;
pub use rubric::{Criterion, LevelDescriptions, Rubric};

use crate::types::{Aspect, Difficulty};

/// Score at or above which an answer counts as correct.
pub const CORRECT_THRESHOLD: u8 = 70;

/// Qualitative band for a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLevel {
    Excellent,
    Good,
    Satisfactory,
    NeedsImprovement,
    Incorrect,
}

impl ScoreLevel {
    /// `≥90 excellent, ≥80 good, ≥70 satisfactory, ≥60 needs_improvement`.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            80..=89 => Self::Good,
            70..=79 => Self::Satisfactory,
            60..=69 => Self::NeedsImprovement,
            _ => Self::Incorrect,
        }
    }

    /// Parse a level name as a model would write it.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "satisfactory" => Some(Self::Satisfactory),
            "needs_improvement" => Some(Self::NeedsImprovement),
            "incorrect" => Some(Self::Incorrect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Satisfactory => "satisfactory",
            Self::NeedsImprovement => "needs_improvement",
            Self::Incorrect => "incorrect",
        }
    }
}

impl fmt::Display for ScoreLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score for a single aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: u8,
    pub level: ScoreLevel,
    pub feedback: String,
}

impl CriterionScore {
    /// A score whose level is derived from the number.
    pub fn new(score: u8, feedback: impl Into<String>) -> Self {
        Self {
            score,
            level: ScoreLevel::from_score(score),
            feedback: feedback.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub score: u8,
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// Parsed rubric result for one answer, before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub correctness: CriterionScore,
    pub depth: CriterionScore,
    pub clarity: CriterionScore,
    pub overall: OverallAssessment,
}

impl Assessment {
    pub fn criterion(&self, aspect: Aspect) -> &CriterionScore {
        match aspect {
            Aspect::Correctness => &self.correctness,
            Aspect::Depth => &self.depth,
            Aspect::Clarity => &self.clarity,
        }
    }
}

/// Where an evaluation's scores came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    /// Structured output from the text generation service.
    Model,
    /// Numbers scraped from free text, or defaults.
    Heuristic,
}

/// A scored answer. Produced once per question and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub question_id: String,
    pub category: String,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub assessment: Assessment,
    pub weighted_score: u8,
    pub is_correct: bool,
    pub detailed_feedback: String,
    pub source: EvaluationSource,
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Overall score (0–100).
    pub fn score(&self) -> u8 {
        self.assessment.overall.score
    }

    pub fn criterion(&self, aspect: Aspect) -> &CriterionScore {
        self.assessment.criterion(aspect)
    }
}
