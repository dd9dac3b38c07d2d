//! Per-session performance statistics and the adaptation decisions drawn
//! from them.

mod store;
mod tally;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use store::{InMemoryProfileStore, ProfileStore, SharedProfile};
pub use tally::{CategoryTally, TallyEntry};

use crate::evaluation::{CORRECT_THRESHOLD, Evaluation};
use crate::types::{Aspect, Difficulty, SessionId};

/// Sub-score at or above which an aspect counts as a strength.
pub const STRENGTH_THRESHOLD: u8 = 80;

/// Sub-score below which an aspect counts as a weakness.
pub const WEAKNESS_THRESHOLD: u8 = 60;

/// How many recent scores drive trend and adaptation.
pub const RECENT_WINDOW: usize = 3;

const TREND_MARGIN: i16 = 10;
const INCREASE_AT: f64 = 85.0;
const DECREASE_AT: f64 = 60.0;

/// Direction of recent scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl Trend {
    /// Compare the first and last score of the trailing window.
    pub fn from_scores(scores: &[u8]) -> Self {
        let window = &scores[scores.len().saturating_sub(RECENT_WINDOW)..];
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return Self::Stable;
        };
        if window.len() < 2 {
            return Self::Stable;
        }
        let diff = i16::from(*last) - i16::from(*first);
        if diff > TREND_MARGIN {
            Self::Improving
        } else if diff < -TREND_MARGIN {
            Self::Declining
        } else {
            Self::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        })
    }
}

/// Whether the next question should be easier, the same, or harder.
/// Serialized as `-1`, `0`, `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum AdaptationLevel {
    Decrease,
    #[default]
    Hold,
    Increase,
}

impl AdaptationLevel {
    /// Mean of the trailing window: `≥85` increase, `≤60` decrease.
    /// An empty history holds.
    pub fn from_scores(scores: &[u8]) -> Self {
        let window = &scores[scores.len().saturating_sub(RECENT_WINDOW)..];
        if window.is_empty() {
            return Self::Hold;
        }
        let sum: u32 = window.iter().map(|s| u32::from(*s)).sum();
        let mean = f64::from(sum) / window.len() as f64;
        if mean >= INCREASE_AT {
            Self::Increase
        } else if mean <= DECREASE_AT {
            Self::Decrease
        } else {
            Self::Hold
        }
    }

    pub fn as_i8(&self) -> i8 {
        match self {
            Self::Decrease => -1,
            Self::Hold => 0,
            Self::Increase => 1,
        }
    }
}

impl From<AdaptationLevel> for i8 {
    fn from(level: AdaptationLevel) -> Self {
        level.as_i8()
    }
}

impl TryFrom<i8> for AdaptationLevel {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Decrease),
            0 => Ok(Self::Hold),
            1 => Ok(Self::Increase),
            other => Err(format!("adaptation level must be -1, 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for AdaptationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.as_i8())
    }
}

/// One recorded evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub question_id: String,
    pub score: u8,
    pub correctness: u8,
    pub depth: u8,
    pub clarity: u8,
    pub category: String,
    pub difficulty: Difficulty,
    pub recorded_at: DateTime<Utc>,
}

/// Difficulty a question was answered at, and how it went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyStep {
    pub difficulty: Difficulty,
    pub score: u8,
    pub recorded_at: DateTime<Utc>,
}

/// What the selector should look for next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPlan {
    pub difficulty: Difficulty,
    pub category: Option<String>,
    pub adaptation_level: AdaptationLevel,
}

/// Running statistics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub session_id: SessionId,
    pub history: Vec<PerformanceRecord>,
    pub difficulty_progression: Vec<DifficultyStep>,
    pub strengths: CategoryTally,
    pub weaknesses: CategoryTally,
    pub current_difficulty: Difficulty,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub total_score: u32,
    pub average_score: f64,
    pub trend: Trend,
    pub adaptation_level: AdaptationLevel,
    pub last_updated: DateTime<Utc>,
}

impl PerformanceProfile {
    pub fn new(session_id: SessionId, starting_difficulty: Difficulty) -> Self {
        Self {
            session_id,
            history: Vec::new(),
            difficulty_progression: Vec::new(),
            strengths: CategoryTally::new(),
            weaknesses: CategoryTally::new(),
            current_difficulty: starting_difficulty,
            total_questions: 0,
            correct_answers: 0,
            total_score: 0,
            average_score: 0.0,
            trend: Trend::Stable,
            adaptation_level: AdaptationLevel::Hold,
            last_updated: Utc::now(),
        }
    }

    /// Fold one evaluation into the statistics.
    pub fn record(&mut self, evaluation: &Evaluation) {
        let now = Utc::now();
        let score = evaluation.score();

        self.history.push(PerformanceRecord {
            question_id: evaluation.question_id.clone(),
            score,
            correctness: evaluation.assessment.correctness.score,
            depth: evaluation.assessment.depth.score,
            clarity: evaluation.assessment.clarity.score,
            category: evaluation.category.clone(),
            difficulty: evaluation.difficulty,
            recorded_at: now,
        });

        self.total_questions += 1;
        if score >= CORRECT_THRESHOLD {
            self.correct_answers += 1;
        }
        self.total_score += u32::from(score);
        self.average_score = f64::from(self.total_score) / self.history.len() as f64;

        for aspect in Aspect::ALL {
            let sub = evaluation.criterion(aspect).score;
            if sub >= STRENGTH_THRESHOLD {
                self.strengths.observe(&evaluation.category, aspect);
            }
            if sub < WEAKNESS_THRESHOLD {
                self.weaknesses.observe(&evaluation.category, aspect);
            }
        }

        self.difficulty_progression.push(DifficultyStep {
            difficulty: evaluation.difficulty,
            score,
            recorded_at: now,
        });

        let scores = self.scores();
        self.trend = Trend::from_scores(&scores);
        self.adaptation_level = AdaptationLevel::from_scores(&scores);
        self.last_updated = now;
    }

    /// Make `difficulty` the current level, once a question at that level
    /// has actually been chosen.
    pub fn commit_difficulty(&mut self, difficulty: Difficulty) {
        self.current_difficulty = difficulty;
        self.last_updated = Utc::now();
    }

    /// Overall scores in recording order.
    pub fn scores(&self) -> Vec<u8> {
        self.history.iter().map(|r| r.score).collect()
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn adaptation_level(&self) -> AdaptationLevel {
        self.adaptation_level
    }

    pub fn next_difficulty(&self) -> Difficulty {
        self.current_difficulty.shift(self.adaptation_level.as_i8())
    }

    /// Most-weak category, else most-strong, else `None` (choose freely).
    pub fn recommended_category(&self) -> Option<String> {
        self.weaknesses
            .leader()
            .or_else(|| self.strengths.leader())
            .map(|e| e.category.clone())
    }

    /// Percentage of answers scoring at least [`CORRECT_THRESHOLD`].
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) / f64::from(self.total_questions) * 100.0
    }

    pub fn plan(&self) -> SelectionPlan {
        SelectionPlan {
            difficulty: self.next_difficulty(),
            category: self.recommended_category(),
            adaptation_level: self.adaptation_level,
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            session_id: self.session_id.clone(),
            total_questions: self.total_questions,
            correct_answers: self.correct_answers,
            accuracy: self.accuracy().round() as u8,
            average_score: self.average_score.round() as u8,
            current_difficulty: self.current_difficulty,
            trend: self.trend,
            adaptation_level: self.adaptation_level,
            strengths: self.strengths.top(3),
            weaknesses: self.weaknesses.top(3),
            last_updated: self.last_updated,
        }
    }

    /// Summary plus history and study recommendations.
    pub fn insights(&self) -> ProfileInsights {
        let summary = self.summary();
        let mut recommendations = Vec::new();

        if summary.total_questions > 0 && summary.accuracy < 60 {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Difficulty,
                priority: Priority::High,
                message: "Consider focusing on beginner-level questions to build foundational knowledge"
                    .to_string(),
            });
        }
        if let Some(weakest) = summary.weaknesses.first() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Category,
                priority: Priority::Medium,
                message: format!("Focus on {} to strengthen your weak areas", weakest.category),
            });
        }
        if summary.average_score >= 85 {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Challenge,
                priority: Priority::Low,
                message: "You're ready for advanced concepts and real-world scenarios".to_string(),
            });
        }

        ProfileInsights {
            summary,
            difficulty_progression: self.difficulty_progression.clone(),
            history: self.history.clone(),
            recommendations,
        }
    }
}

/// Read-only projection of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub session_id: SessionId,
    pub total_questions: u32,
    pub correct_answers: u32,
    /// Rounded percentage.
    pub accuracy: u8,
    pub average_score: u8,
    pub current_difficulty: Difficulty,
    pub trend: Trend,
    pub adaptation_level: AdaptationLevel,
    pub strengths: Vec<TallyEntry>,
    pub weaknesses: Vec<TallyEntry>,
    pub last_updated: DateTime<Utc>,
}

impl ProfileSummary {
    pub fn strength_categories(&self) -> Vec<&str> {
        self.strengths.iter().map(|e| e.category.as_str()).collect()
    }

    pub fn weakness_categories(&self) -> Vec<&str> {
        self.weaknesses.iter().map(|e| e.category.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Difficulty,
    Category,
    Challenge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInsights {
    pub summary: ProfileSummary,
    pub difficulty_progression: Vec<DifficultyStep>,
    pub history: Vec<PerformanceRecord>,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;

    use crate::evaluation::{
        Assessment, CriterionScore, Evaluation, EvaluationSource, OverallAssessment,
    };
    use crate::types::Difficulty;

    /// An evaluation with the same score on every aspect.
    pub fn evaluation(question_id: &str, category: &str, score: u8) -> Evaluation {
        evaluation_with(question_id, category, Difficulty::Intermediate, [score; 3], score)
    }

    pub fn evaluation_with(
        question_id: &str,
        category: &str,
        difficulty: Difficulty,
        subs: [u8; 3],
        overall: u8,
    ) -> Evaluation {
        Evaluation {
            question_id: question_id.to_string(),
            category: category.to_string(),
            difficulty,
            assessment: Assessment {
                correctness: CriterionScore::new(subs[0], "c"),
                depth: CriterionScore::new(subs[1], "d"),
                clarity: CriterionScore::new(subs[2], "l"),
                overall: OverallAssessment {
                    score: overall,
                    feedback: "overall".to_string(),
                    strengths: Vec::new(),
                    improvements: Vec::new(),
                },
            },
            weighted_score: overall,
            is_correct: overall >= 70,
            detailed_feedback: String::new(),
            source: EvaluationSource::Model,
            evaluated_at: Utc::now(),
        }
    }
}
