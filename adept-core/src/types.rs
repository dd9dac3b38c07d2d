//! Core value types shared by every part of the interview engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one interview session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a fresh, time-ordered session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("interview_{}", Uuid::now_v7().simple()))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Question difficulty, ordered from easiest to hardest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// The ordered difficulty scale.
    pub const SCALE: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Move `steps` positions along [`Difficulty::SCALE`], clamped at both ends.
    #[must_use]
    pub fn shift(self, steps: i8) -> Self {
        let idx = Self::SCALE.iter().position(|d| *d == self).unwrap_or(1) as i16;
        let max = (Self::SCALE.len() - 1) as i16;
        Self::SCALE[(idx + i16::from(steps)).clamp(0, max) as usize]
    }

    /// Answer time allowed when a question does not set its own.
    pub fn default_time_limit_secs(&self) -> u32 {
        match self {
            Self::Beginner => 180,
            Self::Intermediate => 300,
            Self::Advanced => 420,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One rubric dimension an answer is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Correctness,
    Depth,
    Clarity,
}

impl Aspect {
    pub const ALL: [Aspect; 3] = [Aspect::Correctness, Aspect::Depth, Aspect::Clarity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correctness => "correctness",
            Self::Depth => "depth",
            Self::Clarity => "clarity",
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question put to the respondent.
///
/// Corpus entries use the same shape; when the selector adopts one into a
/// session it gets a session-local `id` and keeps the corpus ID in
/// `source_id`. Once appended to a session a question is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(alias = "question")]
    pub prompt: String,
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(
        default,
        alias = "expectedAnswer",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_answer: Option<String>,
    #[serde(default, alias = "keyPoints", skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, alias = "timeLimit", skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u32>,
    /// Corpus ID this question was drawn from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Why the selector chose this question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        difficulty: Difficulty,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            difficulty,
            category: category.into(),
            expected_answer: None,
            key_points: Vec::new(),
            example: None,
            time_limit_secs: None,
            source_id: None,
            rationale: None,
        }
    }

    #[must_use]
    pub fn with_expected_answer(mut self, expected: impl Into<String>) -> Self {
        self.expected_answer = Some(expected.into());
        self
    }

    #[must_use]
    pub fn with_key_points(mut self, points: Vec<String>) -> Self {
        self.key_points = points;
        self
    }

    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Copy a corpus entry into a session under a session-local ID.
    #[must_use]
    pub fn adopt(&self, session_question_id: impl Into<String>, rationale: Option<String>) -> Self {
        Self {
            id: session_question_id.into(),
            source_id: Some(self.source_id.clone().unwrap_or_else(|| self.id.clone())),
            time_limit_secs: Some(
                self.time_limit_secs
                    .unwrap_or_else(|| self.difficulty.default_time_limit_secs()),
            ),
            rationale,
            ..self.clone()
        }
    }

    /// The corpus identity of this question (source ID, or own ID for corpus entries).
    pub fn corpus_id(&self) -> &str {
        self.source_id.as_deref().unwrap_or(&self.id)
    }
}

/// A free-text answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_secs: Option<u32>,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            content: content.into(),
            submitted_at: Utc::now(),
            time_spent_secs: None,
        }
    }

    #[must_use]
    pub fn with_time_spent(mut self, secs: u32) -> Self {
        self.time_spent_secs = Some(secs);
        self
    }
}

/// Caller-supplied settings for a new session. Unset fields take the
/// engine's configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn session_id(mut self, id: impl Into<SessionId>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn candidate_name(mut self, name: impl Into<String>) -> Self {
        self.candidate_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn total_questions(mut self, count: u32) -> Self {
        self.total_questions = Some(count);
        self
    }

    #[must_use]
    pub fn time_limit_minutes(mut self, minutes: u32) -> Self {
        self.time_limit_minutes = Some(minutes);
        self
    }
}

/// Fixed configuration of one session. Only `updated_at` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    pub topic: String,
    pub difficulty: Difficulty,
    pub total_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_shift_is_clamped() {
        assert_eq!(Difficulty::Intermediate.shift(1), Difficulty::Advanced);
        assert_eq!(Difficulty::Advanced.shift(1), Difficulty::Advanced);
        assert_eq!(Difficulty::Intermediate.shift(-1), Difficulty::Beginner);
        assert_eq!(Difficulty::Beginner.shift(-1), Difficulty::Beginner);
        assert_eq!(Difficulty::Beginner.shift(0), Difficulty::Beginner);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_serializes_snake_case() {
        let json = serde_json::to_string(&Difficulty::Beginner).unwrap();
        assert_eq!(json, "\"beginner\"");
    }

    #[test]
    fn session_ids_are_unique_and_prefixed() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("interview_"));
    }

    #[test]
    fn question_accepts_question_bank_field_names() {
        let json = r#"{
            "id": "f1",
            "question": "What does VLOOKUP do?",
            "difficulty": "beginner",
            "category": "formulas",
            "expectedAnswer": "Looks up a value in the first column",
            "keyPoints": ["lookup value", "table array"],
            "timeLimit": 120
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.prompt, "What does VLOOKUP do?");
        assert_eq!(q.key_points.len(), 2);
        assert_eq!(q.time_limit_secs, Some(120));
    }

    #[test]
    fn adopt_assigns_session_id_and_keeps_source() {
        let corpus = Question::new("pt-3", "Explain pivot caches", Difficulty::Advanced, "pivot_tables");
        let adopted = corpus.adopt("q_2", Some("harder".to_string()));

        assert_eq!(adopted.id, "q_2");
        assert_eq!(adopted.source_id.as_deref(), Some("pt-3"));
        assert_eq!(adopted.corpus_id(), "pt-3");
        assert_eq!(adopted.time_limit_secs, Some(420));
        assert_eq!(adopted.rationale.as_deref(), Some("harder"));
    }
}
