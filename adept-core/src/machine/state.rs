//! Interview state aggregate and transition rules.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluation;
use crate::profile::AdaptationLevel;
use crate::types::{Answer, Question, Session};
use crate::{InterviewError, Result};

/// Where an interview is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    Idle,
    Intro,
    AskingQuestions,
    CollectingAnswers,
    Evaluating,
    Summary,
    Completed,
    Error,
}

impl StateTag {
    /// States reachable in one step. Staying put is always allowed and not listed.
    pub fn allowed_targets(self) -> &'static [StateTag] {
        use StateTag::*;
        match self {
            Idle => &[Intro, Error],
            Intro => &[AskingQuestions, Error],
            AskingQuestions => &[CollectingAnswers, Evaluating, Summary, Error],
            CollectingAnswers => &[AskingQuestions, Evaluating, Error],
            Evaluating => &[AskingQuestions, Summary, Error],
            Summary => &[Completed, Error],
            Completed => &[],
            Error => &[Idle, Intro],
        }
    }

    pub fn can_transition_to(self, to: StateTag) -> bool {
        self == to || self.allowed_targets().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self == StateTag::Completed
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Intro => "intro",
            Self::AskingQuestions => "asking_questions",
            Self::CollectingAnswers => "collecting_answers",
            Self::Evaluating => "evaluating",
            Self::Summary => "summary",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters derived from the question, answer and evaluation lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub questions_asked: u32,
    /// Distinct questions with at least one answer.
    pub questions_answered: u32,
    pub questions_evaluated: u32,
    pub total_score: u32,
    pub average_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    pub current_message: String,
    pub is_waiting_for_answer: bool,
    pub show_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_secs: Option<i64>,
    /// Prompts sent to the text generator on behalf of this session.
    pub llm_calls: u32,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptation_level: Option<AdaptationLevel>,
}

/// Partial UI update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiPatch {
    pub current_message: Option<String>,
    pub is_waiting_for_answer: Option<bool>,
    pub show_summary: Option<bool>,
    pub error_message: Option<String>,
}

/// Partial metadata update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataPatch {
    pub llm_calls: Option<u32>,
    pub last_activity: Option<DateTime<Utc>>,
    pub adaptive_reasoning: Option<String>,
}

/// Changes a caller applies before a step runs. Lists are appended,
/// scalars replaced, nested records merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepAction {
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub current_question_index: Option<usize>,
    #[serde(default)]
    pub current_state: Option<StateTag>,
    #[serde(default)]
    pub ui: Option<UiPatch>,
    #[serde(default)]
    pub metadata: Option<MetadataPatch>,
}

impl StepAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// An action that only moves to `state`.
    pub fn goto(state: StateTag) -> Self {
        Self {
            current_state: Some(state),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_answer(mut self, answer: Answer) -> Self {
        self.answers.push(answer);
        self
    }

    #[must_use]
    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluations.push(evaluation);
        self
    }

    #[must_use]
    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.current_question_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_ui(mut self, ui: UiPatch) -> Self {
        self.ui = Some(ui);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: MetadataPatch) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// The whole interview as one value. Steps return a new value rather than
/// mutating the caller's copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    pub session: Session,
    pub current_state: StateTag,
    pub current_question_index: usize,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub evaluations: Vec<Evaluation>,
    pub progress: Progress,
    pub ui: UiState,
    pub metadata: Metadata,
    /// Markdown report, set once the summary has been written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
}

impl InterviewState {
    /// A fresh interview in `idle`.
    pub fn new(session: Session) -> Self {
        let now = session.created_at;
        Self {
            session,
            current_state: StateTag::Idle,
            current_question_index: 0,
            questions: Vec::new(),
            answers: Vec::new(),
            evaluations: Vec::new(),
            progress: Progress::default(),
            ui: UiState::default(),
            metadata: Metadata {
                started_at: now,
                ended_at: None,
                total_duration_secs: None,
                llm_calls: 0,
                last_activity: now,
                adaptive_reasoning: None,
                adaptation_level: None,
            },
            final_report: None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Latest answer for a question.
    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().rev().find(|a| a.question_id == question_id)
    }

    pub fn evaluation_for(&self, question_id: &str) -> Option<&Evaluation> {
        self.evaluations.iter().find(|e| e.question_id == question_id)
    }

    /// Whether `index` is past the session's last question.
    pub fn is_past_last_question(&self, index: usize) -> bool {
        index >= self.session.total_questions as usize
    }

    pub fn is_completed(&self) -> bool {
        self.current_state.is_terminal()
    }

    /// Move to `to` if the transition table allows it.
    pub fn enter(&mut self, to: StateTag) -> Result<()> {
        if !self.current_state.can_transition_to(to) {
            return Err(InterviewError::InvalidTransition {
                from: self.current_state,
                to,
            });
        }
        self.current_state = to;
        Ok(())
    }

    pub fn touch(&mut self) {
        let now = Utc::now();
        self.metadata.last_activity = now;
        self.session.updated_at = now;
    }

    pub fn recompute_progress(&mut self) {
        let answered: HashSet<&str> = self.answers.iter().map(|a| a.question_id.as_str()).collect();
        let total_score: u32 = self.evaluations.iter().map(|e| u32::from(e.score())).sum();
        let evaluated = self.evaluations.len();

        self.progress = Progress {
            questions_asked: self.questions.len() as u32,
            questions_answered: answered.len() as u32,
            questions_evaluated: evaluated as u32,
            total_score,
            average_score: if evaluated == 0 {
                0.0
            } else {
                f64::from(total_score) / evaluated as f64
            },
        };
    }

    /// Merge a caller action into this state.
    ///
    /// Rejects transitions the table does not allow, a decreasing question
    /// index, and a second evaluation for the same question.
    pub fn apply(&mut self, action: StepAction) -> Result<()> {
        if self.is_completed() {
            return Err(InterviewError::validation("interview is already completed"));
        }

        if let Some(to) = action.current_state
            && !self.current_state.can_transition_to(to)
        {
            return Err(InterviewError::InvalidTransition {
                from: self.current_state,
                to,
            });
        }

        if let Some(index) = action.current_question_index {
            if index < self.current_question_index {
                return Err(InterviewError::Validation(format!(
                    "question index cannot move backwards ({} -> {index})",
                    self.current_question_index
                )));
            }
            if index > self.session.total_questions as usize {
                return Err(InterviewError::Validation(format!(
                    "question index {index} is beyond the {} questions in this session",
                    self.session.total_questions
                )));
            }
        }

        for evaluation in &action.evaluations {
            if self.evaluation_for(&evaluation.question_id).is_some()
                || action
                    .evaluations
                    .iter()
                    .filter(|e| e.question_id == evaluation.question_id)
                    .count()
                    > 1
            {
                return Err(InterviewError::Validation(format!(
                    "question {} already has an evaluation",
                    evaluation.question_id
                )));
            }
        }

        if action.answers.iter().any(|a| a.content.trim().is_empty()) {
            return Err(InterviewError::validation("answer text is empty"));
        }

        // Everything below is infallible.
        if let Some(to) = action.current_state {
            self.current_state = to;
        }
        if let Some(index) = action.current_question_index {
            self.current_question_index = index;
        }
        self.questions.extend(action.questions);
        self.answers.extend(action.answers);
        self.evaluations.extend(action.evaluations);

        if let Some(ui) = action.ui {
            if let Some(message) = ui.current_message {
                self.ui.current_message = message;
            }
            if let Some(waiting) = ui.is_waiting_for_answer {
                self.ui.is_waiting_for_answer = waiting;
            }
            if let Some(show) = ui.show_summary {
                self.ui.show_summary = show;
            }
            if ui.error_message.is_some() {
                self.ui.error_message = ui.error_message;
            }
        }

        if let Some(metadata) = action.metadata {
            if let Some(calls) = metadata.llm_calls {
                self.metadata.llm_calls = calls;
            }
            if let Some(at) = metadata.last_activity {
                self.metadata.last_activity = at;
            }
            if metadata.adaptive_reasoning.is_some() {
                self.metadata.adaptive_reasoning = metadata.adaptive_reasoning;
            }
        }

        self.recompute_progress();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::testing::evaluation;
    use crate::types::{Difficulty, SessionId};

    fn state() -> InterviewState {
        let now = Utc::now();
        InterviewState::new(Session {
            id: SessionId::from("s1"),
            candidate_name: None,
            topic: "Excel".to_string(),
            difficulty: Difficulty::Intermediate,
            total_questions: 3,
            time_limit_minutes: None,
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn transition_table() {
        use StateTag::*;
        assert!(Idle.can_transition_to(Intro));
        assert!(!Idle.can_transition_to(Evaluating));
        assert!(AskingQuestions.can_transition_to(Summary));
        assert!(Evaluating.can_transition_to(AskingQuestions));
        assert!(!Summary.can_transition_to(AskingQuestions));
        assert!(Error.can_transition_to(Intro));
        assert!(!Error.can_transition_to(AskingQuestions));
        assert!(Completed.allowed_targets().is_empty());
        assert!(Completed.is_terminal());
        assert!(!Error.is_terminal());
    }

    #[test]
    fn error_is_reachable_from_every_non_terminal_state() {
        use StateTag::*;
        for tag in [Idle, Intro, AskingQuestions, CollectingAnswers, Evaluating, Summary] {
            assert!(tag.can_transition_to(Error), "{tag} -> error");
        }
    }

    #[test]
    fn state_tags_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&StateTag::AskingQuestions).unwrap(),
            "\"asking_questions\""
        );
        assert_eq!(StateTag::CollectingAnswers.to_string(), "collecting_answers");
    }

    #[test]
    fn apply_appends_lists_and_merges_ui() {
        let mut s = state();
        s.current_state = StateTag::AskingQuestions;
        s.ui.current_message = "old".to_string();

        s.apply(
            StepAction::new()
                .with_question(Question::new("q_1", "SUM?", Difficulty::Beginner, "formulas"))
                .with_answer(Answer::new("q_1", "adds"))
                .with_ui(UiPatch {
                    is_waiting_for_answer: Some(true),
                    ..Default::default()
                }),
        )
        .unwrap();

        assert_eq!(s.questions.len(), 1);
        assert_eq!(s.answers.len(), 1);
        assert_eq!(s.ui.current_message, "old");
        assert!(s.ui.is_waiting_for_answer);
        assert_eq!(s.progress.questions_asked, 1);
        assert_eq!(s.progress.questions_answered, 1);
    }

    #[test]
    fn apply_rejects_illegal_transition() {
        let mut s = state();
        let err = s.apply(StepAction::goto(StateTag::Summary)).unwrap_err();
        assert!(matches!(
            err,
            InterviewError::InvalidTransition {
                from: StateTag::Idle,
                to: StateTag::Summary
            }
        ));
        assert_eq!(s.current_state, StateTag::Idle);
    }

    #[test]
    fn apply_rejects_backwards_index() {
        let mut s = state();
        s.current_question_index = 2;
        assert!(matches!(
            s.apply(StepAction::new().with_index(1)),
            Err(InterviewError::Validation(_))
        ));
    }

    #[test]
    fn rejected_action_leaves_state_untouched() {
        let mut s = state();
        s.current_state = StateTag::AskingQuestions;
        s.current_question_index = 2;
        let before = s.clone();

        let err = s
            .apply(
                StepAction::goto(StateTag::CollectingAnswers)
                    .with_index(1)
                    .with_answer(Answer::new("q_1", "adds")),
            )
            .unwrap_err();
        assert!(matches!(err, InterviewError::Validation(_)));
        assert_eq!(s, before);

        let err = s
            .apply(StepAction::goto(StateTag::Evaluating).with_answer(Answer::new("q_1", " ")))
            .unwrap_err();
        assert!(matches!(err, InterviewError::Validation(_)));
        assert_eq!(s.current_state, StateTag::AskingQuestions);
        assert_eq!(s, before);
    }

    #[test]
    fn apply_rejects_duplicate_evaluation() {
        let mut s = state();
        s.apply(StepAction::new().with_evaluation(evaluation("q_1", "formulas", 80)))
            .unwrap();

        let err = s
            .apply(StepAction::new().with_evaluation(evaluation("q_1", "formulas", 90)))
            .unwrap_err();
        assert!(matches!(err, InterviewError::Validation(_)));
        assert_eq!(s.evaluations.len(), 1);
    }

    #[test]
    fn completed_state_rejects_actions() {
        let mut s = state();
        s.current_state = StateTag::Completed;
        assert!(s.apply(StepAction::new()).is_err());
    }

    #[test]
    fn progress_counts_distinct_answers_and_averages() {
        let mut s = state();
        s.answers.push(Answer::new("q_1", "a"));
        s.answers.push(Answer::new("q_1", "a, revised"));
        s.answers.push(Answer::new("q_2", "b"));
        s.evaluations.push(evaluation("q_1", "formulas", 80));
        s.evaluations.push(evaluation("q_2", "formulas", 65));
        s.recompute_progress();

        assert_eq!(s.progress.questions_answered, 2);
        assert_eq!(s.progress.questions_evaluated, 2);
        assert_eq!(s.progress.total_score, 145);
        assert!((s.progress.average_score - 72.5).abs() < f64::EPSILON);
        assert_eq!(s.answer_for("q_1").unwrap().content, "a, revised");
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut s = state();
        s.apply(StepAction::new().with_evaluation(evaluation("q_1", "formulas", 80)))
            .unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: InterviewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
