//! Interview state machine.
//!
//! [`InterviewMachine`] is the entry point callers drive. Each [`step`]
//! merges an optional caller action into the state and then runs exactly
//! one handler for the current [`StateTag`]:
//!
//! ```text
//! idle -> intro -> asking_questions <-> collecting_answers
//!                        |   ^                 |
//!                        v   |                 v
//!                       evaluating <-----------+
//!                        |
//!                        v
//!                     summary -> completed
//!
//! any non-terminal state -> error -> idle | intro
//! ```
//!
//! [`step`]: InterviewMachine::step

mod handlers;
mod state;

pub use state::{
    InterviewState, Metadata, MetadataPatch, Progress, StateTag, StepAction, UiPatch, UiState,
};

use std::sync::Arc;

use adept_models::TextGenerator;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{InterviewConfig, MAX_TOTAL_QUESTIONS};
use crate::corpus::QuestionCorpus;
use crate::evaluation::{AnswerEvaluator, Evaluation};
use crate::generation::BoundedGenerator;
use crate::profile::{InMemoryProfileStore, ProfileInsights, ProfileStore, ProfileSummary};
use crate::selector::AdaptiveSelector;
use crate::store::SessionStore;
use crate::summary::SummaryWriter;
use crate::types::{Answer, Question, Session, SessionConfig, SessionId};
use crate::{InterviewError, Result};

/// Result of [`InterviewMachine::record_and_adapt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adaptation {
    /// Corpus entry chosen to follow the recorded answer.
    pub next_question: Question,
    pub rationale: String,
    pub profile_summary: ProfileSummary,
}

/// Drives interviews from start to final report.
///
/// The machine holds no per-session state of its own apart from the
/// performance profiles in its [`ProfileStore`]. Every operation takes the
/// caller's [`InterviewState`] and returns a new one.
pub struct InterviewMachine {
    config: InterviewConfig,
    generator: BoundedGenerator,
    evaluator: AnswerEvaluator,
    selector: AdaptiveSelector,
    summary: SummaryWriter,
    profiles: Arc<dyn ProfileStore>,
    store: Option<Arc<dyn SessionStore>>,
}

/// Builder for [`InterviewMachine`].
pub struct InterviewMachineBuilder {
    corpus: Arc<dyn QuestionCorpus>,
    generator: Option<Arc<dyn TextGenerator>>,
    profiles: Option<Arc<dyn ProfileStore>>,
    store: Option<Arc<dyn SessionStore>>,
    config: InterviewConfig,
}

impl InterviewMachineBuilder {
    /// Text generation service. Without one, every generated text falls
    /// back to templates and heuristics.
    #[must_use]
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn profiles(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Persist evaluations, profiles and finished sessions here.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn config(mut self, config: InterviewConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<InterviewMachine> {
        self.config.validate()?;

        let rubric = match self.corpus.rubric() {
            Some(rubric) => {
                rubric.validate()?;
                debug!("Using rubric from question corpus");
                rubric
            }
            None => self.config.rubric.clone(),
        };

        let generator = BoundedGenerator::new(self.generator, self.config.generation_timeout());

        Ok(InterviewMachine {
            evaluator: AnswerEvaluator::new(generator.clone(), rubric),
            selector: AdaptiveSelector::new(generator.clone(), self.corpus),
            summary: SummaryWriter::new(generator.clone()),
            generator,
            profiles: self
                .profiles
                .unwrap_or_else(|| Arc::new(InMemoryProfileStore::new())),
            store: self.store,
            config: self.config,
        })
    }
}

impl InterviewMachine {
    pub fn builder(corpus: Arc<dyn QuestionCorpus>) -> InterviewMachineBuilder {
        InterviewMachineBuilder {
            corpus,
            generator: None,
            profiles: None,
            store: None,
            config: InterviewConfig::default(),
        }
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    /// Whether a text generator is configured. False means every
    /// evaluation, rationale and report comes from fallbacks.
    pub fn is_available(&self) -> bool {
        self.generator.is_available()
    }

    pub fn evaluator(&self) -> &AnswerEvaluator {
        &self.evaluator
    }

    pub fn selector(&self) -> &AdaptiveSelector {
        &self.selector
    }

    pub fn session_store(&self) -> Option<&Arc<dyn SessionStore>> {
        self.store.as_ref()
    }

    /// Create a new interview in `idle`.
    pub fn start(&self, config: SessionConfig) -> Result<InterviewState> {
        if self.config.require_generator && !self.generator.is_available() {
            return Err(InterviewError::ServiceUnavailable);
        }

        let total_questions = config
            .total_questions
            .unwrap_or(self.config.default_total_questions);
        if total_questions == 0 || total_questions > MAX_TOTAL_QUESTIONS {
            return Err(InterviewError::Validation(format!(
                "total_questions must be between 1 and {MAX_TOTAL_QUESTIONS}, got {total_questions}"
            )));
        }

        let topic = config
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.config.default_topic.clone());

        let now = Utc::now();
        let session = Session {
            id: config.session_id.unwrap_or_default(),
            candidate_name: config.candidate_name.filter(|n| !n.trim().is_empty()),
            topic,
            difficulty: config
                .difficulty
                .unwrap_or(self.config.default_difficulty),
            total_questions,
            time_limit_minutes: config.time_limit_minutes,
            created_at: now,
            updated_at: now,
        };

        info!(
            session_id = %session.id,
            topic = %session.topic,
            difficulty = %session.difficulty,
            total_questions,
            "Interview session created"
        );
        Ok(InterviewState::new(session))
    }

    /// Merge `action` into `state`, then run the handler for the resulting
    /// state.
    ///
    /// A rejected action returns `Err` and leaves nothing changed. Handler
    /// failures do not: they produce a state in `error` that keeps all
    /// recorded questions, answers and evaluations.
    pub async fn step(
        &self,
        state: &InterviewState,
        action: Option<StepAction>,
    ) -> Result<InterviewState> {
        let mut next = state.clone();
        if let Some(action) = action {
            next.apply(action)?;
        }
        Ok(self.dispatch(next).await)
    }

    /// Record an answer. Does not change the state tag.
    pub fn add_answer(
        &self,
        state: &InterviewState,
        question_id: &str,
        text: &str,
    ) -> Result<InterviewState> {
        if state.is_completed() {
            return Err(InterviewError::validation("interview is already completed"));
        }
        if text.trim().is_empty() {
            return Err(InterviewError::validation("answer text is empty"));
        }
        if state.question(question_id).is_none() {
            return Err(InterviewError::NotFound(format!("question {question_id}")));
        }

        let mut next = state.clone();
        next.answers.push(Answer::new(question_id, text));
        next.recompute_progress();
        next.touch();
        debug!(session_id = %next.session.id, question_id, "Answer recorded");
        Ok(next)
    }

    pub async fn profile_summary(&self, session_id: &SessionId) -> Result<ProfileSummary> {
        let profile = self.profile(session_id).await?;
        let summary = profile.lock().await.summary();
        Ok(summary)
    }

    /// Profile summary with difficulty progression and recommendations.
    pub async fn session_insights(&self, session_id: &SessionId) -> Result<ProfileInsights> {
        let profile = self.profile(session_id).await?;
        let insights = profile.lock().await.insights();
        Ok(insights)
    }

    /// Fold an externally produced evaluation into the session profile and
    /// choose what to ask next.
    pub async fn record_and_adapt(
        &self,
        session_id: &SessionId,
        question: &Question,
        answer: &Answer,
        evaluation: &Evaluation,
    ) -> Result<Adaptation> {
        if answer.question_id != question.id || evaluation.question_id != question.id {
            return Err(InterviewError::validation(
                "answer and evaluation must refer to the given question",
            ));
        }

        let shared = self
            .profiles
            .get_or_create(session_id, question.difficulty)
            .await;
        let (summary, plan) = {
            let mut profile = shared.lock().await;
            profile.record(evaluation);
            (profile.summary(), profile.plan())
        };

        let exclude = [question.corpus_id().to_string()];
        let selection = self
            .selector
            .select(&summary, &plan, Some(evaluation), &exclude)
            .await?;

        let profile_summary = {
            let mut profile = shared.lock().await;
            profile.commit_difficulty(selection.question.difficulty);
            profile.summary()
        };

        Ok(Adaptation {
            next_question: selection.question,
            rationale: selection.rationale,
            profile_summary,
        })
    }

    /// Drop a session's live profile.
    pub async fn clear_profile(&self, session_id: &SessionId) -> Result<()> {
        if self.profiles.delete(session_id).await {
            info!(session_id = %session_id, "Performance profile cleared");
            Ok(())
        } else {
            Err(InterviewError::NotFound(format!("profile for session {session_id}")))
        }
    }

    /// Sessions with a live profile, sorted by ID.
    pub async fn active_sessions(&self) -> Vec<SessionId> {
        let mut ids = self.profiles.list().await;
        ids.sort();
        ids
    }

    /// Write the live profile to the session store.
    pub async fn save_profile(&self, session_id: &SessionId) -> Result<()> {
        let store = self.require_store()?;
        let profile = self.profile(session_id).await?.lock().await.clone();
        store.save_profile(&profile).await
    }

    /// Replace the live profile with the stored one.
    pub async fn load_profile(&self, session_id: &SessionId) -> Result<ProfileSummary> {
        let store = self.require_store()?;
        let profile = store.load_profile(session_id).await?;
        let summary = profile.summary();
        self.profiles.insert(profile).await;
        Ok(summary)
    }

    async fn profile(&self, session_id: &SessionId) -> Result<crate::profile::SharedProfile> {
        self.profiles
            .get(session_id)
            .await
            .ok_or_else(|| InterviewError::NotFound(format!("profile for session {session_id}")))
    }

    fn require_store(&self) -> Result<&Arc<dyn SessionStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| InterviewError::Storage("no session store configured".to_string()))
    }
}
