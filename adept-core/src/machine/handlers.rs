//! Per-state handlers.
//!
//! Each handler receives the session ID and an owned copy of the state and
//! returns the next state. `dispatch` turns a handler error into the
//! `error` state, built from the pre-handler copy so nothing recorded is
//! lost.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::InterviewMachine;
use super::state::{InterviewState, StateTag, UiState};
use crate::{InterviewError, Result};
use crate::profile::PerformanceProfile;
use crate::types::{Question, SessionId};

impl InterviewMachine {
    pub(super) async fn dispatch(&self, state: InterviewState) -> InterviewState {
        let session_id = state.session.id.clone();
        let tag = state.current_state;
        debug!(session_id = %session_id, state = %tag, "Running state handler");

        let outcome = match tag {
            StateTag::Idle | StateTag::Intro => self.handle_intro(&session_id, state.clone()),
            StateTag::AskingQuestions => self.handle_asking(&session_id, state.clone()).await,
            StateTag::CollectingAnswers => Ok(self.handle_collecting(state.clone())),
            StateTag::Evaluating => self.handle_evaluating(&session_id, state.clone()).await,
            StateTag::Summary => self.handle_summary(&session_id, state.clone()).await,
            StateTag::Completed => Ok(state.clone()),
            StateTag::Error => Ok(self.handle_error(state.clone())),
        };

        match outcome {
            Ok(next) => next,
            Err(e) => {
                error!(session_id = %session_id, state = %tag, error = %e, "State handler failed");
                into_error_state(state, &e)
            }
        }
    }

    fn handle_intro(&self, session_id: &SessionId, mut state: InterviewState) -> Result<InterviewState> {
        state.enter(StateTag::Intro)?;

        let session = &state.session;
        let greeting = match &session.candidate_name {
            Some(name) => format!("Welcome, {name}!"),
            None => "Welcome!".to_string(),
        };
        let message = format!(
            "{greeting} This is your {topic} interview. I'll ask you {n} question{s}, \
             adjusting the difficulty as we go based on your answers. \
             Take your time and explain your reasoning. Ready when you are.",
            topic = session.topic,
            n = session.total_questions,
            s = if session.total_questions == 1 { "" } else { "s" },
        );

        state.ui = UiState {
            current_message: message,
            is_waiting_for_answer: true,
            show_summary: false,
            error_message: None,
        };
        state.touch();
        info!(session_id = %session_id, topic = %state.session.topic, "Interview introduced");
        Ok(state)
    }

    async fn handle_asking(
        &self,
        session_id: &SessionId,
        mut state: InterviewState,
    ) -> Result<InterviewState> {
        let index = state.current_question_index;
        let total = state.session.total_questions;

        if let Some(question) = state.current_question() {
            let message = question_message(index, total, question);
            state.ui = asking_ui(message);
            state.touch();
            return Ok(state);
        }

        if index > state.questions.len() {
            return Err(InterviewError::Validation(format!(
                "question index {index} skips past the {} generated questions",
                state.questions.len()
            )));
        }

        if state.questions.len() >= total as usize {
            state.enter(StateTag::Summary)?;
            state.ui = UiState {
                current_message: "All questions have been asked. Moving to summary...".to_string(),
                ..Default::default()
            };
            state.touch();
            return Ok(state);
        }

        let shared = self
            .profiles
            .get_or_create(session_id, state.session.difficulty)
            .await;
        let (summary, mut plan) = {
            let profile = shared.lock().await;
            (profile.summary(), profile.plan())
        };
        if plan.category.is_none() {
            plan.category = self.selector.corpus().category_for_topic(&state.session.topic);
        }

        let exclude: Vec<String> = state
            .questions
            .iter()
            .map(|q| q.corpus_id().to_string())
            .collect();
        if !state.evaluations.is_empty() {
            self.count_call(&mut state);
        }
        let selection = self
            .selector
            .select(&summary, &plan, state.evaluations.last(), &exclude)
            .await?;

        shared
            .lock()
            .await
            .commit_difficulty(selection.question.difficulty);

        let question = selection.question.adopt(
            format!("q_{}", state.questions.len() + 1),
            Some(selection.rationale.clone()),
        );
        debug!(
            session_id = %session_id,
            question_id = %question.id,
            source_id = %question.corpus_id(),
            "Question appended"
        );

        state.ui = asking_ui(question_message(index, total, &question));
        state.questions.push(question);
        state.metadata.adaptive_reasoning = Some(selection.rationale);
        state.metadata.adaptation_level = Some(selection.plan.adaptation_level);
        state.recompute_progress();
        state.touch();
        Ok(state)
    }

    fn handle_collecting(&self, mut state: InterviewState) -> InterviewState {
        state.ui.current_message = "Thank you for your answer. Let me evaluate it...".to_string();
        state.ui.is_waiting_for_answer = false;
        state.touch();
        state
    }

    async fn handle_evaluating(
        &self,
        session_id: &SessionId,
        mut state: InterviewState,
    ) -> Result<InterviewState> {
        let Some(question) = state.current_question().cloned() else {
            return Err(InterviewError::Validation(format!(
                "no question at index {}",
                state.current_question_index
            )));
        };

        if let Some(existing) = state.evaluation_for(&question.id) {
            debug!(session_id = %session_id, question_id = %question.id, "Already evaluated, advancing");
            let message = format!(
                "Question {} was already evaluated ({}/100).",
                state.current_question_index + 1,
                existing.score()
            );
            return advance(state, message);
        }

        let Some(answer) = state.answer_for(&question.id).cloned() else {
            return Err(InterviewError::Validation(format!(
                "no answer recorded for question {}",
                question.id
            )));
        };

        self.count_call(&mut state);
        let evaluation = self.evaluator.evaluate(&question, &answer).await?;

        let shared = self
            .profiles
            .get_or_create(session_id, state.session.difficulty)
            .await;
        let (summary, snapshot) = {
            let mut profile = shared.lock().await;
            profile.record(&evaluation);
            (profile.summary(), profile.clone())
        };

        let message = if self.config.adaptive_feedback {
            self.count_call(&mut state);
            self.selector
                .feedback(
                    &evaluation,
                    &summary,
                    state.metadata.adaptive_reasoning.as_deref(),
                )
                .await
        } else {
            format!("Your answer scored {}/100.", evaluation.score())
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.save_evaluation(session_id, &evaluation).await {
                warn!(session_id = %session_id, question_id = %question.id, error = %e, "Failed to save evaluation");
            }
            if let Err(e) = store.save_profile(&snapshot).await {
                warn!(session_id = %session_id, error = %e, "Failed to save profile");
            }
        }

        info!(
            session_id = %session_id,
            question_id = %question.id,
            score = evaluation.score(),
            source = ?evaluation.source,
            "Answer evaluated"
        );
        state.evaluations.push(evaluation);
        advance(state, message)
    }

    async fn handle_summary(
        &self,
        session_id: &SessionId,
        mut state: InterviewState,
    ) -> Result<InterviewState> {
        let insights = match self.profiles.get(session_id).await {
            Some(shared) => shared.lock().await.insights(),
            None => {
                let mut rebuilt = PerformanceProfile::new(session_id.clone(), state.session.difficulty);
                for evaluation in &state.evaluations {
                    rebuilt.record(evaluation);
                }
                rebuilt.insights()
            }
        };

        self.count_call(&mut state);
        let report = self
            .summary
            .write(&state.session, &state.evaluations, &insights)
            .await;

        state.enter(StateTag::Completed)?;
        let now = Utc::now();
        state.metadata.ended_at = Some(now);
        state.metadata.total_duration_secs = Some((now - state.metadata.started_at).num_seconds());
        state.ui = UiState {
            current_message: report.clone(),
            is_waiting_for_answer: false,
            show_summary: true,
            error_message: None,
        };
        state.final_report = Some(report);
        state.recompute_progress();
        state.touch();

        if let Some(store) = &self.store
            && let Err(e) = store.save_session(&state).await
        {
            warn!(session_id = %session_id, error = %e, "Failed to save completed session");
        }

        info!(
            session_id = %session_id,
            evaluated = state.progress.questions_evaluated,
            average_score = state.progress.average_score,
            "Interview completed"
        );
        Ok(state)
    }

    fn handle_error(&self, mut state: InterviewState) -> InterviewState {
        let detail = state
            .ui
            .error_message
            .clone()
            .unwrap_or_else(|| "unknown error".to_string());
        state.ui.current_message =
            format!("An error occurred: {detail}. Restart the interview to continue.");
        state.ui.is_waiting_for_answer = false;
        state
    }

    /// Count one prompt sent to the generator, if there is one.
    fn count_call(&self, state: &mut InterviewState) {
        if self.generator.is_available() {
            state.metadata.llm_calls += 1;
        }
    }
}

fn question_message(index: usize, total: u32, question: &Question) -> String {
    format!(
        "Question {} of {}:\n\n{}\n\nPlease provide your answer:",
        index + 1,
        total,
        question.prompt
    )
}

fn asking_ui(message: String) -> UiState {
    UiState {
        current_message: message,
        is_waiting_for_answer: true,
        show_summary: false,
        error_message: None,
    }
}

/// Move past the current question, to the next one or to the summary.
fn advance(mut state: InterviewState, message: String) -> Result<InterviewState> {
    let next = state.current_question_index + 1;
    state.current_question_index = next;

    if state.is_past_last_question(next) {
        state.enter(StateTag::Summary)?;
        state.ui = UiState {
            current_message: "All questions completed! Generating your summary...".to_string(),
            ..Default::default()
        };
    } else {
        state.enter(StateTag::AskingQuestions)?;
        state.ui = UiState {
            current_message: message,
            ..Default::default()
        };
    }

    state.recompute_progress();
    state.touch();
    Ok(state)
}

fn into_error_state(mut state: InterviewState, e: &InterviewError) -> InterviewState {
    let detail = e.to_string();
    state.current_state = StateTag::Error;
    state.ui = UiState {
        current_message: format!("An error occurred: {detail}. Please try again."),
        is_waiting_for_answer: false,
        show_summary: false,
        error_message: Some(detail),
    };
    state.recompute_progress();
    state.touch();
    state
}
