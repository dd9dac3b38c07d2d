//! Persistence for finished and in-flight interviews.
//!
//! The state machine saves through a [`SessionStore`] when one is
//! configured; callers can also use a store directly to list, reload or
//! delete sessions.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::InMemorySessionStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::evaluation::Evaluation;
use crate::machine::{InterviewState, Progress, StateTag};
use crate::profile::PerformanceProfile;
use crate::types::SessionId;

/// Listing entry for a stored session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    pub state: StateTag,
    pub progress: Progress,
    pub updated_at: DateTime<Utc>,
}

impl From<&InterviewState> for SessionSummary {
    fn from(state: &InterviewState) -> Self {
        Self {
            session_id: state.session.id.clone(),
            topic: state.session.topic.clone(),
            candidate_name: state.session.candidate_name.clone(),
            state: state.current_state,
            progress: state.progress.clone(),
            updated_at: state.session.updated_at,
        }
    }
}

/// Storage for interview states, evaluations and profiles.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace the stored state for its session.
    async fn save_session(&self, state: &InterviewState) -> Result<()>;

    /// Fails with `NotFound` if nothing is stored for `session_id`.
    async fn load_session(&self, session_id: &SessionId) -> Result<InterviewState>;

    /// All stored sessions, most recently updated first.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Remove a session with its evaluations and profile. Returns true if
    /// a session was stored.
    async fn delete_session(&self, session_id: &SessionId) -> Result<bool>;

    async fn save_evaluation(&self, session_id: &SessionId, evaluation: &Evaluation) -> Result<()>;

    /// Evaluations for a session, oldest first.
    async fn load_evaluations(&self, session_id: &SessionId) -> Result<Vec<Evaluation>>;

    async fn save_profile(&self, profile: &PerformanceProfile) -> Result<()>;

    /// Fails with `NotFound` if no profile is stored for `session_id`.
    async fn load_profile(&self, session_id: &SessionId) -> Result<PerformanceProfile>;
}

fn newest_first(summaries: &mut [SessionSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
