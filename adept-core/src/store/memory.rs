//! In-memory session store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{SessionStore, SessionSummary, newest_first};
use crate::evaluation::Evaluation;
use crate::machine::InterviewState;
use crate::profile::PerformanceProfile;
use crate::types::SessionId;
use crate::{InterviewError, Result};

/// [`SessionStore`] backed by maps. Contents are lost when dropped.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, InterviewState>>,
    evaluations: RwLock<HashMap<SessionId, Vec<Evaluation>>>,
    profiles: RwLock<HashMap<SessionId, PerformanceProfile>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_session(&self, state: &InterviewState) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(state.session.id.clone(), state.clone());
        Ok(())
    }

    async fn load_session(&self, session_id: &SessionId) -> Result<InterviewState> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| InterviewError::NotFound(format!("session {session_id}")))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .await
            .values()
            .map(SessionSummary::from)
            .collect();
        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<bool> {
        self.evaluations.write().await.remove(session_id);
        self.profiles.write().await.remove(session_id);
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }

    async fn save_evaluation(&self, session_id: &SessionId, evaluation: &Evaluation) -> Result<()> {
        let mut evaluations = self.evaluations.write().await;
        let list = evaluations.entry(session_id.clone()).or_default();
        match list.iter_mut().find(|e| e.question_id == evaluation.question_id) {
            Some(existing) => *existing = evaluation.clone(),
            None => list.push(evaluation.clone()),
        }
        Ok(())
    }

    async fn load_evaluations(&self, session_id: &SessionId) -> Result<Vec<Evaluation>> {
        Ok(self
            .evaluations
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_profile(&self, profile: &PerformanceProfile) -> Result<()> {
        self.profiles
            .write()
            .await
            .insert(profile.session_id.clone(), profile.clone());
        Ok(())
    }

    async fn load_profile(&self, session_id: &SessionId) -> Result<PerformanceProfile> {
        self.profiles
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| InterviewError::NotFound(format!("profile for session {session_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::testing::evaluation;
    use crate::store::testing::state;
    use crate::types::Difficulty;

    #[tokio::test]
    async fn save_then_load_session() {
        let store = InMemorySessionStore::new();
        let s = state("s1", 0);
        store.save_session(&s).await.unwrap();
        assert_eq!(store.load_session(&s.session.id).await.unwrap(), s);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = InMemorySessionStore::new();
        let err = store.load_session(&SessionId::from("nope")).await.unwrap_err();
        assert!(matches!(err, InterviewError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemorySessionStore::new();
        store.save_session(&state("old", 300)).await.unwrap();
        store.save_session(&state("new", 0)).await.unwrap();
        store.save_session(&state("mid", 60)).await.unwrap();

        let ids: Vec<String> = store
            .list_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.session_id.to_string())
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn evaluations_are_keyed_by_question() {
        let store = InMemorySessionStore::new();
        let id = SessionId::from("s1");
        store.save_evaluation(&id, &evaluation("q_1", "c", 50)).await.unwrap();
        store.save_evaluation(&id, &evaluation("q_2", "c", 70)).await.unwrap();
        store.save_evaluation(&id, &evaluation("q_1", "c", 90)).await.unwrap();

        let loaded = store.load_evaluations(&id).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].score(), 90);
    }

    #[tokio::test]
    async fn delete_removes_everything() {
        let store = InMemorySessionStore::new();
        let s = state("s1", 0);
        let id = s.session.id.clone();
        store.save_session(&s).await.unwrap();
        store.save_evaluation(&id, &evaluation("q_1", "c", 50)).await.unwrap();
        store
            .save_profile(&PerformanceProfile::new(id.clone(), Difficulty::Beginner))
            .await
            .unwrap();

        assert!(store.delete_session(&id).await.unwrap());
        assert!(!store.delete_session(&id).await.unwrap());
        assert!(store.load_evaluations(&id).await.unwrap().is_empty());
        assert!(store.load_profile(&id).await.is_err());
    }
}
