//! Session → profile map.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::PerformanceProfile;
use crate::types::{Difficulty, SessionId};

/// A profile handle. Holding the lock gives exclusive access to one
/// session's profile without blocking other sessions.
pub type SharedProfile = Arc<Mutex<PerformanceProfile>>;

/// Storage for the live performance profile of each session.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get the profile for `session_id`, creating one at `starting_difficulty`
    /// if none exists.
    async fn get_or_create(
        &self,
        session_id: &SessionId,
        starting_difficulty: Difficulty,
    ) -> SharedProfile;

    async fn get(&self, session_id: &SessionId) -> Option<SharedProfile>;

    /// Insert or replace a profile, e.g. one restored from disk.
    async fn insert(&self, profile: PerformanceProfile) -> SharedProfile;

    /// Returns true if a profile was removed.
    async fn delete(&self, session_id: &SessionId) -> bool;

    /// Sessions with a live profile, in no particular order.
    async fn list(&self) -> Vec<SessionId>;
}

/// In-memory [`ProfileStore`].
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<SessionId, SharedProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_or_create(
        &self,
        session_id: &SessionId,
        starting_difficulty: Difficulty,
    ) -> SharedProfile {
        if let Some(existing) = self.profiles.read().await.get(session_id) {
            return existing.clone();
        }

        let mut profiles = self.profiles.write().await;
        profiles
            .entry(session_id.clone())
            .or_insert_with(|| {
                debug!(session_id = %session_id, %starting_difficulty, "Creating performance profile");
                Arc::new(Mutex::new(PerformanceProfile::new(
                    session_id.clone(),
                    starting_difficulty,
                )))
            })
            .clone()
    }

    async fn get(&self, session_id: &SessionId) -> Option<SharedProfile> {
        self.profiles.read().await.get(session_id).cloned()
    }

    async fn insert(&self, profile: PerformanceProfile) -> SharedProfile {
        let session_id = profile.session_id.clone();
        let shared = Arc::new(Mutex::new(profile));
        self.profiles.write().await.insert(session_id, shared.clone());
        shared
    }

    async fn delete(&self, session_id: &SessionId) -> bool {
        self.profiles.write().await.remove(session_id).is_some()
    }

    async fn list(&self) -> Vec<SessionId> {
        self.profiles.read().await.keys().cloned().collect()
    }
}
