//! JSON-file session store.
//!
//! Layout inside the store directory:
//!
//! ```text
//! session_<id>.json
//! evaluation_<id>_<question id>.json
//! profile_<id>.json
//! ```
//!
//! Files are written to a temporary name and renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{SessionStore, SessionSummary, newest_first};
use crate::evaluation::Evaluation;
use crate::machine::InterviewState;
use crate::profile::PerformanceProfile;
use crate::types::SessionId;
use crate::{InterviewError, Result};

const SESSION_PREFIX: &str = "session_";
const EVALUATION_PREFIX: &str = "evaluation_";

#[derive(Serialize, Deserialize)]
struct StoredEvaluation {
    session_id: SessionId,
    #[serde(flatten)]
    evaluation: Evaluation,
}

/// [`SessionStore`] writing one JSON file per record.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{SESSION_PREFIX}{}.json", file_key(id.as_str())))
    }

    fn profile_path(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("profile_{}.json", file_key(id.as_str())))
    }

    fn evaluation_path(&self, id: &SessionId, question_id: &str) -> PathBuf {
        self.dir.join(format!(
            "{EVALUATION_PREFIX}{}_{}.json",
            file_key(id.as_str()),
            file_key(question_id)
        ))
    }

    fn evaluation_prefix(id: &SessionId) -> String {
        format!("{EVALUATION_PREFIX}{}_", file_key(id.as_str()))
    }

    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), "Wrote record");
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path, what: &str) -> Result<T> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(InterviewError::NotFound(what.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Files in the store directory whose names start with `prefix`.
    /// A missing directory is an empty store.
    async fn files_with_prefix(&self, prefix: &str) -> Result<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(prefix) && name.ends_with(".json") {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }

    async fn remove_if_present(path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]`, so distinct IDs
/// never share a file name.
fn file_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            key.push(char::from(byte));
        } else {
            key.push_str(&format!("%{byte:02X}"));
        }
    }
    key
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save_session(&self, state: &InterviewState) -> Result<()> {
        self.write_json(&self.session_path(&state.session.id), state).await
    }

    async fn load_session(&self, session_id: &SessionId) -> Result<InterviewState> {
        let what = format!("session {session_id}");
        let state: InterviewState = self.read_json(&self.session_path(session_id), &what).await?;
        if state.session.id != *session_id {
            return Err(InterviewError::NotFound(what));
        }
        Ok(state)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for path in self.files_with_prefix(SESSION_PREFIX).await? {
            match self.read_json::<InterviewState>(&path, "session").await {
                Ok(state) => summaries.push(SessionSummary::from(&state)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable session file"),
            }
        }
        newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<bool> {
        for path in self.files_with_prefix(&Self::evaluation_prefix(session_id)).await? {
            if let Ok(stored) = self.read_json::<StoredEvaluation>(&path, "evaluation").await
                && stored.session_id == *session_id
            {
                Self::remove_if_present(&path).await?;
            }
        }
        Self::remove_if_present(&self.profile_path(session_id)).await?;
        Self::remove_if_present(&self.session_path(session_id)).await
    }

    async fn save_evaluation(&self, session_id: &SessionId, evaluation: &Evaluation) -> Result<()> {
        let stored = StoredEvaluation {
            session_id: session_id.clone(),
            evaluation: evaluation.clone(),
        };
        self.write_json(&self.evaluation_path(session_id, &evaluation.question_id), &stored)
            .await
    }

    async fn load_evaluations(&self, session_id: &SessionId) -> Result<Vec<Evaluation>> {
        let mut evaluations = Vec::new();
        for path in self.files_with_prefix(&Self::evaluation_prefix(session_id)).await? {
            let stored: StoredEvaluation = match self.read_json(&path, "evaluation").await {
                Ok(stored) => stored,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable evaluation file");
                    continue;
                }
            };
            // Prefixes can collide when one session id extends another.
            if stored.session_id == *session_id {
                evaluations.push(stored.evaluation);
            }
        }
        evaluations.sort_by_key(|e| e.evaluated_at);
        Ok(evaluations)
    }

    async fn save_profile(&self, profile: &PerformanceProfile) -> Result<()> {
        self.write_json(&self.profile_path(&profile.session_id), profile).await
    }

    async fn load_profile(&self, session_id: &SessionId) -> Result<PerformanceProfile> {
        let what = format!("profile for session {session_id}");
        let profile: PerformanceProfile =
            self.read_json(&self.profile_path(session_id), &what).await?;
        if profile.session_id != *session_id {
            return Err(InterviewError::NotFound(what));
        }
        Ok(profile)
    }
}
