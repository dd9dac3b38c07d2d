//! Time-bounded access to the optional text generation service.

use std::sync::Arc;
use std::time::Duration;

use adept_models::{Error as ModelError, TextGenerator};
use tracing::{debug, warn};

/// Wraps an optional [`TextGenerator`] with a per-call timeout.
///
/// Every caller treats a failed generation the same way: log it and fall
/// back to deterministic text. `generate` therefore returns the model error
/// for logging but callers never propagate it.
#[derive(Clone)]
pub struct BoundedGenerator {
    inner: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl BoundedGenerator {
    pub fn new(inner: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// No generator configured; every call fails immediately.
    pub fn disabled() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Generate text for `prompt` within the configured timeout.
    ///
    /// Blank output counts as a failure.
    pub async fn generate(&self, purpose: &str, prompt: &str) -> Result<String, ModelError> {
        let Some(generator) = &self.inner else {
            return Err(ModelError::CredentialsNotFound(
                "no text generator configured".to_string(),
            ));
        };

        debug!(purpose, generator = generator.name(), "Requesting generation");

        match tokio::time::timeout(self.timeout, generator.generate(prompt)).await {
            Ok(Ok(generation)) if !generation.content.trim().is_empty() => Ok(generation.content),
            Ok(Ok(_)) => Err(ModelError::EmptyResponse),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ModelError::Timeout(self.timeout.as_secs())),
        }
    }

    /// Like [`generate`](Self::generate), but logs failures and returns `None`.
    pub async fn try_generate(&self, purpose: &str, prompt: &str) -> Option<String> {
        if !self.is_available() {
            return None;
        }
        match self.generate(purpose, prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(purpose, error = %e, "Generation failed, using fallback");
                None
            }
        }
    }
}

impl std::fmt::Debug for BoundedGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedGenerator")
            .field("generator", &self.inner.as_ref().map(|g| g.name().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}
