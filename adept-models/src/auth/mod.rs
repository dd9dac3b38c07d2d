//! Credential management for provider API keys.
//!
//! Keys live in the system keyring, with an environment variable fallback
//! for CI and container deployments where no keyring daemon is running.
//!
//! # Example
//!
//! ```ignore
//! use adept_models::auth::CredentialStore;
//!
//! let store = CredentialStore::new("adept").with_env_fallback();
//! store.set("openai", "sk-...")?;
//! let key = store.get("openai")?;
//! ```

use std::env;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{Error, Result};

/// A provider API key that never shows up in logs.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Only call this when building the outgoing request.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Environment variable names for each supported provider.
const ENV_VARS: &[(&str, &str)] = &[("openai", "OPENAI_API_KEY"), ("groq", "GROQ_API_KEY")];

/// Environment variable consulted for `provider` when env fallback is on.
pub fn env_var_for_provider(provider: &str) -> Option<&'static str> {
    ENV_VARS
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, v)| *v)
}

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Stored in system keyring.
    Keyring,
    /// From environment variable.
    Environment,
}

/// Credential storage with system keyring and environment fallback.
///
/// Lookups check the keyring first, then the provider's environment
/// variable when fallback is enabled. Writes always go to the keyring.
pub struct CredentialStore {
    service_name: String,
    env_fallback: bool,
}

impl CredentialStore {
    /// Create a new credential store for the given keyring service.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env_fallback: false,
        }
    }

    /// Enable environment variable fallback.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Get an API key for a provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if no credentials are found.
    pub fn get(&self, provider: &str) -> Result<ApiKey> {
        self.resolve(provider)
            .map(|(key, _)| key)
            .ok_or_else(|| Error::CredentialsNotFound(provider.to_string()))
    }

    /// Get an API key along with where it was found.
    pub fn resolve(&self, provider: &str) -> Option<(ApiKey, CredentialSource)> {
        if let Some(key) = self.get_from_keyring(provider) {
            debug!(provider, "retrieved API key from keyring");
            return Some((key, CredentialSource::Keyring));
        }

        if self.env_fallback
            && let Some(key) = self.get_from_env(provider)
        {
            debug!(provider, "retrieved API key from environment");
            return Some((key, CredentialSource::Environment));
        }

        None
    }

    /// Store an API key for a provider in the system keyring.
    pub fn set(&self, provider: &str, key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::Keyring("refusing to store an empty key".to_string()));
        }
        let entry = self.keyring_entry(provider)?;
        entry
            .set_password(key)
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!(provider, "stored API key in keyring");
        Ok(())
    }

    /// Delete an API key from the system keyring.
    pub fn delete(&self, provider: &str) -> Result<()> {
        let entry = self.keyring_entry(provider)?;
        entry.delete_credential().map_err(|e| match e {
            keyring::Error::NoEntry => Error::CredentialsNotFound(provider.to_string()),
            _ => Error::Keyring(e.to_string()),
        })?;
        debug!(provider, "deleted API key from keyring");
        Ok(())
    }

    /// Get the source of a credential, if one exists.
    pub fn credential_source(&self, provider: &str) -> Option<CredentialSource> {
        self.resolve(provider).map(|(_, source)| source)
    }

    fn keyring_entry(&self, provider: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service_name, provider).map_err(|e| Error::Keyring(e.to_string()))
    }

    fn get_from_keyring(&self, provider: &str) -> Option<ApiKey> {
        let entry = self.keyring_entry(provider).ok()?;
        entry.get_password().ok().map(ApiKey::new)
    }

    fn get_from_env(&self, provider: &str) -> Option<ApiKey> {
        let env_var = env_var_for_provider(provider)?;
        env::var(env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(ApiKey::new)
    }
}
