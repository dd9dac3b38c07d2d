//! Error types for text generation.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating text.
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// Provider API returned an error status.
    #[error("provider API error: {0}")]
    ProviderApi(String),

    /// Request failed before a response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered but produced no text.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The call exceeded its time budget.
    #[error("generation timed out after {0} seconds")]
    Timeout(u64),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = Error::CredentialsNotFound("openai".to_string());
        assert_eq!(err.to_string(), "credentials not found for provider: openai");

        let err = Error::Timeout(30);
        assert_eq!(err.to_string(), "generation timed out after 30 seconds");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
