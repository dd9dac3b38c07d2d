//! OpenAI-compatible chat-completion provider.
//!
//! Talks to `POST {base_url}/chat/completions`. Any server exposing the
//! same API (a local Ollama or vLLM instance, for example) works by
//! pointing `base_url` at it.
//!
//! # Example
//!
//! ```ignore
//! use adept_models::providers::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new(api_key);
//! let local = OpenAiProvider::with_base_url("http://localhost:11434/v1", None);
//! ```

use serde::{Deserialize, Serialize};

use super::{ChatRequest, ChatResponse, ModelProvider, StopReason, Usage};
use crate::auth::ApiKey;
use crate::{Error, Result};

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct WireChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireChatResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl From<&ChatRequest> for WireChatRequest {
    fn from(request: &ChatRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

impl TryFrom<WireChatResponse> for ChatResponse {
    type Error = Error;

    fn try_from(response: WireChatResponse) -> Result<Self> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(Error::EmptyResponse)?;
        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(Error::EmptyResponse);
        }

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("stop") | None => StopReason::EndTurn,
            Some("length") => StopReason::MaxTokens,
            Some(_) => StopReason::Other,
        };
        let usage = response
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            stop_reason,
            usage,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAiProvider
// ────────────────────────────────────────────────────────────────────────────

/// OpenAI-compatible chat provider.
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<ApiKey>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a provider for the public OpenAI API.
    pub fn new(api_key: ApiKey) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, Some(api_key))
    }

    /// Create a provider for a custom base URL.
    ///
    /// The key is optional because local servers usually do not check it.
    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<ApiKey>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Get the base URL for this provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = WireChatRequest::from(&request);

        let mut builder = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "chat completion returned {}: {}",
                status, body
            )));
        }

        let wire: WireChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        tracing::debug!(model = %request.model, "chat completion received");
        wire.try_into()
    }
}
