//! Prompt-in, text-out generation.
//!
//! [`TextGenerator`] is the only capability the interview engine needs
//! from a model: turn one prompt into one piece of text. [`ChatGenerator`]
//! implements it on top of any [`ModelProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::providers::{ChatRequest, Message, ModelProvider, Usage};

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default completion budget in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Text produced for a single prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text.
    pub content: String,
    /// Token usage, when the backend reports it.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl Generation {
    /// Create a generation with no usage information.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// A capability that turns a prompt into free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs (e.g., "openai:gpt-3.5-turbo").
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<Generation>;
}

/// Settings applied to every chat request a [`ChatGenerator`] sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Model identifier sent to the provider.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum completion tokens.
    pub max_tokens: u32,
    /// Optional system message prepended to every prompt.
    pub system_prompt: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }
}

/// [`TextGenerator`] backed by a chat provider.
pub struct ChatGenerator {
    provider: Arc<dyn ModelProvider>,
    config: GeneratorConfig,
    name: String,
}

impl ChatGenerator {
    /// Wrap a provider with the given settings.
    pub fn new(provider: Arc<dyn ModelProvider>, config: GeneratorConfig) -> Self {
        let name = format!("{}:{}", provider.name(), config.model);
        Self {
            provider,
            config,
            name,
        }
    }

    /// The settings used for each request.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(prompt));

        ChatRequest::new(self.config.model.clone(), messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
    }
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let response = self.provider.chat(self.build_request(prompt)).await?;
        Ok(Generation {
            content: response.content,
            usage: Some(response.usage),
        })
    }
}
