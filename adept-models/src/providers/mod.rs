//! Chat provider trait and implementations.
//!
//! The [`ModelProvider`] trait is the narrow interface every chat backend
//! implements. Interview code never talks to a provider directly; it goes
//! through [`TextGenerator`](crate::TextGenerator), which wraps a provider
//! with model settings.

mod openai;
mod types;

use async_trait::async_trait;

pub use openai::OpenAiProvider;
pub use types::*;

use crate::Result;

/// Trait for chat-completion providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Perform a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl ModelProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ChatResponse {
                content: format!("Echo: {last}"),
                stop_reason: StopReason::EndTurn,
                usage: Usage::new(10, 5),
            })
        }
    }

    #[tokio::test]
    async fn provider_chat_returns_response() {
        let provider = EchoProvider;
        let request = ChatRequest::new("test-model", vec![Message::user("Hello")]);
        let response = provider.chat(request).await.unwrap();

        assert_eq!(response.content, "Echo: Hello");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn provider_is_object_safe() {
        let provider: Box<dyn ModelProvider> = Box::new(EchoProvider);
        assert_eq!(provider.name(), "echo");
    }
}
