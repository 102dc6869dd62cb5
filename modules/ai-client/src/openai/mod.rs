mod client;
mod sse;
mod tool;
mod types;

pub use tool::function_tool;
pub use types::{
    ChatChunk, ChatRequest, ChunkChoice, ChunkDelta, FunctionCall, FunctionDefinitionWire,
    FunctionDelta, Role, ToolCallDelta, ToolDefinitionWire, WireMessage, WireToolCall,
};

use std::pin::Pin;

use anyhow::Result;
use futures::Stream;

use client::OpenAiClient;

/// Decoded chunks of one streaming completion, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk>> + Send>>;

// =============================================================================
// OpenAi
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Build a streaming request for this agent's model and sampling settings.
    pub fn request(&self, messages: Vec<WireMessage>) -> ChatRequest {
        let mut request = ChatRequest::new(&self.model).messages(messages);
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }
        if let Some(limit) = self.max_tokens {
            request = request.token_limit(limit);
        }
        request
    }

    /// Stream a chat completion. Tools, when given, are offered with
    /// `tool_choice: "auto"`.
    pub async fn stream_chat(
        &self,
        messages: Vec<WireMessage>,
        tools: &[ToolDefinitionWire],
    ) -> Result<ChunkStream> {
        let request = tools
            .iter()
            .cloned()
            .fold(self.request(messages), ChatRequest::tool);
        self.client().chat_stream(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "gpt-4.1");
        assert_eq!(ai.model, "gpt-4.1");
        assert_eq!(ai.api_key, "sk-test");
        assert!(ai.base_url.is_none());
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "gpt-4.1").with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }

    #[test]
    fn test_request_applies_sampling_settings() {
        let ai = OpenAi::new("sk-test", "gpt-4.1")
            .with_temperature(0.8)
            .with_max_tokens(4000);
        let request = ai.request(vec![WireMessage::user("hi")]);
        assert_eq!(request.temperature, Some(0.8));
        assert_eq!(request.max_tokens, Some(4000));
        assert!(request.stream);
        assert!(request.tools.is_none());
    }
}
