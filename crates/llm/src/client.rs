use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use quill_common::{AgentMessage, Result};
use serde::{Deserialize, Serialize};

/// Stream of partial-content deltas from a streamed completion.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<AgentMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Issue one request and wait for the full completion.
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Issue one request and return the stream of content deltas.
    async fn stream(&self, request: LlmRequest) -> Result<CompletionStream>;

    fn provider_name(&self) -> &str;
}

#[async_trait]
impl LlmClient for Box<dyn LlmClient> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        (**self).complete(request).await
    }
    async fn stream(&self, request: LlmRequest) -> Result<CompletionStream> {
        (**self).stream(request).await
    }
    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }
}
