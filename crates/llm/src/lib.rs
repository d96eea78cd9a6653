pub mod anthropic;
pub mod client;
pub mod config;
pub mod openai;
pub mod sse;

pub use anthropic::AnthropicClient;
pub use client::{CompletionStream, LlmClient, LlmRequest, LlmResponse, TokenUsage};
pub use config::{ProviderConfig, build_llm_client};
pub use openai::OpenAiClient;
