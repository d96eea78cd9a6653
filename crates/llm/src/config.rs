use std::sync::Arc;
use std::time::Duration;

use quill_common::{QuillError, Result};
use serde::{Deserialize, Serialize};

use crate::anthropic::AnthropicClient;
use crate::client::LlmClient;
use crate::openai::OpenAiClient;

/// Connection settings for one completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: String,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    120_000
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_url: None,
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Environment variable consulted when no key is set in config.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self.provider.as_str() {
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            _ => None,
        }
    }

    /// Config key first, then the provider's environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                self.api_key_env()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|key| !key.is_empty())
            })
    }
}

/// Build a client for the configured provider.
///
/// A missing key is not an error here; each call fails with
/// `MissingCredential` until one is supplied.
pub fn build_llm_client(config: &ProviderConfig) -> Result<Arc<dyn LlmClient>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| QuillError::Config(format!("Failed to build HTTP client: {e}")))?;
    let api_key = config.resolve_api_key();

    let client: Arc<dyn LlmClient> = match config.provider.as_str() {
        "openai" => Arc::new(
            OpenAiClient::new(config.api_url.clone(), api_key).with_http_client(http_client),
        ),
        "anthropic" => Arc::new(
            AnthropicClient::new(config.api_url.clone(), api_key).with_http_client(http_client),
        ),
        other => {
            return Err(QuillError::Config(format!(
                "Unknown completion provider: {other}"
            )));
        }
    };

    Ok(client)
}
