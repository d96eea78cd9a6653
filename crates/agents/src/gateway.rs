//! Uniform completion contract shared by every agent.
//!
//! Request shaping separates system-role messages from the conversation and
//! prefers an explicit system message over the config's instruction
//! template. The whole-response path folds failures into an
//! [`AgentResponse`]; the streaming path propagates them to the caller.

use std::sync::Arc;

use quill_common::{AgentMessage, MessageRole, QuillError, Result, parse_json_object};
use quill_llm::{CompletionStream, LlmClient, LlmRequest, LlmResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AgentConfig, AgentKey};
use crate::registry::AgentRegistry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_key: Option<AgentKey>,
    #[serde(default)]
    pub used_fallback: bool,
}

/// Result of one agent call. Immutable once returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured payload recovered from `content`, when the agent's
    /// contract is structured and extraction succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

impl AgentResponse {
    pub fn completed(key: AgentKey, response: LlmResponse) -> Self {
        Self {
            success: true,
            content: Some(response.content),
            error: None,
            data: None,
            metadata: ResponseMetadata {
                tokens_used: response.usage.map(|u| u.total()),
                model: Some(response.model),
                agent_key: Some(key),
                used_fallback: false,
            },
        }
    }

    /// Successful result produced without a completion call.
    pub fn succeeded(key: AgentKey, content: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            data,
            metadata: ResponseMetadata {
                agent_key: Some(key),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn failure(key: AgentKey, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            metadata: ResponseMetadata {
                agent_key: Some(key),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn disabled(config: &AgentConfig) -> Self {
        Self::failure(config.agent_key, disabled_message(config))
    }

    /// Attach the first balanced JSON object found in `content` as `data`.
    /// Leaves the response untouched when none parses.
    pub fn with_structured_data(mut self) -> Self {
        if self.success {
            if let Some(content) = self.content.as_deref() {
                match parse_json_object::<Value>(content) {
                    Some(value) => self.data = Some(value),
                    None => debug!(
                        agent = ?self.metadata.agent_key,
                        "No structured payload in response, returning raw text"
                    ),
                }
            }
        }
        self
    }

    /// Deserialize `data` into a typed payload.
    pub fn parse_data<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

pub fn disabled_message(config: &AgentConfig) -> String {
    format!("{} is currently disabled", config.display_name)
}

/// Issues completion calls for an agent config.
pub struct CompletionGateway {
    client: Arc<dyn LlmClient>,
}

impl CompletionGateway {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    pub fn shape_request(config: &AgentConfig, messages: Vec<AgentMessage>) -> LlmRequest {
        let (system, conversation): (Vec<_>, Vec<_>) = messages
            .into_iter()
            .partition(|msg| msg.role == MessageRole::System);

        let explicit_system = system
            .iter()
            .map(AgentMessage::text)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>();

        let system_prompt = if !explicit_system.is_empty() {
            Some(explicit_system.join("\n\n"))
        } else if !config.system_prompt.trim().is_empty() {
            Some(config.system_prompt.clone())
        } else {
            None
        };

        LlmRequest {
            model: config.model.clone(),
            system_prompt,
            messages: conversation,
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
        }
    }

    /// Whole-response call. Errors are folded into `success: false`.
    pub async fn run(&self, config: &AgentConfig, messages: Vec<AgentMessage>) -> AgentResponse {
        let request = Self::shape_request(config, messages);
        debug!(
            agent = %config.agent_key,
            provider = self.client.provider_name(),
            model = %request.model,
            "Running completion"
        );

        match self.client.complete(request).await {
            Ok(response) => AgentResponse::completed(config.agent_key, response),
            Err(e) => {
                warn!(agent = %config.agent_key, error = %e, "Completion failed");
                AgentResponse::failure(config.agent_key, e.to_string())
            }
        }
    }

    /// Streamed call. Setup failures propagate.
    pub async fn stream(
        &self,
        config: &AgentConfig,
        messages: Vec<AgentMessage>,
    ) -> Result<CompletionStream> {
        let request = Self::shape_request(config, messages);
        debug!(agent = %config.agent_key, model = %request.model, "Starting completion stream");
        self.client.stream(request).await
    }
}

/// Registry plus gateway: what every specialized agent is built on.
#[derive(Clone)]
pub struct AgentRuntime {
    registry: Arc<AgentRegistry>,
    gateway: Arc<CompletionGateway>,
}

impl AgentRuntime {
    pub fn new(registry: Arc<AgentRegistry>, gateway: Arc<CompletionGateway>) -> Self {
        Self { registry, gateway }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn gateway(&self) -> &CompletionGateway {
        &self.gateway
    }

    pub async fn config(&self, key: AgentKey) -> AgentConfig {
        self.registry.load_agent_config(key).await
    }

    /// Load config fresh, honor the enabled flag, run one user message.
    pub async fn invoke(
        &self,
        key: AgentKey,
        message: AgentMessage,
        structured: bool,
    ) -> AgentResponse {
        let config = self.config(key).await;
        if !config.enabled {
            debug!(agent = %key, "Agent disabled, skipping completion");
            return AgentResponse::disabled(&config);
        }
        debug!(agent = %key, guardrails = ?config.guardrails, "Invoking agent");

        let response = self.gateway.run(&config, vec![message]).await;
        if structured {
            response.with_structured_data()
        } else {
            response
        }
    }

    pub async fn invoke_stream(
        &self,
        key: AgentKey,
        message: AgentMessage,
    ) -> Result<CompletionStream> {
        let config = self.config(key).await;
        if !config.enabled {
            return Err(QuillError::Agent(disabled_message(&config)));
        }
        self.gateway.stream(&config, vec![message]).await
    }
}
