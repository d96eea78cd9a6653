use async_trait::async_trait;
use quill_common::{AgentMessage, ContentPart, MessageContent, MessageRole, QuillError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{CompletionStream, LlmClient, LlmRequest, LlmResponse, TokenUsage};
use crate::sse;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
    usage: Option<AnthropicUsage>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Client for the Anthropic messages API. Used as the secondary vision provider.
pub struct AnthropicClient {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn encode_content(content: &MessageContent) -> Vec<Value> {
        match content {
            MessageContent::Text(text) => vec![json!({ "type": "text", "text": text })],
            MessageContent::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => json!({ "type": "text", "text": text }),
                    ContentPart::Image { media_type, data } => json!({
                        "type": "image",
                        "source": { "type": "base64", "media_type": media_type, "data": data }
                    }),
                })
                .collect(),
        }
    }

    fn build_messages(request: &LlmRequest) -> Vec<Value> {
        request
            .messages
            .iter()
            // system messages go in the top-level system field
            .filter(|msg| msg.role != MessageRole::System)
            .map(|msg: &AgentMessage| {
                let role = match msg.role {
                    MessageRole::Assistant => "assistant",
                    _ => "user",
                };
                json!({ "role": role, "content": Self::encode_content(&msg.content) })
            })
            .collect()
    }

    fn build_request_body(request: &LlmRequest, stream: bool) -> AnthropicRequest {
        AnthropicRequest {
            model: request.model.clone(),
            messages: Self::build_messages(request),
            system: request.system_prompt.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            stream,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                QuillError::MissingCredential(
                    "Anthropic API key not configured. Set ANTHROPIC_API_KEY or api_key in config."
                        .into(),
                )
            })
    }

    async fn send(&self, request: &LlmRequest, stream: bool) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let body = Self::build_request_body(request, stream);

        debug!(
            model = %request.model,
            messages = body.messages.len(),
            stream,
            "Sending Anthropic request"
        );

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| QuillError::Provider(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(QuillError::Provider(format!(
                "Anthropic API error {status}: {body_text}"
            )));
        }

        Ok(response)
    }
}

fn stream_delta(data: &str) -> Option<String> {
    let event: Value = serde_json::from_str(data).ok()?;
    if event["type"] != "content_block_delta" {
        return None;
    }
    event["delta"]["text"].as_str().map(str::to_string)
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let response = self.send(&request, false).await?;

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            QuillError::Provider(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let content = anthropic_response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(LlmResponse {
            content,
            model: anthropic_response.model,
            usage: anthropic_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            }),
            finish_reason: anthropic_response.stop_reason,
        })
    }

    async fn stream(&self, request: LlmRequest) -> Result<CompletionStream> {
        let response = self.send(&request, true).await?;
        Ok(sse::decode_stream(response, "Anthropic", stream_delta))
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_anthropic_format() {
        let request = LlmRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            system_prompt: Some("Extract data.".to_string()),
            messages: vec![
                AgentMessage::user("Hello"),
                AgentMessage::assistant("Hi there!"),
                AgentMessage::user("What does the chart show?"),
            ],
            temperature: Some(0.1),
            max_tokens: Some(1024),
        };

        let body = AnthropicClient::build_request_body(&request, false);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["system"], "Extract data.");
        assert_eq!(json["max_tokens"], 1024);

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"][0]["type"], "text");
        assert_eq!(messages[0]["content"][0]["text"], "Hello");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[test]
    fn system_messages_are_not_inlined() {
        let request = LlmRequest {
            model: "claude-sonnet-4-20250514".into(),
            messages: vec![AgentMessage::system("stray"), AgentMessage::user("Hello")],
            ..Default::default()
        };
        let body = AnthropicClient::build_request_body(&request, false);
        let json = serde_json::to_value(&body).unwrap();
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(json["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn image_parts_use_base64_source() {
        let request = LlmRequest {
            model: "claude-sonnet-4-20250514".into(),
            messages: vec![AgentMessage::user_parts(vec![ContentPart::Image {
                media_type: "image/jpeg".into(),
                data: "/9j/4AAQ".into(),
            }])],
            ..Default::default()
        };
        let body = AnthropicClient::build_request_body(&request, false);
        let json = serde_json::to_value(&body).unwrap();
        let block = &json["messages"][0]["content"][0];
        assert_eq!(block["type"], "image");
        assert_eq!(block["source"]["type"], "base64");
        assert_eq!(block["source"]["media_type"], "image/jpeg");
    }

    #[test]
    fn stream_delta_reads_text_deltas_only() {
        let delta = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"AFC"}}"#;
        assert_eq!(stream_delta(delta).as_deref(), Some("AFC"));
        let start = r#"{"type":"message_start","message":{}}"#;
        assert_eq!(stream_delta(start), None);
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let client = AnthropicClient::new(Some("http://127.0.0.1:1".into()), Some(String::new()));
        let err = client.complete(LlmRequest::default()).await.unwrap_err();
        assert!(matches!(err, QuillError::MissingCredential(_)));
    }
}
