use async_trait::async_trait;
use quill_common::{AgentMessage, ContentPart, MessageContent, MessageRole, QuillError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{CompletionStream, LlmClient, LlmRequest, LlmResponse, TokenUsage};
use crate::sse;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    model: String,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn role_to_string(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    fn encode_content(content: &MessageContent) -> Value {
        match content {
            MessageContent::Text(text) => json!(text),
            MessageContent::Parts(parts) => Value::Array(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => json!({ "type": "text", "text": text }),
                        ContentPart::Image { media_type, data } => json!({
                            "type": "image_url",
                            "image_url": { "url": format!("data:{media_type};base64,{data}") }
                        }),
                    })
                    .collect(),
            ),
        }
    }

    fn encode_message(message: &AgentMessage) -> Value {
        json!({
            "role": Self::role_to_string(message.role),
            "content": Self::encode_content(&message.content),
        })
    }

    fn build_messages(request: &LlmRequest) -> Vec<Value> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref system) = request.system_prompt {
            messages.push(Self::encode_message(&AgentMessage::system(system.clone())));
        }
        messages.extend(request.messages.iter().map(Self::encode_message));
        messages
    }

    fn build_request_body(request: &LlmRequest, stream: bool) -> OpenAiRequest {
        OpenAiRequest {
            model: request.model.clone(),
            messages: Self::build_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                QuillError::MissingCredential(
                    "OpenAI API key not configured. Set OPENAI_API_KEY or api_key in config."
                        .into(),
                )
            })
    }

    async fn send(&self, request: &LlmRequest, stream: bool) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = Self::build_request_body(request, stream);

        debug!(
            model = %request.model,
            messages = body.messages.len(),
            stream,
            "Sending OpenAI request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| QuillError::Provider(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(QuillError::Provider(format!(
                "OpenAI API error {status}: {body_text}"
            )));
        }

        Ok(response)
    }
}

/// Pull the content delta out of one streamed chunk.
fn stream_delta(data: &str) -> Option<String> {
    let chunk: Value = serde_json::from_str(data).ok()?;
    chunk["choices"][0]["delta"]["content"]
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let response = self.send(&request, false).await?;

        let oai_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| QuillError::Provider(format!("Failed to parse OpenAI response: {e}")))?;

        let choice = oai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| QuillError::Provider("No choices in OpenAI response".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            model: oai_response.model,
            usage: oai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    async fn stream(&self, request: LlmRequest) -> Result<CompletionStream> {
        let response = self.send(&request, true).await?;
        Ok(sse::decode_stream(response, "OpenAI", stream_delta))
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> LlmRequest {
        LlmRequest {
            model: "gpt-4o".to_string(),
            system_prompt: Some("Be precise.".to_string()),
            messages: vec![AgentMessage::user("Hello")],
            temperature: Some(0.5),
            max_tokens: Some(512),
        }
    }

    #[test]
    fn request_body_matches_openai_format() {
        let body = OpenAiClient::build_request_body(&sample_request(), false);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["max_tokens"], 512);
        assert!(json.get("stream").is_none());

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "Be precise.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Hello");
    }

    #[test]
    fn streaming_request_sets_flag() {
        let body = OpenAiClient::build_request_body(&sample_request(), true);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn image_parts_use_data_uri() {
        let request = LlmRequest {
            model: "gpt-4o".into(),
            messages: vec![AgentMessage::user_parts(vec![
                ContentPart::Text {
                    text: "Read the box score".into(),
                },
                ContentPart::Image {
                    media_type: "image/png".into(),
                    data: "iVBORw0KGgo=".into(),
                },
            ])],
            ..Default::default()
        };
        let body = OpenAiClient::build_request_body(&request, false);
        let json = serde_json::to_value(&body).unwrap();
        let content = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
    }

    #[test]
    fn stream_delta_extracts_content() {
        let data = r#"{"choices":[{"delta":{"content":"Rav"}}]}"#;
        assert_eq!(stream_delta(data).as_deref(), Some("Rav"));
        let role_only = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(stream_delta(role_only), None);
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        // Unroutable base URL: reaching the network would surface a Provider error instead.
        let client = OpenAiClient::new(Some("http://127.0.0.1:1".into()), None);
        let err = client.complete(sample_request()).await.unwrap_err();
        assert!(matches!(err, QuillError::MissingCredential(_)));

        let err = client.stream(sample_request()).await.err().unwrap();
        assert!(matches!(err, QuillError::MissingCredential(_)));
    }

    #[test]
    fn default_base_url_is_openai() {
        let client = OpenAiClient::new(None, Some("sk-test".into()));
        assert_eq!(client.base_url, "https://api.openai.com");
    }
}
