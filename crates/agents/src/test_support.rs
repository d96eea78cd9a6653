//! Scripted completion client shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use quill_common::{QuillError, Result};
use quill_llm::{CompletionStream, LlmClient, LlmRequest, LlmResponse, TokenUsage};

use crate::gateway::{AgentRuntime, CompletionGateway};
use crate::registry::AgentRegistry;

/// Replays canned completions in order and records every request.
pub struct ScriptedClient {
    name: &'static str,
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self::named("scripted", responses)
    }

    pub fn named(name: &'static str, responses: Vec<Result<String>>) -> Self {
        Self {
            name,
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_user_text(&self) -> String {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|r| r.messages.last())
            .map(|m| m.text())
            .unwrap_or_default()
    }

    fn next(&self, request: LlmRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QuillError::Provider("script exhausted".into())))
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let model = request.model.clone();
        let content = self.next(request)?;
        Ok(LlmResponse {
            content,
            model,
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            }),
            finish_reason: Some("stop".into()),
        })
    }

    async fn stream(&self, request: LlmRequest) -> Result<CompletionStream> {
        let content = self.next(request)?;
        let mut deltas = Vec::new();
        for (i, word) in content.split(' ').enumerate() {
            let delta = if i == 0 {
                word.to_string()
            } else {
                format!(" {word}")
            };
            deltas.push(Ok(delta));
        }
        Ok(Box::pin(stream::iter(deltas)))
    }

    fn provider_name(&self) -> &str {
        self.name
    }
}

pub fn runtime_with(responses: Vec<Result<String>>) -> (AgentRuntime, Arc<ScriptedClient>) {
    let client = Arc::new(ScriptedClient::new(responses));
    let runtime = AgentRuntime::new(
        Arc::new(AgentRegistry::in_memory()),
        Arc::new(CompletionGateway::new(client.clone())),
    );
    (runtime, client)
}
