//! Tone adaptation agent.

use quill_common::AgentMessage;
use serde::{Deserialize, Serialize};

use crate::config::AgentKey;
use crate::gateway::{AgentResponse, AgentRuntime};
use crate::prompts::PromptBuilder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToneRequest {
    pub target_tone: String,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub preserve_keywords: Vec<String>,
    pub content: String,
}

pub struct ToneAgent {
    runtime: AgentRuntime,
}

impl ToneAgent {
    pub const KEY: AgentKey = AgentKey::ToneAdapter;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_prompt(request: &ToneRequest) -> String {
        PromptBuilder::new()
            .field("Target tone", &request.target_tone)
            .optional("Audience", request.audience.as_ref())
            .list("Keywords to preserve", &request.preserve_keywords)
            .block("Content", &request.content)
            .text("Rewrite the content in the target tone.")
            .build()
    }

    pub async fn adapt(&self, request: &ToneRequest) -> AgentResponse {
        self.runtime
            .invoke(Self::KEY, AgentMessage::user(Self::build_prompt(request)), false)
            .await
    }
}
