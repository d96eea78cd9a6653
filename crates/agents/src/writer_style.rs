//! Writer style analysis agent.

use quill_common::AgentMessage;
use serde::{Deserialize, Serialize};

use crate::config::AgentKey;
use crate::gateway::{AgentResponse, AgentRuntime};
use crate::prompts::PromptBuilder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriterStyleRequest {
    pub writer_name: String,
    pub sample_articles: Vec<String>,
}

/// Style profile recovered from the agent's structured output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterStyleProfile {
    pub tone: String,
    pub voice: String,
    pub vocabulary_level: String,
    pub sentence_structure: String,
    pub signature_phrases: Vec<String>,
    pub formatting_preferences: Vec<String>,
    pub summary: String,
}

pub struct WriterStyleAgent {
    runtime: AgentRuntime,
}

impl WriterStyleAgent {
    pub const KEY: AgentKey = AgentKey::WriterModel;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_prompt(request: &WriterStyleRequest) -> String {
        PromptBuilder::new()
            .field("Writer name", &request.writer_name)
            .numbered("Sample articles", &request.sample_articles)
            .text("Analyze the writing style across these samples.")
            .build()
    }

    pub async fn analyze(&self, request: &WriterStyleRequest) -> AgentResponse {
        self.runtime
            .invoke(Self::KEY, AgentMessage::user(Self::build_prompt(request)), true)
            .await
    }
}

impl WriterStyleProfile {
    pub fn from_response(response: &AgentResponse) -> Option<Self> {
        response.parse_data()
    }
}
