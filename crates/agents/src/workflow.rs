//! Workflow agent - turns finished content into platform outputs.

use quill_common::AgentMessage;
use serde::{Deserialize, Serialize};

use crate::config::AgentKey;
use crate::gateway::{AgentResponse, AgentRuntime};
use crate::prompts::PromptBuilder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// e.g. "social_posts", "newsletter", "summary".
    pub transformation: String,
    #[serde(default)]
    pub target_platform: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowOutput {
    pub format: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowPlan {
    pub outputs: Vec<WorkflowOutput>,
    pub notes: String,
}

impl WorkflowPlan {
    pub fn from_response(response: &AgentResponse) -> Option<Self> {
        response.parse_data()
    }
}

pub struct WorkflowAgent {
    runtime: AgentRuntime,
}

impl WorkflowAgent {
    pub const KEY: AgentKey = AgentKey::Workflow;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_prompt(request: &WorkflowRequest) -> String {
        PromptBuilder::new()
            .field("Transformation", &request.transformation)
            .optional("Target platform", request.target_platform.as_ref())
            .optional("Instructions", request.instructions.as_ref())
            .block("Content", &request.content)
            .build()
    }

    pub async fn transform(&self, request: &WorkflowRequest) -> AgentResponse {
        self.runtime
            .invoke(Self::KEY, AgentMessage::user(Self::build_prompt(request)), true)
            .await
    }
}
