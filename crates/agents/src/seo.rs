//! SEO analysis and keyword suggestion agent.

use quill_common::AgentMessage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AgentKey;
use crate::gateway::{AgentResponse, AgentRuntime};
use crate::prompts::PromptBuilder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoAnalysisRequest {
    pub headline: String,
    pub primary_keyword: String,
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    pub content: String,
}

/// Keyword groups, most to least important.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSuggestions {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    #[serde(alias = "longTail")]
    pub long_tail: Vec<String>,
}

impl KeywordSuggestions {
    pub fn from_response(response: &AgentResponse) -> Option<Self> {
        response.parse_data()
    }
}

pub struct SeoAgent {
    runtime: AgentRuntime,
}

impl SeoAgent {
    pub const KEY: AgentKey = AgentKey::Seo;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_analysis_prompt(request: &SeoAnalysisRequest) -> String {
        PromptBuilder::new()
            .field("Headline", &request.headline)
            .field("Primary keyword", &request.primary_keyword)
            .list("Secondary keywords", &request.secondary_keywords)
            .optional("Meta description", request.meta_description.as_ref())
            .block("Content", &request.content)
            .text("Analyze this content for search optimization.")
            .build()
    }

    pub fn build_keyword_prompt(topic: &str) -> String {
        PromptBuilder::new()
            .field("Topic", topic)
            .text(
                "Suggest search keywords for this topic grouped as primary, secondary and long_tail.",
            )
            .build()
    }

    pub async fn analyze(&self, request: &SeoAnalysisRequest) -> AgentResponse {
        self.runtime
            .invoke(
                Self::KEY,
                AgentMessage::user(Self::build_analysis_prompt(request)),
                true,
            )
            .await
    }

    pub async fn suggest_keywords(&self, topic: &str) -> AgentResponse {
        debug!(agent = %Self::KEY, topic, "Suggesting keywords");
        self.runtime
            .invoke(Self::KEY, AgentMessage::user(Self::build_keyword_prompt(topic)), true)
            .await
    }
}
