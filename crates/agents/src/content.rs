//! Content generation agent - long-form articles from a brief.

use quill_common::{AgentMessage, Result};
use quill_llm::CompletionStream;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AgentKey;
use crate::gateway::{AgentResponse, AgentRuntime};
use crate::prompts::PromptBuilder;
use crate::types::VerifiedFact;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentRequest {
    pub headline: String,
    pub primary_keyword: String,
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    #[serde(default)]
    pub target_word_count: Option<u32>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub outline: Option<String>,
    /// Verified facts from the research brief.
    #[serde(default)]
    pub research_facts: Vec<VerifiedFact>,
    #[serde(default)]
    pub writer_style: Option<String>,
    #[serde(default)]
    pub additional_instructions: Option<String>,
}

pub struct ContentAgent {
    runtime: AgentRuntime,
}

impl ContentAgent {
    pub const KEY: AgentKey = AgentKey::ContentGeneration;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_prompt(request: &ContentRequest) -> String {
        let facts = request
            .research_facts
            .iter()
            .map(|f| {
                format!(
                    "- {} ({:?} confidence; {})",
                    f.fact,
                    f.confidence,
                    f.sources.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        PromptBuilder::new()
            .field("Headline", &request.headline)
            .field("Primary keyword", &request.primary_keyword)
            .list("Secondary keywords", &request.secondary_keywords)
            .optional(
                "Target word count",
                request.target_word_count.map(|n| n.to_string()),
            )
            .optional("Tone", request.tone.as_ref())
            .optional("Outline", request.outline.as_ref())
            .block("Research brief (verified facts)", facts)
            .optional("Writer style guide", request.writer_style.as_ref())
            .optional(
                "Additional instructions",
                request.additional_instructions.as_ref(),
            )
            .text("Write the complete article now.")
            .build()
    }

    pub async fn generate(&self, request: &ContentRequest) -> AgentResponse {
        info!(agent = %Self::KEY, headline = %request.headline, "Generating article");
        self.runtime
            .invoke(Self::KEY, AgentMessage::user(Self::build_prompt(request)), false)
            .await
    }

    pub async fn generate_stream(&self, request: &ContentRequest) -> Result<CompletionStream> {
        info!(agent = %Self::KEY, headline = %request.headline, "Streaming article");
        self.runtime
            .invoke_stream(Self::KEY, AgentMessage::user(Self::build_prompt(request)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::runtime_with;
    use crate::types::FactConfidence;
    use chrono::Utc;
    use futures::StreamExt;

    fn request() -> ContentRequest {
        ContentRequest {
            headline: "Ravens Playoff Analysis".into(),
            primary_keyword: "Baltimore Ravens playoffs".into(),
            secondary_keywords: vec!["AFC North".into(), "Lamar Jackson".into()],
            target_word_count: Some(1200),
            tone: Some("analytical".into()),
            outline: None,
            research_facts: vec![VerifiedFact {
                fact: "The Ravens clinched the AFC North".into(),
                confidence: FactConfidence::High,
                sources: vec!["espn.com".into(), "nfl.com".into()],
                verification_date: Utc::now(),
            }],
            writer_style: Some("Short punchy paragraphs".into()),
            additional_instructions: Some("End with a prediction".into()),
        }
    }

    #[test]
    fn prompt_fields_follow_fixed_order() {
        let prompt = ContentAgent::build_prompt(&request());
        let order = [
            "Headline:",
            "Primary keyword:",
            "Secondary keywords: AFC North, Lamar Jackson",
            "Target word count: 1200",
            "Tone: analytical",
            "Research brief (verified facts):",
            "Writer style guide:",
            "Additional instructions:",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|label| prompt.find(label).unwrap_or_else(|| panic!("missing {label}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!prompt.contains("Outline:"));
        assert!(prompt.contains("- The Ravens clinched the AFC North (High confidence; espn.com, nfl.com)"));
    }

    #[tokio::test]
    async fn generate_returns_article_text() {
        let (runtime, client) = runtime_with(vec![Ok("# Ravens\n\nBody".into())]);
        let agent = ContentAgent::new(runtime);
        let response = agent.generate(&request()).await;
        assert!(response.success);
        assert_eq!(response.content.as_deref(), Some("# Ravens\n\nBody"));
        assert!(response.data.is_none());
        assert_eq!(client.requests()[0].max_tokens, Some(4000));
    }

    #[tokio::test]
    async fn generate_stream_yields_text() {
        let (runtime, _client) = runtime_with(vec![Ok("The Ravens won".into())]);
        let agent = ContentAgent::new(runtime);
        let stream = agent.generate_stream(&request()).await.unwrap();
        let text: Vec<String> = stream.map(|d| d.unwrap()).collect().await;
        assert_eq!(text.concat(), "The Ravens won");
    }
}
