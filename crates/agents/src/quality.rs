//! Quality assurance agent - content review, grammar and research relevance.

use std::sync::Arc;

use chrono::Utc;
use quill_common::AgentMessage;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::AgentKey;
use crate::gateway::{AgentResponse, AgentRuntime};
use crate::grammar::{GrammarChecker, Strictness};
use crate::prompts::PromptBuilder;
use crate::types::ResearchArticle;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityCheckRequest {
    pub headline: String,
    #[serde(default)]
    pub check_types: Vec<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct KeepIds {
    #[serde(alias = "keepIds")]
    keep_ids: Vec<String>,
}

pub struct QualityAgent {
    runtime: AgentRuntime,
    grammar: Option<Arc<dyn GrammarChecker>>,
}

impl QualityAgent {
    pub const KEY: AgentKey = AgentKey::QualityAssurance;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self {
            runtime,
            grammar: None,
        }
    }

    pub fn with_grammar_checker(mut self, grammar: Arc<dyn GrammarChecker>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn build_check_prompt(request: &QualityCheckRequest) -> String {
        let check_types = if request.check_types.is_empty() {
            vec![
                "accuracy".to_string(),
                "clarity".into(),
                "structure".into(),
                "grammar".into(),
            ]
        } else {
            request.check_types.clone()
        };

        PromptBuilder::new()
            .field("Headline", &request.headline)
            .list("Check types", &check_types)
            .block("Content", &request.content)
            .text("Review this content and report every issue you find.")
            .build()
    }

    pub fn build_filter_prompt(articles: &[ResearchArticle], headline: &str, topic: &str) -> String {
        let listing = articles
            .iter()
            .map(|a| {
                format!(
                    "id: {}\ntitle: {}\nsource: {}\npublished: {}\ndescription: {}",
                    a.id,
                    a.title,
                    a.source,
                    a.published_date.as_deref().unwrap_or("unknown"),
                    a.description
                )
            })
            .collect::<Vec<_>>();

        PromptBuilder::new()
            .field("Headline", headline)
            .field("Topic", topic)
            .field("Today's date", Utc::now().format("%Y-%m-%d").to_string())
            .numbered("Articles", &listing)
            .text(
                "Return the ids of the articles that are relevant to the headline and recent enough to cite, \
                 as {\"keep_ids\": [...]}. If you are unsure about an article, keep it.",
            )
            .build()
    }

    pub async fn check(&self, request: &QualityCheckRequest) -> AgentResponse {
        self.runtime
            .invoke(
                Self::KEY,
                AgentMessage::user(Self::build_check_prompt(request)),
                true,
            )
            .await
    }

    /// Grammar sub-check through the external grammar service.
    pub async fn check_grammar(&self, text: &str, strictness: Strictness) -> AgentResponse {
        let config = self.runtime.config(Self::KEY).await;
        if !config.enabled {
            return AgentResponse::disabled(&config);
        }
        let Some(grammar) = &self.grammar else {
            return AgentResponse::failure(Self::KEY, "Grammar service is not configured");
        };

        match grammar.check(text, strictness).await {
            Ok(matches) => {
                debug!(agent = %Self::KEY, issues = matches.len(), "Grammar check complete");
                AgentResponse::succeeded(
                    Self::KEY,
                    format!("{} grammar issue(s) found", matches.len()),
                    Some(json!({ "matches": matches })),
                )
            }
            Err(e) => {
                warn!(agent = %Self::KEY, error = %e, "Grammar check failed");
                AgentResponse::failure(Self::KEY, e.to_string())
            }
        }
    }

    /// Keep only relevant, timely articles. Keeps everything when the
    /// completion fails or its answer cannot be parsed.
    pub async fn filter_relevant_articles(
        &self,
        articles: &[ResearchArticle],
        headline: &str,
        topic: &str,
    ) -> Vec<ResearchArticle> {
        if articles.is_empty() {
            return Vec::new();
        }

        let response = self
            .runtime
            .invoke(
                Self::KEY,
                AgentMessage::user(Self::build_filter_prompt(articles, headline, topic)),
                true,
            )
            .await;

        if !response.success {
            warn!(
                agent = %Self::KEY,
                error = ?response.error,
                "Relevance filter failed, keeping all articles"
            );
            return articles.to_vec();
        }

        let Some(KeepIds { keep_ids }) = response.parse_data::<KeepIds>() else {
            warn!(agent = %Self::KEY, "Relevance filter answer unparseable, keeping all articles");
            return articles.to_vec();
        };

        let kept: Vec<ResearchArticle> = articles
            .iter()
            .filter(|a| keep_ids.contains(&a.id))
            .cloned()
            .collect();
        if kept.is_empty() && !keep_ids.is_empty() {
            warn!(
                agent = %Self::KEY,
                answered = keep_ids.len(),
                "Relevance filter named no known article ids, keeping all articles"
            );
            return articles.to_vec();
        }
        info!(
            agent = %Self::KEY,
            candidates = articles.len(),
            kept = kept.len(),
            "Filtered research articles"
        );
        kept
    }
}
