//! Fact verification agent - cross-references claims across articles.

use chrono::Utc;
use quill_common::AgentMessage;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::AgentKey;
use crate::gateway::{AgentResponse, AgentRuntime};
use crate::prompts::PromptBuilder;
use crate::types::{
    DisputedFact, FactConfidence, FactVerificationResult, ResearchArticle, VerifiedFact, dedupe,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VerificationPayload {
    verified_facts: Vec<RawVerifiedFact>,
    disputed_facts: Vec<RawDisputedFact>,
    confidence_score: f64,
    sources_used: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVerifiedFact {
    fact: String,
    confidence: String,
    sources: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDisputedFact {
    fact: String,
    conflicting_sources: Vec<String>,
    explanation: String,
}

fn parse_confidence(tier: &str) -> FactConfidence {
    match tier.trim().to_ascii_lowercase().as_str() {
        "high" => FactConfidence::High,
        "medium" => FactConfidence::Medium,
        _ => FactConfidence::Low,
    }
}

pub struct FactCheckAgent {
    runtime: AgentRuntime,
}

impl FactCheckAgent {
    pub const KEY: AgentKey = AgentKey::FactChecker;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_prompt(articles: &[ResearchArticle], topic: &str) -> String {
        let listing = articles
            .iter()
            .map(|a| {
                format!(
                    "Source: {}\nTrust score: {}\nPublished: {}\nTitle: {}\nDescription: {}\nURL: {}",
                    a.source,
                    a.trust_score,
                    a.published_date.as_deref().unwrap_or("unknown"),
                    a.title,
                    a.description,
                    a.url
                )
            })
            .collect::<Vec<_>>();

        PromptBuilder::new()
            .field("Topic", topic)
            .numbered("Articles", &listing)
            .text("Cross-reference the claims in these articles and report verified and disputed facts.")
            .build()
    }

    /// Raw agent response with the structured payload attached when parseable.
    pub async fn run(&self, articles: &[ResearchArticle], topic: &str) -> AgentResponse {
        self.runtime
            .invoke(
                Self::KEY,
                AgentMessage::user(Self::build_prompt(articles, topic)),
                true,
            )
            .await
    }

    /// Always well-formed: any failure yields the empty result.
    pub async fn verify(&self, articles: &[ResearchArticle], topic: &str) -> FactVerificationResult {
        if articles.is_empty() {
            return FactVerificationResult::empty();
        }

        let response = self.run(articles, topic).await;
        if !response.success {
            warn!(agent = %Self::KEY, error = ?response.error, "Fact verification failed");
            return FactVerificationResult::empty();
        }
        let Some(payload) = response.parse_data::<VerificationPayload>() else {
            warn!(agent = %Self::KEY, "Fact verification answer unparseable");
            return FactVerificationResult::empty();
        };

        let result = Self::into_result(payload, articles);
        info!(
            agent = %Self::KEY,
            verified = result.verified_facts.len(),
            disputed = result.disputed_facts.len(),
            confidence = result.confidence_score,
            "Fact verification complete"
        );
        result
    }

    fn into_result(payload: VerificationPayload, articles: &[ResearchArticle]) -> FactVerificationResult {
        let now = Utc::now();
        let verified = payload
            .verified_facts
            .into_iter()
            .filter(|f| !f.fact.trim().is_empty())
            .map(|f| VerifiedFact {
                fact: f.fact,
                confidence: parse_confidence(&f.confidence),
                sources: dedupe(f.sources),
                verification_date: now,
            })
            .collect();
        let disputed = payload
            .disputed_facts
            .into_iter()
            .filter(|f| !f.fact.trim().is_empty())
            .map(|f| DisputedFact {
                fact: f.fact,
                conflicting_sources: dedupe(f.conflicting_sources),
                explanation: f.explanation,
            })
            .collect();

        let sources_used = if payload.sources_used.is_empty() {
            dedupe(articles.iter().map(|a| a.source.clone()))
        } else {
            dedupe(payload.sources_used)
        };

        FactVerificationResult::new(verified, disputed, payload.confidence_score, sources_used)
    }
}
