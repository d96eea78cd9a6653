//! The agent calls the orchestrator sequences, as narrow traits.
//!
//! Each step is fail-safe by contract: implementations return a safe
//! default instead of an error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use quill_agents::{
    AgentRuntime, DecisionInput, FactCheckAgent, KeywordSuggestions, LoopDecision, QualityAgent,
    ResearchDecisionAgent, SeoAgent, SynopsisAgent,
};
use tracing::warn;

use crate::types::{FactVerificationResult, ResearchArticle};

/// Relevance/timeliness filter. Keeps everything on failure.
#[async_trait]
pub trait ArticleFilter: Send + Sync {
    async fn filter(
        &self,
        articles: &[ResearchArticle],
        headline: &str,
        topic: &str,
    ) -> Vec<ResearchArticle>;
}

/// Cross-source verification. Returns the empty result on failure.
#[async_trait]
pub trait FactVerifier: Send + Sync {
    async fn verify(&self, articles: &[ResearchArticle], topic: &str) -> FactVerificationResult;
}

/// Continue/stop decision. Answers `Done` on failure.
#[async_trait]
pub trait LoopDecider: Send + Sync {
    async fn decide(&self, input: &DecisionInput) -> LoopDecision;
}

/// Keyword discovery. Returns empty groups on failure.
#[async_trait]
pub trait KeywordSuggester: Send + Sync {
    async fn suggest(&self, topic: &str) -> KeywordSuggestions;
}

/// One-sentence synopsis per article id. Missing ids are allowed.
#[async_trait]
pub trait SynopsisWriter: Send + Sync {
    async fn synopses(&self, articles: &[ResearchArticle]) -> HashMap<String, String>;
}

#[async_trait]
impl ArticleFilter for QualityAgent {
    async fn filter(
        &self,
        articles: &[ResearchArticle],
        headline: &str,
        topic: &str,
    ) -> Vec<ResearchArticle> {
        self.filter_relevant_articles(articles, headline, topic).await
    }
}

#[async_trait]
impl FactVerifier for FactCheckAgent {
    async fn verify(&self, articles: &[ResearchArticle], topic: &str) -> FactVerificationResult {
        FactCheckAgent::verify(self, articles, topic).await
    }
}

#[async_trait]
impl LoopDecider for ResearchDecisionAgent {
    async fn decide(&self, input: &DecisionInput) -> LoopDecision {
        ResearchDecisionAgent::decide(self, input).await
    }
}

#[async_trait]
impl KeywordSuggester for SeoAgent {
    async fn suggest(&self, topic: &str) -> KeywordSuggestions {
        let response = self.suggest_keywords(topic).await;
        if !response.success {
            warn!(error = ?response.error, "Keyword suggestion failed");
            return KeywordSuggestions::default();
        }
        KeywordSuggestions::from_response(&response).unwrap_or_else(|| {
            warn!("Keyword suggestion answer unparseable");
            KeywordSuggestions::default()
        })
    }
}

#[async_trait]
impl SynopsisWriter for SynopsisAgent {
    async fn synopses(&self, articles: &[ResearchArticle]) -> HashMap<String, String> {
        self.summarize(articles).await
    }
}

/// The collaborators one pipeline run calls, in call order.
#[derive(Clone)]
pub struct ResearchAgents {
    pub filter: Arc<dyn ArticleFilter>,
    pub verifier: Arc<dyn FactVerifier>,
    pub decider: Arc<dyn LoopDecider>,
    pub keywords: Arc<dyn KeywordSuggester>,
    pub synopses: Arc<dyn SynopsisWriter>,
}

impl ResearchAgents {
    /// Wire every step to its specialized agent on a shared runtime.
    pub fn from_runtime(runtime: AgentRuntime) -> Self {
        Self {
            filter: Arc::new(QualityAgent::new(runtime.clone())),
            verifier: Arc::new(FactCheckAgent::new(runtime.clone())),
            decider: Arc::new(ResearchDecisionAgent::new(runtime.clone())),
            keywords: Arc::new(SeoAgent::new(runtime.clone())),
            synopses: Arc::new(SynopsisAgent::new(runtime)),
        }
    }
}
