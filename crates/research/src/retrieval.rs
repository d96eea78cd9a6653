//! Web retrieval service client.

use async_trait::async_trait;
use quill_common::{QuillError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::trust::{
    DEFAULT_TRUST_SCORE, FLAG_BELOW_TRUST, TrustMap, normalize_host, trust_for,
    trust_weighted_relevance,
};
use crate::types::ResearchArticle;

const TAVILY_API_URL: &str = "https://api.tavily.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    /// Recency window in days.
    pub days: u32,
    pub depth: SearchDepth,
    pub max_results: u32,
    pub trusted_sources: Option<TrustMap>,
}

#[async_trait]
pub trait WebRetrieval: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResearchArticle>>;
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    topic: &'static str,
    search_depth: SearchDepth,
    max_results: u32,
    days: u32,
    include_answer: bool,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    published_date: Option<String>,
}

/// Tavily search API client.
pub struct TavilyClient {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| TAVILY_API_URL.to_string()),
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    fn to_article(result: TavilyResult, trust: Option<&TrustMap>) -> ResearchArticle {
        let source = Url::parse(&result.url)
            .ok()
            .and_then(|url| url.host_str().map(normalize_host))
            .unwrap_or_default();
        let (trust_score, relevance_score) = match trust {
            Some(map) => {
                let trust_score = trust_for(&source, map);
                (trust_score, trust_weighted_relevance(result.score, trust_score))
            }
            None => (DEFAULT_TRUST_SCORE, (result.score * 100.0).clamp(0.0, 100.0)),
        };

        ResearchArticle {
            id: Uuid::new_v4().to_string(),
            title: result.title,
            description: result.content,
            source,
            url: result.url,
            published_date: result.published_date,
            relevance_score,
            trust_score,
            is_flagged: trust_score < FLAG_BELOW_TRUST,
        }
    }
}

#[async_trait]
impl WebRetrieval for TavilyClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResearchArticle>> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                QuillError::MissingCredential(
                    "Tavily API key not configured. Set TAVILY_API_KEY or retrieval.api_key in config."
                        .into(),
                )
            })?;

        debug!(query = %query.query, days = query.days, max = query.max_results, "Web search");

        let response = self
            .http_client
            .post(format!("{}/search", self.base_url))
            .json(&TavilyRequest {
                api_key,
                query: &query.query,
                topic: "news",
                search_depth: query.depth,
                max_results: query.max_results,
                days: query.days,
                include_answer: false,
            })
            .send()
            .await
            .map_err(|e| QuillError::Retrieval(format!("Search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuillError::Retrieval(format!(
                "Search API error {status}: {body}"
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| QuillError::Retrieval(format!("Failed to parse search response: {e}")))?;

        Ok(parsed
            .results
            .into_iter()
            .take(query.max_results as usize)
            .map(|r| Self::to_article(r, query.trusted_sources.as_ref()))
            .collect())
    }
}
