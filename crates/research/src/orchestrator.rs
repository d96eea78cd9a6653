//! Bounded research loop.
//!
//! ```text
//! SEARCHING ──► EVALUATING ──► VERIFYING ──► DECIDING ──┬──► DONE ──► ENRICHING
//!     ▲                                                 │
//!     └─────────────── follow-up query ─────────────────┘
//! ```
//!
//! The loop runs at most [`MAX_LOOPS`] iterations. A non-empty search
//! replaces the accumulated article set in full; an empty follow-up search
//! leaves it intact. An empty first search aborts with an empty result.
//! The orchestrator holds no state between runs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use quill_agents::{DecisionInput, KeywordSuggestions, LoopDecision};
use tracing::{debug, info, warn};

use crate::retrieval::{SearchDepth, SearchQuery, WebRetrieval};
use crate::steps::ResearchAgents;
use crate::trust::{TrustMap, TrustSourceProvider};
use crate::types::{
    FactVerificationResult, KeywordImportance, LogKind, OrchestratorLog, ResearchArticle,
    ResearchBrief, ResearchPipelineResult, ResearchRequest, ResearchStory, SuggestedKeyword,
    VerificationStatus,
};

pub const MAX_LOOPS: u32 = 4;
pub const SEARCH_WINDOW_DAYS: u32 = 21;
pub const MAX_SEARCH_RESULTS: u32 = 15;
pub const MAX_STORIES: usize = 15;
pub const SELECTED_STORIES: usize = 5;
/// Verification confidence at which research counts as settled.
pub const CONFIDENCE_THRESHOLD: f64 = 70.0;
const SYNOPSIS_FALLBACK_CHARS: usize = 200;

/// Pure threshold check ahead of the decision agent.
///
/// `Some(Done)` when the loop bound is reached or the latest verification
/// has no disputed facts at or above the confidence threshold. `None` means
/// the decision agent must be consulted.
pub fn decide_without_agent(
    loops_completed: u32,
    last_verification: Option<&FactVerificationResult>,
) -> Option<LoopDecision> {
    if loops_completed >= MAX_LOOPS {
        return Some(LoopDecision::Done);
    }
    match last_verification {
        Some(v) if v.disputed_facts.is_empty() && v.confidence_score >= CONFIDENCE_THRESHOLD => {
            Some(LoopDecision::Done)
        }
        _ => None,
    }
}

/// Headline, keywords, topic and details joined into the first query.
pub fn initial_query(request: &ResearchRequest) -> String {
    let mut parts = vec![request.headline.as_str(), request.primary_keyword.as_str()];
    parts.extend(request.secondary_keywords.iter().map(String::as_str));
    parts.push(request.topic.as_str());
    parts.push(request.details.as_str());
    join_non_empty(parts)
}

/// Headline plus keywords: the topic used for keyword discovery.
pub fn keyword_topic(request: &ResearchRequest) -> String {
    let mut parts = vec![request.headline.as_str(), request.primary_keyword.as_str()];
    parts.extend(request.secondary_keywords.iter().map(String::as_str));
    join_non_empty(parts)
}

fn join_non_empty(parts: Vec<&str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncated description, or the title when there is none.
pub fn fallback_synopsis(article: &ResearchArticle) -> String {
    let description = article.description.trim();
    if description.is_empty() {
        return article.title.clone();
    }
    if description.chars().count() <= SYNOPSIS_FALLBACK_CHARS {
        return description.to_string();
    }
    let truncated: String = description.chars().take(SYNOPSIS_FALLBACK_CHARS).collect();
    format!("{truncated}...")
}

/// Primary, secondary and long-tail groups map to high, medium and low.
pub fn classify_keywords(groups: KeywordSuggestions) -> Vec<SuggestedKeyword> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for (keywords, importance) in [
        (groups.primary, KeywordImportance::High),
        (groups.secondary, KeywordImportance::Medium),
        (groups.long_tail, KeywordImportance::Low),
    ] {
        for keyword in keywords {
            let keyword = keyword.trim().to_string();
            let folded = keyword.to_lowercase();
            if keyword.is_empty() || seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            out.push(SuggestedKeyword {
                keyword,
                importance,
            });
        }
    }
    out
}

/// Rank by relevance, keep the top stories and select the leading few.
pub fn build_stories(
    articles: &[ResearchArticle],
    synopses: &HashMap<String, String>,
    last_verification: Option<&FactVerificationResult>,
) -> Vec<ResearchStory> {
    let status = match last_verification {
        None => VerificationStatus::Pending,
        Some(v) if v.confidence_score >= CONFIDENCE_THRESHOLD => VerificationStatus::Verified,
        Some(_) => VerificationStatus::Unresolved,
    };

    let mut ranked: Vec<&ResearchArticle> = articles.iter().collect();
    ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    ranked
        .into_iter()
        .take(MAX_STORIES)
        .enumerate()
        .map(|(rank, article)| ResearchStory {
            synopsis: synopses
                .get(&article.id)
                .cloned()
                .unwrap_or_else(|| fallback_synopsis(article)),
            is_selected: rank < SELECTED_STORIES,
            verification_status: status,
            article: article.clone(),
        })
        .collect()
}

pub struct ResearchOrchestrator {
    retrieval: Arc<dyn WebRetrieval>,
    trust: Arc<dyn TrustSourceProvider>,
    agents: ResearchAgents,
}

impl ResearchOrchestrator {
    pub fn new(
        retrieval: Arc<dyn WebRetrieval>,
        trust: Arc<dyn TrustSourceProvider>,
        agents: ResearchAgents,
    ) -> Self {
        Self {
            retrieval,
            trust,
            agents,
        }
    }

    /// Run one pipeline. Always returns a structurally complete result.
    pub async fn run(&self, request: &ResearchRequest) -> ResearchPipelineResult {
        info!(headline = %request.headline, "Starting research pipeline");

        let mut log = OrchestratorLog::new();
        let trust_map = self.load_trust_map().await;
        let topic = if request.topic.trim().is_empty() {
            request.headline.clone()
        } else {
            request.topic.clone()
        };

        let mut articles: Vec<ResearchArticle> = Vec::new();
        let mut last_verification: Option<FactVerificationResult> = None;
        let mut loops_completed: u32 = 0;
        let mut query = initial_query(request);

        loop {
            // SEARCHING
            log.push(LogKind::Search, format!("Searching: {query}"));
            let found = self.search(&query, &trust_map).await;
            if found.is_empty() {
                if loops_completed == 0 {
                    log.push(
                        LogKind::Error,
                        "Initial search returned no articles; aborting research",
                    );
                    return self.aborted(request, log).await;
                }
                log.push(
                    LogKind::Search,
                    "Follow-up search returned no articles; keeping previous set",
                );
            } else {
                log.push(LogKind::Search, format!("Found {} articles", found.len()));
                articles = found;
            }

            // EVALUATING
            let candidates = articles.len();
            articles = self
                .agents
                .filter
                .filter(&articles, &request.headline, &topic)
                .await;
            log.push(
                LogKind::Evaluate,
                format!(
                    "Kept {} of {candidates} articles as relevant and recent",
                    articles.len()
                ),
            );

            // VERIFYING
            if !articles.is_empty() {
                let verification = self.agents.verifier.verify(&articles, &topic).await;
                log.push(
                    LogKind::Verify,
                    format!(
                        "Verified {} facts, {} disputed, confidence {:.0}",
                        verification.verified_facts.len(),
                        verification.disputed_facts.len(),
                        verification.confidence_score
                    ),
                );
                last_verification = Some(verification);
            }

            // DECIDING
            loops_completed += 1;
            let decision = match decide_without_agent(loops_completed, last_verification.as_ref())
            {
                Some(decision) => decision,
                None => {
                    let input = decision_input(request, loops_completed, last_verification.as_ref());
                    self.agents.decider.decide(&input).await
                }
            };

            match decision {
                LoopDecision::Done => break,
                LoopDecision::Continue { follow_up_query } => {
                    log.push(
                        LogKind::Followup,
                        format!("Follow-up research: {follow_up_query}"),
                    );
                    query = follow_up_query;
                }
            }
        }

        // ENRICHING
        let suggested_keywords = self.suggest_keywords(request, &mut log).await;
        let synopses = self.agents.synopses.synopses(&articles).await;
        debug!(
            articles = articles.len(),
            synopses = synopses.len(),
            "Generated synopses"
        );
        let stories = build_stories(&articles, &synopses, last_verification.as_ref());

        let research_brief = match last_verification {
            Some(verification) => ResearchBrief {
                articles,
                verified_facts: verification.verified_facts,
                disputed_facts: verification.disputed_facts,
                fact_check_complete: true,
                research_timestamp: Utc::now(),
                confidence_score: verification.confidence_score,
            },
            None => ResearchBrief {
                articles,
                ..ResearchBrief::empty()
            },
        };

        log.push(
            LogKind::Complete,
            format!(
                "Research complete after {loops_completed} loop(s): {} stories, confidence {:.0}",
                stories.len(),
                research_brief.confidence_score
            ),
        );

        ResearchPipelineResult {
            stories,
            suggested_keywords,
            orchestrator_log: log.into_entries(),
            loops_completed,
            research_brief,
        }
    }

    async fn load_trust_map(&self) -> TrustMap {
        match self.trust.load().await {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Trusted sources unavailable, searching without weights");
                TrustMap::new()
            }
        }
    }

    /// A retrieval failure counts as an empty result.
    async fn search(&self, query: &str, trust_map: &TrustMap) -> Vec<ResearchArticle> {
        let search = SearchQuery {
            query: query.to_string(),
            days: SEARCH_WINDOW_DAYS,
            depth: SearchDepth::Advanced,
            max_results: MAX_SEARCH_RESULTS,
            trusted_sources: (!trust_map.is_empty()).then(|| trust_map.clone()),
        };
        match self.retrieval.search(&search).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(error = %e, "Web search failed");
                Vec::new()
            }
        }
    }

    async fn suggest_keywords(
        &self,
        request: &ResearchRequest,
        log: &mut OrchestratorLog,
    ) -> Vec<SuggestedKeyword> {
        let groups = self.agents.keywords.suggest(&keyword_topic(request)).await;
        let keywords = classify_keywords(groups);
        log.push(
            LogKind::Keywords,
            format!("Suggested {} keywords", keywords.len()),
        );
        keywords
    }

    async fn aborted(
        &self,
        request: &ResearchRequest,
        mut log: OrchestratorLog,
    ) -> ResearchPipelineResult {
        let suggested_keywords = self.suggest_keywords(request, &mut log).await;
        ResearchPipelineResult {
            stories: Vec::new(),
            suggested_keywords,
            orchestrator_log: log.into_entries(),
            loops_completed: 0,
            research_brief: ResearchBrief::empty(),
        }
    }
}

fn decision_input(
    request: &ResearchRequest,
    loops_completed: u32,
    last_verification: Option<&FactVerificationResult>,
) -> DecisionInput {
    DecisionInput {
        headline: request.headline.clone(),
        verified_count: last_verification.map_or(0, |v| v.verified_facts.len()),
        disputed_count: last_verification.map_or(0, |v| v.disputed_facts.len()),
        confidence_score: last_verification.map_or(0.0, |v| v.confidence_score),
        loops_completed,
        max_loops: MAX_LOOPS,
    }
}
