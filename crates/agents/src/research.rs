//! Research helper agents: the continue/stop decision and article synopses.
//!
//! Both run under the `research_orchestrator` config and fail safe: a
//! failed decision means "done", failed synopses mean "none".

use std::collections::HashMap;

use quill_common::AgentMessage;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AgentKey;
use crate::gateway::AgentRuntime;
use crate::prompts::PromptBuilder;
use crate::types::ResearchArticle;

/// Inputs to the continue/stop decision.
#[derive(Debug, Clone)]
pub struct DecisionInput {
    pub headline: String,
    pub verified_count: usize,
    pub disputed_count: usize,
    pub confidence_score: f64,
    pub loops_completed: u32,
    pub max_loops: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopDecision {
    Done,
    Continue { follow_up_query: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DecisionPayload {
    done: bool,
    #[serde(alias = "followUpQuery")]
    follow_up_query: Option<String>,
}

impl DecisionPayload {
    fn into_decision(self) -> LoopDecision {
        match self.follow_up_query.map(|q| q.trim().to_string()) {
            Some(query) if !self.done && !query.is_empty() => LoopDecision::Continue {
                follow_up_query: query,
            },
            _ => LoopDecision::Done,
        }
    }
}

pub struct ResearchDecisionAgent {
    runtime: AgentRuntime,
}

impl ResearchDecisionAgent {
    pub const KEY: AgentKey = AgentKey::ResearchOrchestrator;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_prompt(input: &DecisionInput) -> String {
        PromptBuilder::new()
            .field("Headline", &input.headline)
            .field("Verified facts", input.verified_count.to_string())
            .field("Disputed facts", input.disputed_count.to_string())
            .field("Confidence score", format!("{:.0}", input.confidence_score))
            .field(
                "Research loops completed",
                format!("{} of {}", input.loops_completed, input.max_loops),
            )
            .text(
                "Decide whether the research is sufficient. Respond with {\"done\": true} \
                 or {\"done\": false, \"follow_up_query\": \"<search query that would resolve the gaps>\"}.",
            )
            .build()
    }

    pub async fn decide(&self, input: &DecisionInput) -> LoopDecision {
        let response = self
            .runtime
            .invoke(Self::KEY, AgentMessage::user(Self::build_prompt(input)), true)
            .await;

        if !response.success {
            warn!(agent = %Self::KEY, error = ?response.error, "Decision agent failed, stopping");
            return LoopDecision::Done;
        }
        match response.parse_data::<DecisionPayload>() {
            Some(payload) => {
                let decision = payload.into_decision();
                debug!(agent = %Self::KEY, ?decision, "Loop decision");
                decision
            }
            None => {
                warn!(agent = %Self::KEY, "Decision answer unparseable, stopping");
                LoopDecision::Done
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SynopsisPayload {
    synopses: Vec<SynopsisEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SynopsisEntry {
    id: String,
    synopsis: String,
}

pub struct SynopsisAgent {
    runtime: AgentRuntime,
}

impl SynopsisAgent {
    pub const KEY: AgentKey = AgentKey::ResearchOrchestrator;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self { runtime }
    }

    pub fn build_prompt(articles: &[ResearchArticle]) -> String {
        let listing = articles
            .iter()
            .map(|a| format!("id: {}\ntitle: {}\ndescription: {}", a.id, a.title, a.description))
            .collect::<Vec<_>>();

        PromptBuilder::new()
            .numbered("Articles", &listing)
            .text(
                "Write a one-sentence synopsis for each article. Respond with \
                 {\"synopses\": [{\"id\": \"...\", \"synopsis\": \"...\"}]}.",
            )
            .build()
    }

    /// Synopsis per article id. Best effort: missing ids are simply absent.
    pub async fn summarize(&self, articles: &[ResearchArticle]) -> HashMap<String, String> {
        if articles.is_empty() {
            return HashMap::new();
        }

        let response = self
            .runtime
            .invoke(Self::KEY, AgentMessage::user(Self::build_prompt(articles)), true)
            .await;
        if !response.success {
            warn!(agent = %Self::KEY, error = ?response.error, "Synopsis generation failed");
            return HashMap::new();
        }

        response
            .parse_data::<SynopsisPayload>()
            .map(|payload| {
                payload
                    .synopses
                    .into_iter()
                    .filter(|entry| !entry.synopsis.trim().is_empty())
                    .map(|entry| (entry.id, entry.synopsis.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
