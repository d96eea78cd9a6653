//! Research pipeline records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub use quill_agents::{DisputedFact, FactVerificationResult, ResearchArticle, VerifiedFact};

/// What to research.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub headline: String,
    pub primary_keyword: String,
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    #[serde(default)]
    pub topic: String,
    /// Free-form detail text appended to the first search query.
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchStory {
    #[serde(flatten)]
    pub article: ResearchArticle,
    pub synopsis: String,
    pub is_selected: bool,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordImportance {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedKeyword {
    pub keyword: String,
    pub importance: KeywordImportance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Search,
    Evaluate,
    Verify,
    Followup,
    Keywords,
    Complete,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Search => "search",
            LogKind::Evaluate => "evaluate",
            LogKind::Verify => "verify",
            LogKind::Followup => "followup",
            LogKind::Keywords => "keywords",
            LogKind::Complete => "complete",
            LogKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
}

/// Append-only audit trail of one pipeline run.
#[derive(Debug, Default)]
pub struct OrchestratorLog {
    entries: Vec<OrchestratorLogEntry>,
}

impl OrchestratorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and mirror it as a tracing event.
    pub fn push(&mut self, kind: LogKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            LogKind::Error => error!(step = kind.as_str(), %message, "Research pipeline"),
            _ => info!(step = kind.as_str(), %message, "Research pipeline"),
        }
        self.entries.push(OrchestratorLogEntry {
            timestamp: Utc::now(),
            message,
            kind,
        });
    }

    pub fn entries(&self) -> &[OrchestratorLogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<OrchestratorLogEntry> {
        self.entries
    }
}

/// Articles, facts and confidence produced by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchBrief {
    pub articles: Vec<ResearchArticle>,
    pub verified_facts: Vec<VerifiedFact>,
    pub disputed_facts: Vec<DisputedFact>,
    pub fact_check_complete: bool,
    pub research_timestamp: DateTime<Utc>,
    /// Always within `[0, 100]`.
    pub confidence_score: f64,
}

impl ResearchBrief {
    pub fn empty() -> Self {
        Self {
            articles: Vec::new(),
            verified_facts: Vec::new(),
            disputed_facts: Vec::new(),
            fact_check_complete: false,
            research_timestamp: Utc::now(),
            confidence_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPipelineResult {
    pub stories: Vec<ResearchStory>,
    pub suggested_keywords: Vec<SuggestedKeyword>,
    pub orchestrator_log: Vec<OrchestratorLogEntry>,
    pub loops_completed: u32,
    pub research_brief: ResearchBrief,
}
