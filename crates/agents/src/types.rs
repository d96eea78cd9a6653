//! Research records exchanged between retrieval, the agents and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One article returned by the retrieval service. Read-only after retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchArticle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub source: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub trust_score: u32,
    #[serde(default)]
    pub is_flagged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedFact {
    pub fact: String,
    pub confidence: FactConfidence,
    /// Source names, de-duplicated.
    pub sources: Vec<String>,
    pub verification_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputedFact {
    pub fact: String,
    pub conflicting_sources: Vec<String>,
    pub explanation: String,
}

/// Outcome of one fact-verification pass.
///
/// `confidence_score` is always within `[0, 100]`. A failed pass is the
/// empty result, never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactVerificationResult {
    pub verified_facts: Vec<VerifiedFact>,
    pub disputed_facts: Vec<DisputedFact>,
    pub confidence_score: f64,
    pub sources_used: Vec<String>,
    pub verification_timestamp: DateTime<Utc>,
}

impl FactVerificationResult {
    pub fn new(
        verified_facts: Vec<VerifiedFact>,
        disputed_facts: Vec<DisputedFact>,
        confidence_score: f64,
        sources_used: Vec<String>,
    ) -> Self {
        Self {
            verified_facts,
            disputed_facts,
            confidence_score: clamp_score(confidence_score),
            sources_used,
            verification_timestamp: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), 0.0, Vec::new())
    }
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Order-preserving de-duplication.
pub(crate) fn dedupe(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
