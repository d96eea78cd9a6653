//! Research orchestration for Quill.
//!
//! Given a headline and keywords, the [`ResearchOrchestrator`] drives a
//! bounded search, evaluate, verify and decide loop over a web retrieval
//! service and the research agents, then enriches the surviving articles
//! into ranked stories, suggested keywords and a research brief.
//!
//! - [`retrieval`]: web search client and query model
//! - [`trust`]: domain trust weights
//! - [`steps`]: the agent calls the loop sequences
//! - [`persistence`]: saved runs and user selections

pub mod orchestrator;
pub mod persistence;
pub mod retrieval;
pub mod service;
pub mod steps;
pub mod trust;
pub mod types;

pub use orchestrator::{
    CONFIDENCE_THRESHOLD, MAX_LOOPS, ResearchOrchestrator, decide_without_agent,
};
pub use persistence::{InMemoryResearchStore, ResearchRecord, ResearchStore};
pub use retrieval::{SearchDepth, SearchQuery, TavilyClient, WebRetrieval};
pub use service::{ResearchRun, ResearchService};
pub use steps::{
    ArticleFilter, FactVerifier, KeywordSuggester, LoopDecider, ResearchAgents, SynopsisWriter,
};
pub use trust::{StaticTrustSources, TrustMap, TrustSourceProvider};
pub use types::{
    KeywordImportance, LogKind, OrchestratorLogEntry, ResearchBrief, ResearchPipelineResult,
    ResearchRequest, ResearchStory, SuggestedKeyword, VerificationStatus,
};
