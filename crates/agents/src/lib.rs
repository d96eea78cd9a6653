//! Specialized agents built on a shared completion gateway.
//!
//! Every agent resolves its configuration fresh from the [`AgentRegistry`]
//! on each call, honors the enabled flag, assembles its prompt from typed
//! request fields in a fixed order and delegates to the
//! [`CompletionGateway`].
//!
//! - **Content**: article generation, whole or streamed
//! - **Writer style**: style profile from sample articles
//! - **SEO**: content analysis and keyword suggestions
//! - **Quality**: content review, grammar, research relevance filter
//! - **Tone**: rewrite for a target tone
//! - **Workflow**: platform-specific derivative outputs
//! - **Visual**: image data extraction with a fallback provider
//! - **Fact check**: cross-source claim verification
//! - **Research**: loop decision and article synopses
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Content  WriterStyle  Seo  Quality  Tone  Workflow ...  │
//! ├──────────────────────────────────────────────────────────┤
//! │                     AgentRuntime                         │
//! │     AgentRegistry (config store)  CompletionGateway      │
//! ├──────────────────────────────────────────────────────────┤
//! │                LlmClient (quill-llm)                     │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod content;
pub mod fact_check;
pub mod gateway;
pub mod grammar;
pub mod prompts;
pub mod quality;
pub mod registry;
pub mod research;
pub mod seo;
pub mod store;
pub mod tone;
pub mod types;
pub mod visual;
pub mod workflow;
pub mod writer_style;

#[cfg(test)]
mod test_support;

pub use config::{AgentConfig, AgentKey};
pub use content::{ContentAgent, ContentRequest};
pub use fact_check::FactCheckAgent;
pub use gateway::{AgentResponse, AgentRuntime, CompletionGateway, ResponseMetadata};
pub use grammar::{GrammarChecker, GrammarMatch, LanguageToolClient, Strictness};
pub use quality::{QualityAgent, QualityCheckRequest};
pub use registry::AgentRegistry;
pub use research::{DecisionInput, LoopDecision, ResearchDecisionAgent, SynopsisAgent};
pub use seo::{KeywordSuggestions, SeoAgent, SeoAnalysisRequest};
pub use store::{AgentConfigStore, MemoryConfigStore, TomlConfigStore};
pub use tone::{ToneAgent, ToneRequest};
pub use types::{
    DisputedFact, FactConfidence, FactVerificationResult, ResearchArticle, VerifiedFact,
};
pub use visual::{
    FallbackPolicy, FallbackTrigger, VisualExtractionAgent, VisualExtractionRequest,
};
pub use workflow::{WorkflowAgent, WorkflowPlan, WorkflowRequest};
pub use writer_style::{WriterStyleAgent, WriterStyleProfile, WriterStyleRequest};
