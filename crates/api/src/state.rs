//! Shared application state for the API server.

use std::sync::Arc;
use std::time::Instant;

use quill_agents::{
    AgentConfigStore, AgentRegistry, AgentRuntime, CompletionGateway, ContentAgent,
    FactCheckAgent, GrammarChecker, LanguageToolClient, MemoryConfigStore, QualityAgent,
    SeoAgent, ToneAgent, TomlConfigStore, VisualExtractionAgent, WorkflowAgent,
    WriterStyleAgent,
};
use quill_llm::build_llm_client;
use quill_research::{
    InMemoryResearchStore, ResearchAgents, ResearchOrchestrator, ResearchService, ResearchStore,
    StaticTrustSources, TavilyClient, TrustSourceProvider, WebRetrieval,
};
use tracing::info;

use crate::auth::ApiKeyConfig;
use crate::config::QuillConfig;

pub struct AppState {
    runtime: AgentRuntime,
    research: ResearchService,
    research_store: Arc<dyn ResearchStore>,
    fallback_vision: Option<Arc<CompletionGateway>>,
    grammar: Option<Arc<dyn GrammarChecker>>,
    pub api_key: Option<ApiKeyConfig>,
    pub cors_origins: Vec<String>,
    start_time: Instant,
}

impl AppState {
    /// Research results are kept in memory for the lifetime of the process.
    pub fn new(
        runtime: AgentRuntime,
        retrieval: Arc<dyn WebRetrieval>,
        trust: Arc<dyn TrustSourceProvider>,
    ) -> Self {
        let research_store: Arc<dyn ResearchStore> = Arc::new(InMemoryResearchStore::new());
        let orchestrator = ResearchOrchestrator::new(
            retrieval,
            trust,
            ResearchAgents::from_runtime(runtime.clone()),
        );
        Self {
            research: ResearchService::new(orchestrator).with_store(research_store.clone()),
            research_store,
            runtime,
            fallback_vision: None,
            grammar: None,
            api_key: None,
            cors_origins: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Wire every collaborator from the config file.
    pub fn from_config(config: &QuillConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn AgentConfigStore> = match &config.agents.config_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Agent configs stored on disk");
                Arc::new(TomlConfigStore::new(dir))
            }
            None => {
                info!("Agent configs held in memory");
                Arc::new(MemoryConfigStore::new())
            }
        };

        let primary = build_llm_client(&config.primary)?;
        info!(provider = primary.provider_name(), "Primary completion provider");
        let runtime = AgentRuntime::new(
            Arc::new(AgentRegistry::new(store)),
            Arc::new(CompletionGateway::new(primary)),
        );

        let retrieval = Arc::new(TavilyClient::new(
            config.retrieval.api_url.clone(),
            config.retrieval.resolve_api_key(),
        ));
        let trust = Arc::new(StaticTrustSources::new(config.trusted_sources.clone()));

        let mut state = Self::new(runtime, retrieval, trust)
            .with_cors_origins(config.server.cors_origins.clone());

        if let Some(fallback) = &config.fallback_vision {
            let client = build_llm_client(fallback)?;
            info!(provider = client.provider_name(), "Fallback vision provider");
            state = state.with_fallback_vision(Arc::new(CompletionGateway::new(client)));
        }

        if config.grammar.enabled {
            state = state.with_grammar_checker(Arc::new(LanguageToolClient::new(
                config.grammar.url.clone(),
                config.grammar.language.clone(),
            )));
        }

        Ok(state)
    }

    pub fn with_fallback_vision(mut self, gateway: Arc<CompletionGateway>) -> Self {
        self.fallback_vision = Some(gateway);
        self
    }

    pub fn with_grammar_checker(mut self, grammar: Arc<dyn GrammarChecker>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn with_api_key(mut self, api_key: ApiKeyConfig) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn runtime(&self) -> &AgentRuntime {
        &self.runtime
    }

    pub fn registry(&self) -> &AgentRegistry {
        self.runtime.registry()
    }

    pub fn research(&self) -> &ResearchService {
        &self.research
    }

    pub fn research_store(&self) -> &Arc<dyn ResearchStore> {
        &self.research_store
    }

    pub fn content_agent(&self) -> ContentAgent {
        ContentAgent::new(self.runtime.clone())
    }

    pub fn writer_style_agent(&self) -> WriterStyleAgent {
        WriterStyleAgent::new(self.runtime.clone())
    }

    pub fn seo_agent(&self) -> SeoAgent {
        SeoAgent::new(self.runtime.clone())
    }

    pub fn quality_agent(&self) -> QualityAgent {
        let agent = QualityAgent::new(self.runtime.clone());
        match &self.grammar {
            Some(grammar) => agent.with_grammar_checker(grammar.clone()),
            None => agent,
        }
    }

    pub fn tone_agent(&self) -> ToneAgent {
        ToneAgent::new(self.runtime.clone())
    }

    pub fn workflow_agent(&self) -> WorkflowAgent {
        WorkflowAgent::new(self.runtime.clone())
    }

    pub fn visual_agent(&self) -> VisualExtractionAgent {
        let agent = VisualExtractionAgent::new(self.runtime.clone());
        match &self.fallback_vision {
            Some(gateway) => agent.with_fallback(gateway.clone()),
            None => agent,
        }
    }

    pub fn fact_check_agent(&self) -> FactCheckAgent {
        FactCheckAgent::new(self.runtime.clone())
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
