//! Integration tests for agents backed by a file config store.
//!
//! A scripted completion client stands in for the provider so no network
//! access is needed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use quill_agents::{
    AgentConfig, AgentConfigStore, AgentKey, AgentRegistry, AgentRuntime, CompletionGateway,
    ContentAgent, ContentRequest, FactCheckAgent, QualityAgent, QualityCheckRequest,
    ResearchArticle, SeoAgent, SeoAnalysisRequest, ToneAgent, ToneRequest, TomlConfigStore,
    VisualExtractionAgent, VisualExtractionRequest, WorkflowAgent, WorkflowRequest,
    WriterStyleAgent, WriterStyleRequest,
};
use quill_common::{QuillError, Result};
use quill_llm::{CompletionStream, LlmClient, LlmRequest, LlmResponse};

/// Answers every request with the next scripted reply and records it.
struct RecordingClient {
    replies: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<LlmRequest>>,
}

impl RecordingClient {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<LlmRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn reply(&self, request: LlmRequest) -> Result<String> {
        self.seen.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| QuillError::Provider("no reply scripted".into()))
    }
}

#[async_trait]
impl LlmClient for RecordingClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let model = request.model.clone();
        Ok(LlmResponse {
            content: self.reply(request)?,
            model,
            usage: None,
            finish_reason: None,
        })
    }

    async fn stream(&self, request: LlmRequest) -> Result<CompletionStream> {
        let text = self.reply(request)?;
        Ok(Box::pin(stream::iter(vec![Ok(text)])))
    }

    fn provider_name(&self) -> &str {
        "recording"
    }
}

fn runtime(dir: &std::path::Path, client: Arc<RecordingClient>) -> AgentRuntime {
    AgentRuntime::new(
        Arc::new(AgentRegistry::new(Arc::new(TomlConfigStore::new(dir)))),
        Arc::new(CompletionGateway::new(client)),
    )
}

// ============================================================================
// Config store integration
// ============================================================================

#[tokio::test]
async fn admin_edit_applies_on_next_call() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(RecordingClient::new(&["first", "second"]));
    let agent = ToneAgent::new(runtime(dir.path(), client.clone()));
    let request = ToneRequest {
        target_tone: "formal".into(),
        content: "hey".into(),
        ..Default::default()
    };

    agent.adapt(&request).await;

    let store = TomlConfigStore::new(dir.path());
    let mut config = AgentConfig::default_for(AgentKey::ToneAdapter);
    config.model = "gpt-4o-mini".into();
    config.system_prompt = "House style only.".into();
    config.updated_by = Some("editor@example.com".into());
    store.upsert(config).await.unwrap();

    agent.adapt(&request).await;

    let seen = client.seen();
    assert_eq!(seen[0].model, "gpt-4o");
    assert_eq!(seen[1].model, "gpt-4o-mini");
    assert_eq!(seen[1].system_prompt.as_deref(), Some("House style only."));
}

#[tokio::test]
async fn corrupt_config_file_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("seo.toml"), "not = [valid").unwrap();
    let client = Arc::new(RecordingClient::new(&[r#"{"score": 71}"#]));
    let agent = SeoAgent::new(runtime(dir.path(), client.clone()));

    let response = agent.analyze(&SeoAnalysisRequest::default()).await;
    assert!(response.success);
    assert_eq!(client.seen()[0].max_tokens, Some(2000));
}

// ============================================================================
// Disabled agents
// ============================================================================

#[tokio::test]
async fn every_disabled_agent_skips_the_provider() {
    let dir = tempfile::tempdir().unwrap();
    let store = TomlConfigStore::new(dir.path());
    for key in AgentKey::ALL {
        let mut config = AgentConfig::default_for(key);
        config.enabled = false;
        store.upsert(config).await.unwrap();
    }

    let client = Arc::new(RecordingClient::new(&[]));
    let rt = runtime(dir.path(), client.clone());

    let responses = vec![
        ContentAgent::new(rt.clone())
            .generate(&ContentRequest::default())
            .await,
        WriterStyleAgent::new(rt.clone())
            .analyze(&WriterStyleRequest::default())
            .await,
        SeoAgent::new(rt.clone())
            .analyze(&SeoAnalysisRequest::default())
            .await,
        QualityAgent::new(rt.clone())
            .check(&QualityCheckRequest::default())
            .await,
        ToneAgent::new(rt.clone()).adapt(&ToneRequest::default()).await,
        WorkflowAgent::new(rt.clone())
            .transform(&WorkflowRequest::default())
            .await,
        VisualExtractionAgent::new(rt.clone())
            .extract(&VisualExtractionRequest::default())
            .await,
        FactCheckAgent::new(rt.clone()).run(&[], "topic").await,
    ];

    for response in &responses {
        assert!(!response.success);
        assert!(
            response
                .error
                .as_deref()
                .unwrap()
                .ends_with("is currently disabled")
        );
    }
    assert!(
        ContentAgent::new(rt.clone())
            .generate_stream(&ContentRequest::default())
            .await
            .is_err()
    );
    assert!(client.seen().is_empty());
}

// ============================================================================
// Fail-safe helpers
// ============================================================================

#[tokio::test]
async fn disabled_fact_checker_yields_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AgentConfig::default_for(AgentKey::FactChecker);
    config.enabled = false;
    TomlConfigStore::new(dir.path()).upsert(config).await.unwrap();

    let client = Arc::new(RecordingClient::new(&[]));
    let article = ResearchArticle {
        id: "a1".into(),
        title: "Ravens clinch".into(),
        description: String::new(),
        source: "espn.com".into(),
        url: "https://espn.com/a1".into(),
        published_date: None,
        relevance_score: 90.0,
        trust_score: 90,
        is_flagged: false,
    };
    let result = FactCheckAgent::new(runtime(dir.path(), client))
        .verify(&[article], "Ravens")
        .await;
    assert_eq!(result.confidence_score, 0.0);
    assert!(result.verified_facts.is_empty());
}
