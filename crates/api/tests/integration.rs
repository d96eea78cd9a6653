//! Integration tests for the API layer.
//!
//! These tests spin up a real HTTP server on a random port, backed by a
//! canned completion client and a canned web search.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream;
use quill_agents::{
    AgentRegistry, AgentRuntime, CompletionGateway, ResearchArticle, TomlConfigStore,
};
use quill_api::{ApiKeyConfig, AppState, create_router};
use quill_common::Result;
use quill_llm::{CompletionStream, LlmClient, LlmRequest, LlmResponse, TokenUsage};
use quill_research::{SearchQuery, StaticTrustSources, WebRetrieval};
use serde_json::{Value, json};

/// Answers every agent with one JSON document that satisfies all of their
/// structured contracts.
const CANNED: &str = r#"{
  "keep_ids": ["a1", "a2"],
  "verified_facts": [{"fact": "The Ravens clinched the AFC North.", "confidence": "high", "sources": ["espn.com", "nfl.com"]}],
  "disputed_facts": [],
  "confidence_score": 88,
  "sources_used": ["espn.com", "nfl.com"],
  "synopses": [{"id": "a1", "synopsis": "Baltimore locks up the division."}],
  "primary": ["ravens playoffs"],
  "secondary": ["afc north"],
  "long_tail": ["ravens wildcard schedule"],
  "done": true
}"#;

struct CannedClient {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for CannedClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LlmResponse {
            content: CANNED.to_string(),
            model: request.model,
            usage: Some(TokenUsage {
                prompt_tokens: 20,
                completion_tokens: 30,
            }),
            finish_reason: Some("stop".into()),
        })
    }

    async fn stream(&self, _request: LlmRequest) -> Result<CompletionStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let deltas = vec![Ok("Baltimore ".to_string()), Ok("heads into January.".to_string())];
        Ok(Box::pin(stream::iter(deltas)))
    }

    fn provider_name(&self) -> &str {
        "canned"
    }
}

struct CannedSearch;

#[async_trait]
impl WebRetrieval for CannedSearch {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<ResearchArticle>> {
        Ok(["a1", "a2", "a3"]
            .iter()
            .enumerate()
            .map(|(i, id)| ResearchArticle {
                id: id.to_string(),
                title: format!("Ravens report {id}"),
                description: "Baltimore's path through the AFC playoffs.".into(),
                source: "espn.com".into(),
                url: format!("https://espn.com/{id}"),
                published_date: Some("2026-01-04".into()),
                relevance_score: 90.0 - i as f64,
                trust_score: 90,
                is_flagged: false,
            })
            .collect())
    }
}

struct TestServer {
    base: String,
    client: Arc<CannedClient>,
}

async fn start_test_server(api_key: Option<&str>) -> TestServer {
    start_server_with_registry(api_key, AgentRegistry::in_memory()).await
}

async fn start_server_with_registry(api_key: Option<&str>, registry: AgentRegistry) -> TestServer {
    let client = Arc::new(CannedClient {
        calls: AtomicUsize::new(0),
    });
    let runtime = AgentRuntime::new(
        Arc::new(registry),
        Arc::new(CompletionGateway::new(client.clone())),
    );
    let trust = StaticTrustSources::new(HashMap::from([("espn.com".to_string(), 90)]));
    let mut state = AppState::new(runtime, Arc::new(CannedSearch), Arc::new(trust));
    if let Some(key) = api_key {
        state = state.with_api_key(ApiKeyConfig::new(key));
    }
    let router = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        client,
    }
}

async fn get(base: &str, path: &str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .get(format!("{base}{path}"))
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn send_json(method: reqwest::Method, base: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .request(method, format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn post_json(base: &str, path: &str, body: Value) -> (u16, Value) {
    send_json(reqwest::Method::POST, base, path, body).await
}

// ============================================================================
// Health and authentication
// ============================================================================

#[tokio::test]
async fn health_reports_provider() {
    let server = start_test_server(None).await;
    let (status, body) = get(&server.base, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["provider"], "canned");
}

#[tokio::test]
async fn api_key_required_except_for_health() {
    let server = start_test_server(Some("quill-secret")).await;
    let http = reqwest::Client::new();

    let (status, _) = get(&server.base, "/health").await;
    assert_eq!(status, 200);

    let (status, body) = get(&server.base, "/api/v1/agents/seo/config").await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], "MISSING_API_KEY");

    let resp = http
        .get(format!("{}/api/v1/agents/seo/config", server.base))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = http
        .get(format!("{}/api/v1/agents/seo/config", server.base))
        .bearer_auth("quill-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

// ============================================================================
// Agent configuration
// ============================================================================

#[tokio::test]
async fn agent_config_defaults_and_edits() {
    let server = start_test_server(None).await;

    let (status, body) = get(&server.base, "/api/v1/agents/fact_checker/config").await;
    assert_eq!(status, 200);
    assert_eq!(body["agent_key"], "fact_checker");
    assert_eq!(body["display_name"], "Fact Checker Agent");
    assert_eq!(body["enabled"], true);

    let (status, body) = send_json(
        reqwest::Method::PUT,
        &server.base,
        "/api/v1/agents/tone_adapter/config",
        json!({"enabled": false, "temperature": 3.5, "updated_by": "editor"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["enabled"], false);
    assert_eq!(body["temperature"], 1.0);

    let (_, body) = get(&server.base, "/api/v1/agents/tone_adapter/config").await;
    assert_eq!(body["updated_by"], "editor");

    let before = server.client.calls.load(Ordering::SeqCst);
    let (status, body) = post_json(
        &server.base,
        "/api/v1/agents/tone",
        json!({"target_tone": "casual", "content": "The Ravens secured the division title."}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Tone Adapter Agent is currently disabled");
    assert_eq!(server.client.calls.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn null_special_settings_persist_to_toml_store() {
    let dir = tempfile::tempdir().unwrap();
    let registry = AgentRegistry::new(Arc::new(TomlConfigStore::new(dir.path())));
    let server = start_server_with_registry(None, registry).await;

    let (_, defaults) = get(&server.base, "/api/v1/agents/visual_extraction/config").await;
    let (_, again) = get(&server.base, "/api/v1/agents/visual_extraction/config").await;
    assert_eq!(defaults["created_at"], again["created_at"]);

    let (status, body) = send_json(
        reqwest::Method::PUT,
        &server.base,
        "/api/v1/agents/visual_extraction/config",
        json!({"special_config": {"fallbackEnabled": true, "fallbackModel": null}}),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["special_config"].get("fallbackModel").is_none());
    assert_ne!(body["created_at"], defaults["created_at"]);

    let (status, stored) = get(&server.base, "/api/v1/agents/visual_extraction/config").await;
    assert_eq!(status, 200);
    assert_eq!(stored["special_config"]["fallbackEnabled"], true);
    assert!(stored["special_config"].get("fallbackModel").is_none());
    assert_eq!(stored["created_at"], body["created_at"]);
    assert!(dir.path().join("visual_extraction.toml").exists());
}

#[tokio::test]
async fn unknown_agent_key_is_not_found() {
    let server = start_test_server(None).await;
    let (status, body) = get(&server.base, "/api/v1/agents/poet/config").await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ============================================================================
// Agents
// ============================================================================

#[tokio::test]
async fn seo_keywords_return_structured_data() {
    let server = start_test_server(None).await;
    let (status, body) = post_json(
        &server.base,
        "/api/v1/agents/seo/keywords",
        json!({"topic": "Ravens playoffs"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["primary"][0], "ravens playoffs");
    assert_eq!(body["metadata"]["agent_key"], "seo");
    assert_eq!(body["metadata"]["tokens_used"], 50);
}

#[tokio::test]
async fn grammar_without_service_reports_unconfigured() {
    let server = start_test_server(None).await;
    let (status, body) = post_json(
        &server.base,
        "/api/v1/agents/quality/grammar",
        json!({"text": "Their going to the playoffs."}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Grammar service is not configured");
}

#[tokio::test]
async fn empty_required_field_is_bad_request() {
    let server = start_test_server(None).await;
    let (status, body) = post_json(&server.base, "/api/v1/agents/seo/keywords", json!({"topic": " "})).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(server.client.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Content
// ============================================================================

#[tokio::test]
async fn content_stream_emits_deltas_then_done() {
    let server = start_test_server(None).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/api/v1/content/stream", server.base))
        .json(&json!({"headline": "Ravens Playoff Analysis", "primary_keyword": "Ravens playoffs"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let body = resp.text().await.unwrap();
    assert!(body.contains("data: Baltimore "));
    assert!(body.contains("data: heads into January."));
    assert!(body.contains("event: done"));
}

#[tokio::test]
async fn content_stream_on_disabled_agent_is_conflict() {
    let server = start_test_server(None).await;
    send_json(
        reqwest::Method::PUT,
        &server.base,
        "/api/v1/agents/content_generation/config",
        json!({"enabled": false}),
    )
    .await;
    let (status, body) = post_json(
        &server.base,
        "/api/v1/content/stream",
        json!({"headline": "Ravens Playoff Analysis"}),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], "AGENT_UNAVAILABLE");
}

// ============================================================================
// Research
// ============================================================================

#[tokio::test]
async fn research_run_persists_and_accepts_selection() {
    let server = start_test_server(None).await;
    let (status, body) = post_json(
        &server.base,
        "/api/v1/research",
        json!({
            "headline": "Ravens Playoff Analysis",
            "primary_keyword": "Baltimore Ravens playoffs",
            "secondary_keywords": ["AFC North"],
            "project_id": "proj-42"
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["loops_completed"], 1);
    assert_eq!(body["stories"].as_array().unwrap().len(), 2);
    assert_eq!(body["stories"][0]["id"], "a1");
    assert_eq!(body["stories"][0]["synopsis"], "Baltimore locks up the division.");
    assert_eq!(body["stories"][0]["verification_status"], "verified");
    assert_eq!(body["research_brief"]["confidence_score"], 88.0);
    assert_eq!(body["suggested_keywords"][0]["importance"], "high");

    let id = body["id"].as_str().unwrap().to_string();
    let (status, record) = get(&server.base, &format!("/api/v1/research/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(record["project_id"], "proj-42");

    let (status, record) = send_json(
        reqwest::Method::PUT,
        &server.base,
        &format!("/api/v1/research/{id}/selection"),
        json!({"story_ids": ["a2", "nope"], "keywords": ["afc north"]}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(record["selected_story_ids"], json!(["a2"]));
    assert_eq!(record["selected_keywords"], json!(["afc north"]));
}

#[tokio::test]
async fn unknown_research_id_is_not_found() {
    let server = start_test_server(None).await;
    let (status, _) = get(
        &server.base,
        "/api/v1/research/6a2f41a3-c54c-4c8b-9b5a-1d2f3e4d5c6b",
    )
    .await;
    assert_eq!(status, 404);
}
