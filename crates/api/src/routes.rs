//! HTTP route handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt, stream};
use quill_agents::{
    AgentConfig, AgentConfigStore, AgentKey, AgentResponse, ContentRequest, QualityCheckRequest,
    ResearchArticle, SeoAnalysisRequest, Strictness, ToneRequest, VisualExtractionRequest,
    WorkflowRequest, WriterStyleRequest,
};
use quill_common::QuillError;
use quill_research::{ResearchRecord, ResearchRequest, ResearchRun, ResearchStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

type AppStateRef = State<Arc<AppState>>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub provider: String,
}

pub async fn health(State(state): AppStateRef) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        provider: state.runtime().gateway().provider_name().to_string(),
    })
}

/// API error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                code,
            },
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", error)
    }

    fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", error)
    }
}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        let (status, code) = match &err {
            QuillError::MissingCredential(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "MISSING_CREDENTIAL")
            }
            QuillError::Agent(_) => (StatusCode::CONFLICT, "AGENT_UNAVAILABLE"),
            QuillError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            QuillError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            QuillError::Config(_) => (StatusCode::BAD_REQUEST, "CONFIG_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

// ============================================================================
// Research
// ============================================================================

pub async fn run_research(
    State(state): AppStateRef,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ResearchRun>, ApiError> {
    require("headline", &request.headline)?;
    info!(headline = %request.headline, "Research requested");
    Ok(Json(state.research().run(&request).await))
}

pub async fn get_research(
    State(state): AppStateRef,
    Path(id): Path<Uuid>,
) -> Result<Json<ResearchRecord>, ApiError> {
    state
        .research_store()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Research {id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub story_ids: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

pub async fn update_selection(
    State(state): AppStateRef,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<ResearchRecord>, ApiError> {
    let store = state.research_store();
    if store.get(id).await?.is_none() {
        return Err(ApiError::not_found(format!("Research {id} not found")));
    }
    let record = store
        .update_selection(id, request.story_ids, request.keywords)
        .await?;
    debug!(%id, stories = record.selected_story_ids.len(), "Selection updated");
    Ok(Json(record))
}

// ============================================================================
// Content
// ============================================================================

pub async fn generate_content(
    State(state): AppStateRef,
    Json(request): Json<ContentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("headline", &request.headline)?;
    Ok(Json(state.content_agent().generate(&request).await))
}

/// Text deltas as `message` events, then one `done` event. A provider
/// failure mid-stream becomes an `error` event.
pub async fn stream_content(
    State(state): AppStateRef,
    Json(request): Json<ContentRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    require("headline", &request.headline)?;
    let deltas = state.content_agent().generate_stream(&request).await?;

    let events = deltas
        .map(|delta| {
            Ok::<_, Infallible>(match delta {
                Ok(text) => Event::default().data(text),
                Err(e) => {
                    warn!(error = %e, "Content stream failed");
                    Event::default().event("error").data(e.to_string())
                }
            })
        })
        .chain(stream::once(async {
            Ok::<_, Infallible>(Event::default().event("done").data("[DONE]"))
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// ============================================================================
// Specialized agents
// ============================================================================

pub async fn writer_style(
    State(state): AppStateRef,
    Json(request): Json<WriterStyleRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    if request.sample_articles.is_empty() {
        return Err(ApiError::bad_request("sample_articles is required"));
    }
    Ok(Json(state.writer_style_agent().analyze(&request).await))
}

pub async fn seo_analyze(
    State(state): AppStateRef,
    Json(request): Json<SeoAnalysisRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("content", &request.content)?;
    Ok(Json(state.seo_agent().analyze(&request).await))
}

#[derive(Debug, Deserialize)]
pub struct KeywordRequest {
    pub topic: String,
}

pub async fn seo_keywords(
    State(state): AppStateRef,
    Json(request): Json<KeywordRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("topic", &request.topic)?;
    Ok(Json(state.seo_agent().suggest_keywords(&request.topic).await))
}

pub async fn quality_check(
    State(state): AppStateRef,
    Json(request): Json<QualityCheckRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("content", &request.content)?;
    Ok(Json(state.quality_agent().check(&request).await))
}

#[derive(Debug, Deserialize)]
pub struct GrammarRequest {
    pub text: String,
    #[serde(default)]
    pub strictness: Strictness,
}

pub async fn quality_grammar(
    State(state): AppStateRef,
    Json(request): Json<GrammarRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("text", &request.text)?;
    Ok(Json(
        state
            .quality_agent()
            .check_grammar(&request.text, request.strictness)
            .await,
    ))
}

pub async fn tone(
    State(state): AppStateRef,
    Json(request): Json<ToneRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("content", &request.content)?;
    Ok(Json(state.tone_agent().adapt(&request).await))
}

pub async fn workflow(
    State(state): AppStateRef,
    Json(request): Json<WorkflowRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("content", &request.content)?;
    Ok(Json(state.workflow_agent().transform(&request).await))
}

pub async fn visual(
    State(state): AppStateRef,
    Json(request): Json<VisualExtractionRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    require("image_base64", &request.image_base64)?;
    require("media_type", &request.media_type)?;
    Ok(Json(state.visual_agent().extract(&request).await))
}

#[derive(Debug, Deserialize)]
pub struct FactCheckRequest {
    pub topic: String,
    pub articles: Vec<ResearchArticle>,
}

pub async fn fact_check(
    State(state): AppStateRef,
    Json(request): Json<FactCheckRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    if request.articles.is_empty() {
        return Err(ApiError::bad_request("articles is required"));
    }
    Ok(Json(
        state
            .fact_check_agent()
            .run(&request.articles, &request.topic)
            .await,
    ))
}

// ============================================================================
// Agent configuration
// ============================================================================

fn parse_key(raw: &str) -> Result<AgentKey, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("Unknown agent: {raw}")))
}

pub async fn get_agent_config(
    State(state): AppStateRef,
    Path(key): Path<String>,
) -> Result<Json<AgentConfig>, ApiError> {
    let key = parse_key(&key)?;
    Ok(Json(state.registry().load_agent_config(key).await))
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentConfigUpdate {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
    pub enabled: Option<bool>,
    pub guardrails: Option<Vec<String>>,
    pub special_config: Option<Map<String, Value>>,
    pub updated_by: Option<String>,
}

impl AgentConfigUpdate {
    pub fn apply(self, mut config: AgentConfig) -> AgentConfig {
        if let Some(v) = self.display_name {
            config.display_name = v;
        }
        if let Some(v) = self.description {
            config.description = v;
        }
        if let Some(v) = self.system_prompt {
            config.system_prompt = v;
        }
        if let Some(v) = self.temperature {
            config.temperature = v;
        }
        if let Some(v) = self.max_tokens {
            config.max_tokens = v;
        }
        if let Some(v) = self.model {
            config.model = v;
        }
        if let Some(v) = self.enabled {
            config.enabled = v;
        }
        if let Some(v) = self.guardrails {
            config.guardrails = v;
        }
        if let Some(v) = self.special_config {
            config.special_config = v;
        }
        config.updated_by = self.updated_by.or(config.updated_by);
        let now = Utc::now();
        // Unstored defaults carry the epoch; the first edit is the creation.
        if config.created_at == DateTime::<Utc>::UNIX_EPOCH {
            config.created_at = now;
        }
        config.updated_at = now;
        config
    }
}

pub async fn update_agent_config(
    State(state): AppStateRef,
    Path(key): Path<String>,
    Json(update): Json<AgentConfigUpdate>,
) -> Result<Json<AgentConfig>, ApiError> {
    let key = parse_key(&key)?;
    let registry = state.registry();
    let config = update
        .apply(registry.load_agent_config(key).await)
        .sanitized(key);
    registry.store().upsert(config.clone()).await?;
    info!(agent = %key, enabled = config.enabled, "Agent config updated");
    Ok(Json(config))
}
