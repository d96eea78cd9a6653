//! HTTP API for the Quill agents.
//!
//! # Endpoints
//!
//! ## Research
//! - `POST /api/v1/research` - Run the research pipeline
//! - `GET /api/v1/research/{id}` - Fetch a saved run
//! - `PUT /api/v1/research/{id}/selection` - Save the chosen stories and keywords
//!
//! ## Content
//! - `POST /api/v1/content/generate` - Generate an article
//! - `POST /api/v1/content/stream` - Generate an article as Server-Sent Events
//!
//! ## Agents
//! - `POST /api/v1/agents/writer-style`
//! - `POST /api/v1/agents/seo/analyze`, `POST /api/v1/agents/seo/keywords`
//! - `POST /api/v1/agents/quality`, `POST /api/v1/agents/quality/grammar`
//! - `POST /api/v1/agents/tone`
//! - `POST /api/v1/agents/workflow`
//! - `POST /api/v1/agents/visual`
//! - `POST /api/v1/agents/fact-check`
//! - `GET|PUT /api/v1/agents/{key}/config` - Read or edit an agent's configuration
//!
//! Every route except `GET /health` requires `Authorization: Bearer <key>`
//! when `QUILL_API_KEY` is set.

pub mod auth;
pub mod config;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    routing::{get, post, put},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use auth::ApiKeyConfig;
pub use config::QuillConfig;
pub use state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(routes::health))
        // Research
        .route("/api/v1/research", post(routes::run_research))
        .route("/api/v1/research/{id}", get(routes::get_research))
        .route(
            "/api/v1/research/{id}/selection",
            put(routes::update_selection),
        )
        // Content
        .route("/api/v1/content/generate", post(routes::generate_content))
        .route("/api/v1/content/stream", post(routes::stream_content))
        // Agents
        .route("/api/v1/agents/writer-style", post(routes::writer_style))
        .route("/api/v1/agents/seo/analyze", post(routes::seo_analyze))
        .route("/api/v1/agents/seo/keywords", post(routes::seo_keywords))
        .route("/api/v1/agents/quality", post(routes::quality_check))
        .route("/api/v1/agents/quality/grammar", post(routes::quality_grammar))
        .route("/api/v1/agents/tone", post(routes::tone))
        .route("/api/v1/agents/workflow", post(routes::workflow))
        .route("/api/v1/agents/visual", post(routes::visual))
        .route("/api/v1/agents/fact-check", post(routes::fact_check))
        .route(
            "/api/v1/agents/{key}/config",
            get(routes::get_agent_config).put(routes::update_agent_config),
        );

    if let Some(api_key) = state.api_key.clone() {
        router = router.layer(middleware::from_fn(move |request: Request, next: Next| {
            auth::api_key_auth(api_key.clone(), request, next)
        }));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.cors_origins))
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state);

    info!(%addr, "Starting Quill API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
