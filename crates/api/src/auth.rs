//! Bearer-token authentication for the API.
//!
//! The key comes from `QUILL_API_KEY`. `/health` is exempt.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::routes::ErrorResponse;

pub const API_KEY_ENV: &str = "QUILL_API_KEY";

#[derive(Debug, Clone)]
pub struct ApiKeyConfig {
    key_bytes: Vec<u8>,
}

impl ApiKeyConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key_bytes: key.into().into_bytes(),
        }
    }

    /// `None` when the variable is unset or empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .map(Self::new)
    }

    /// Constant-time comparison.
    fn verify(&self, provided: &[u8]) -> bool {
        if self.key_bytes.len() != provided.len() {
            return false;
        }
        let mut diff: u8 = 0;
        for (a, b) in self.key_bytes.iter().zip(provided.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn unauthorized(error: &str, code: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: error.into(),
            code,
        }),
    )
        .into_response()
}

pub async fn api_key_auth(config: ApiKeyConfig, request: Request<Body>, next: Next) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    match extract_bearer_token(request.headers()) {
        Some(token) if config.verify(token.as_bytes()) => next.run(request).await,
        Some(_) => {
            warn!(path = %request.uri().path(), "Invalid API key provided");
            unauthorized("Invalid API key", "INVALID_API_KEY")
        }
        None => {
            warn!(path = %request.uri().path(), "Missing Authorization header");
            unauthorized(
                "Missing or invalid Authorization header. Use: Authorization: Bearer <key>",
                "MISSING_API_KEY",
            )
        }
    }
}
