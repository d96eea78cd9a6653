//! Visual extraction agent with a two-tier fallback chain.
//!
//! The primary vision completion runs first. When its structured answer
//! reports a confidence under the configured threshold, the same
//! instructions are re-issued to the secondary provider.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quill_common::{AgentMessage, ContentPart};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{AgentConfig, AgentKey};
use crate::gateway::{AgentResponse, AgentRuntime, CompletionGateway};
use crate::prompts::PromptBuilder;

const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualExtractionRequest {
    /// Base64-encoded image bytes.
    pub image_base64: String,
    pub media_type: String,
    /// e.g. "table", "chart", "box_score".
    pub extraction_type: String,
    #[serde(default)]
    pub expected_fields: Vec<String>,
}

impl VisualExtractionRequest {
    pub fn from_bytes(
        bytes: &[u8],
        media_type: impl Into<String>,
        extraction_type: impl Into<String>,
        expected_fields: Vec<String>,
    ) -> Self {
        Self {
            image_base64: STANDARD.encode(bytes),
            media_type: media_type.into(),
            extraction_type: extraction_type.into(),
            expected_fields,
        }
    }
}

/// Structured answer expected from either vision provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VisionPayload {
    pub data: Value,
    pub confidence: Option<f64>,
    #[serde(alias = "dataType")]
    pub data_type: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackTrigger {
    #[default]
    LowConfidence,
    DenseText,
    Both,
}

impl FallbackTrigger {
    pub fn parse(value: &str) -> Self {
        match value {
            "denseText" | "dense_text" => FallbackTrigger::DenseText,
            "both" => FallbackTrigger::Both,
            _ => FallbackTrigger::LowConfidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    pub enabled: bool,
    pub trigger: FallbackTrigger,
    pub threshold: f64,
    pub model: Option<String>,
}

impl FallbackPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            enabled: config.special_bool("fallbackEnabled").unwrap_or(false),
            trigger: config
                .special_str("fallbackTrigger")
                .map(FallbackTrigger::parse)
                .unwrap_or_default(),
            threshold: config
                .special_f64("confidenceThreshold")
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            model: config.special_str("fallbackModel").map(str::to_string),
        }
    }

    /// A missing confidence counts as zero.
    pub fn should_fallback(&self, payload: &VisionPayload) -> bool {
        if !self.enabled {
            return false;
        }
        let confidence = payload.confidence.unwrap_or(0.0);
        // All three triggers share the confidence gate; dataType is not consulted.
        match self.trigger {
            FallbackTrigger::LowConfidence | FallbackTrigger::DenseText | FallbackTrigger::Both => {
                confidence < self.threshold
            }
        }
    }
}

pub struct VisualExtractionAgent {
    runtime: AgentRuntime,
    fallback: Option<Arc<CompletionGateway>>,
}

impl VisualExtractionAgent {
    pub const KEY: AgentKey = AgentKey::VisualExtraction;

    pub fn new(runtime: AgentRuntime) -> Self {
        Self {
            runtime,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, gateway: Arc<CompletionGateway>) -> Self {
        self.fallback = Some(gateway);
        self
    }

    pub fn build_message(request: &VisualExtractionRequest) -> AgentMessage {
        let instructions = PromptBuilder::new()
            .field("Extraction type", &request.extraction_type)
            .list("Expected fields", &request.expected_fields)
            .text("Extract the data visible in the attached image.")
            .build();

        AgentMessage::user_parts(vec![
            ContentPart::Text { text: instructions },
            ContentPart::Image {
                media_type: request.media_type.clone(),
                data: request.image_base64.clone(),
            },
        ])
    }

    pub async fn extract(&self, request: &VisualExtractionRequest) -> AgentResponse {
        let config = self.runtime.config(Self::KEY).await;
        if !config.enabled {
            return AgentResponse::disabled(&config);
        }

        let message = Self::build_message(request);
        let primary = self
            .runtime
            .gateway()
            .run(&config, vec![message.clone()])
            .await
            .with_structured_data();

        if !primary.success {
            return primary;
        }
        let Some(payload) = primary.parse_data::<VisionPayload>() else {
            debug!(agent = %Self::KEY, "Primary answer not structured, skipping fallback check");
            return primary;
        };

        let policy = FallbackPolicy::from_config(&config);
        if !policy.should_fallback(&payload) {
            return primary;
        }
        let Some(fallback) = &self.fallback else {
            warn!(
                agent = %Self::KEY,
                confidence = ?payload.confidence,
                "Fallback wanted but no secondary vision provider is configured"
            );
            return primary;
        };

        info!(
            agent = %Self::KEY,
            confidence = ?payload.confidence,
            threshold = policy.threshold,
            provider = fallback.provider_name(),
            "Low confidence extraction, using fallback provider"
        );

        let mut fallback_config = config.clone();
        if let Some(model) = policy.model {
            fallback_config.model = model;
        }

        let mut secondary = fallback
            .run(&fallback_config, vec![message])
            .await
            .with_structured_data();
        if secondary.success {
            secondary.metadata.used_fallback = true;
            return secondary;
        }

        warn!(agent = %Self::KEY, error = ?secondary.error, "Fallback extraction failed");
        AgentResponse {
            success: false,
            error: Some(format!(
                "Fallback extraction failed: {}",
                secondary.error.unwrap_or_default()
            )),
            ..primary
        }
    }
}
