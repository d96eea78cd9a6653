//! Agent keys and per-agent behavioral parameters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use quill_common::QuillError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::prompts::default_system_prompt;

/// Identifies which specialized behavior a config or call applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKey {
    ContentGeneration,
    WriterModel,
    Seo,
    QualityAssurance,
    ToneAdapter,
    Workflow,
    VisualExtraction,
    FactChecker,
    ResearchOrchestrator,
}

impl AgentKey {
    pub const ALL: [AgentKey; 9] = [
        AgentKey::ContentGeneration,
        AgentKey::WriterModel,
        AgentKey::Seo,
        AgentKey::QualityAssurance,
        AgentKey::ToneAdapter,
        AgentKey::Workflow,
        AgentKey::VisualExtraction,
        AgentKey::FactChecker,
        AgentKey::ResearchOrchestrator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKey::ContentGeneration => "content_generation",
            AgentKey::WriterModel => "writer_model",
            AgentKey::Seo => "seo",
            AgentKey::QualityAssurance => "quality_assurance",
            AgentKey::ToneAdapter => "tone_adapter",
            AgentKey::Workflow => "workflow",
            AgentKey::VisualExtraction => "visual_extraction",
            AgentKey::FactChecker => "fact_checker",
            AgentKey::ResearchOrchestrator => "research_orchestrator",
        }
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKey {
    type Err = QuillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| QuillError::Config(format!("Unknown agent key: {s}")))
    }
}

/// Behavioral parameters for one agent.
///
/// Read fresh on every invocation. The latest persisted value wins; the
/// built-in default is used only when none is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent_key: AgentKey,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub model: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Declared capability restrictions. Surfaced and logged, not enforced.
    #[serde(default)]
    pub guardrails: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub special_config: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

const DEFAULT_MODEL: &str = "gpt-4o";

struct BuiltIn {
    display_name: &'static str,
    description: &'static str,
    temperature: f32,
    max_tokens: u32,
    guardrails: &'static [&'static str],
}

fn built_in(key: AgentKey) -> BuiltIn {
    match key {
        AgentKey::ContentGeneration => BuiltIn {
            display_name: "Content Generation Agent",
            description: "Writes long-form articles from a headline, keywords and research brief",
            temperature: 0.7,
            max_tokens: 4000,
            guardrails: &["cannot_publish", "cannot_modify_seo"],
        },
        AgentKey::WriterModel => BuiltIn {
            display_name: "Writer Model Agent",
            description: "Analyzes sample articles to capture a writer's style",
            temperature: 0.3,
            max_tokens: 2000,
            guardrails: &["analysis_only", "cannot_generate_content"],
        },
        AgentKey::Seo => BuiltIn {
            display_name: "SEO Agent",
            description: "Scores content for search optimization and suggests keywords",
            temperature: 0.3,
            max_tokens: 2000,
            guardrails: &["cannot_modify_content", "suggestions_only"],
        },
        AgentKey::QualityAssurance => BuiltIn {
            display_name: "Quality Assurance Agent",
            description: "Reviews content quality, grammar and research relevance",
            temperature: 0.2,
            max_tokens: 2000,
            guardrails: &["cannot_rewrite_content", "report_only"],
        },
        AgentKey::ToneAdapter => BuiltIn {
            display_name: "Tone Adapter Agent",
            description: "Rewrites content for a target tone and audience",
            temperature: 0.5,
            max_tokens: 3000,
            guardrails: &["preserve_facts", "preserve_keywords"],
        },
        AgentKey::Workflow => BuiltIn {
            display_name: "Workflow Agent",
            description: "Transforms finished content into platform-specific outputs",
            temperature: 0.4,
            max_tokens: 3000,
            guardrails: &["preserve_facts", "cannot_publish"],
        },
        AgentKey::VisualExtraction => BuiltIn {
            display_name: "Visual Extraction Agent",
            description: "Extracts structured data from images, charts and tables",
            temperature: 0.1,
            max_tokens: 2000,
            guardrails: &["extraction_only", "cannot_infer_missing_data"],
        },
        AgentKey::FactChecker => BuiltIn {
            display_name: "Fact Checker Agent",
            description: "Cross-references claims across sources and reports confidence",
            temperature: 0.1,
            max_tokens: 3000,
            guardrails: &["cannot_modify_content", "report_only", "cite_sources"],
        },
        AgentKey::ResearchOrchestrator => BuiltIn {
            display_name: "Research Orchestrator Agent",
            description: "Decides when research is complete and summarizes findings",
            temperature: 0.2,
            max_tokens: 1000,
            guardrails: &["cannot_generate_content", "research_only"],
        },
    }
}

fn default_special_config(key: AgentKey) -> Map<String, Value> {
    match key {
        AgentKey::VisualExtraction => match json!({
            "fallbackEnabled": true,
            "fallbackTrigger": "lowConfidence",
            "confidenceThreshold": 0.7,
            "fallbackModel": "claude-sonnet-4-20250514",
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// Drop null entries at every depth. TOML has no null, so an unset
/// setting is an absent key.
pub(crate) fn strip_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, value| !value.is_null());
    for value in map.values_mut() {
        strip_nested_nulls(value);
    }
}

fn strip_nested_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => strip_nulls(map),
        Value::Array(items) => {
            items.retain(|item| !item.is_null());
            items.iter_mut().for_each(strip_nested_nulls);
        }
        _ => {}
    }
}

impl AgentConfig {
    /// Built-in parameters merged with the default instruction template.
    ///
    /// Timestamps sit at the Unix epoch until the config is first persisted.
    pub fn default_for(key: AgentKey) -> Self {
        let defaults = built_in(key);
        let now = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            agent_key: key,
            display_name: defaults.display_name.to_string(),
            description: defaults.description.to_string(),
            system_prompt: default_system_prompt(key).to_string(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            model: DEFAULT_MODEL.to_string(),
            enabled: true,
            guardrails: defaults.guardrails.iter().map(|g| g.to_string()).collect(),
            updated_by: None,
            created_at: now,
            updated_at: now,
            special_config: default_special_config(key),
        }
    }

    /// Bring a persisted config back inside the documented ranges.
    pub fn sanitized(mut self, key: AgentKey) -> Self {
        let defaults = built_in(key);
        self.agent_key = key;

        if !self.temperature.is_finite() {
            self.temperature = defaults.temperature;
        }
        self.temperature = self.temperature.clamp(0.0, 1.0);

        if self.max_tokens == 0 {
            self.max_tokens = defaults.max_tokens;
        }
        if self.model.trim().is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        if self.display_name.trim().is_empty() {
            self.display_name = defaults.display_name.to_string();
        }
        if self.system_prompt.trim().is_empty() {
            self.system_prompt = default_system_prompt(key).to_string();
        }

        let mut seen = Vec::with_capacity(self.guardrails.len());
        self.guardrails.retain(|tag| {
            if seen.contains(tag) {
                false
            } else {
                seen.push(tag.clone());
                true
            }
        });

        strip_nulls(&mut self.special_config);

        self
    }

    pub fn special_str(&self, name: &str) -> Option<&str> {
        self.special_config.get(name).and_then(Value::as_str)
    }

    pub fn special_f64(&self, name: &str) -> Option<f64> {
        self.special_config.get(name).and_then(Value::as_f64)
    }

    pub fn special_bool(&self, name: &str) -> Option<bool> {
        self.special_config.get(name).and_then(Value::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_key_wire_format() {
        assert_eq!(
            serde_json::to_string(&AgentKey::QualityAssurance).unwrap(),
            "\"quality_assurance\""
        );
        for key in AgentKey::ALL {
            assert_eq!(key.as_str().parse::<AgentKey>().unwrap(), key);
        }
        assert!("editor".parse::<AgentKey>().is_err());
    }

    #[test]
    fn defaults_are_usable_for_every_key() {
        for key in AgentKey::ALL {
            let config = AgentConfig::default_for(key);
            assert_eq!(config.agent_key, key);
            assert!(config.enabled);
            assert!(config.max_tokens > 0);
            assert!((0.0..=1.0).contains(&config.temperature));
            assert!(!config.system_prompt.is_empty());
            assert!(!config.display_name.is_empty());
        }
    }

    #[test]
    fn visual_defaults_carry_fallback_settings() {
        let config = AgentConfig::default_for(AgentKey::VisualExtraction);
        assert_eq!(config.special_bool("fallbackEnabled"), Some(true));
        assert_eq!(config.special_str("fallbackTrigger"), Some("lowConfidence"));
        assert_eq!(config.special_f64("confidenceThreshold"), Some(0.7));
        assert!(
            AgentConfig::default_for(AgentKey::Seo)
                .special_config
                .is_empty()
        );
    }

    #[test]
    fn sanitize_clamps_and_fills() {
        let mut config = AgentConfig::default_for(AgentKey::Seo);
        config.temperature = 1.8;
        config.max_tokens = 0;
        config.system_prompt = "  ".into();
        config.guardrails = vec![
            "suggestions_only".into(),
            "cannot_modify_content".into(),
            "suggestions_only".into(),
        ];
        config.agent_key = AgentKey::Workflow;

        let clean = config.sanitized(AgentKey::Seo);
        assert_eq!(clean.agent_key, AgentKey::Seo);
        assert_eq!(clean.temperature, 1.0);
        assert_eq!(clean.max_tokens, 2000);
        assert_eq!(clean.system_prompt, default_system_prompt(AgentKey::Seo));
        assert_eq!(
            clean.guardrails,
            vec!["suggestions_only".to_string(), "cannot_modify_content".into()]
        );
    }

    #[test]
    fn default_timestamps_are_stable() {
        let first = AgentConfig::default_for(AgentKey::ToneAdapter);
        let second = AgentConfig::default_for(AgentKey::ToneAdapter);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.updated_at, second.updated_at);
        assert_eq!(first.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn sanitize_strips_null_settings_at_every_depth() {
        let mut config = AgentConfig::default_for(AgentKey::VisualExtraction);
        config.special_config.insert("fallbackModel".into(), Value::Null);
        config.special_config.insert(
            "limits".into(),
            json!({ "maxImages": 4, "cap": null, "sizes": [1, null, 3] }),
        );

        let clean = config.sanitized(AgentKey::VisualExtraction);
        assert!(!clean.special_config.contains_key("fallbackModel"));
        assert_eq!(
            clean.special_config.get("limits"),
            Some(&json!({ "maxImages": 4, "sizes": [1, 3] }))
        );
        assert_eq!(clean.special_bool("fallbackEnabled"), Some(true));
        assert!(toml::to_string(&clean).is_ok());
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = AgentConfig::default_for(AgentKey::VisualExtraction);
        let text = toml::to_string(&config).unwrap();
        let back: AgentConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.agent_key, AgentKey::VisualExtraction);
        assert_eq!(back.special_str("fallbackModel"), config.special_str("fallbackModel"));
        assert_eq!(back.guardrails, config.guardrails);
    }
}
