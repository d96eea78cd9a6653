//! Server configuration.
//!
//! # Security
//!
//! - Config file permission validation on Unix systems
//! - Rejects world-readable files containing API keys
//! - Warns about API keys stored in config files

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quill_llm::ProviderConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level `quill.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion provider every agent runs on.
    #[serde(default = "default_primary")]
    pub primary: ProviderConfig,

    /// Secondary provider for low-confidence visual extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_vision: Option<ProviderConfig>,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub grammar: GrammarConfig,

    #[serde(default)]
    pub agents: AgentsConfig,

    /// Domain to trust weight (0-100) applied to retrieved articles.
    #[serde(default)]
    pub trusted_sources: HashMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_primary() -> ProviderConfig {
    ProviderConfig::new("openai")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Falls back to `TAVILY_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl RetrievalConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("TAVILY_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            language: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Directory of per-agent TOML overrides. In-memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            primary: default_primary(),
            fallback_vision: None,
            retrieval: RetrievalConfig::default(),
            grammar: GrammarConfig::default(),
            agents: AgentsConfig::default(),
            trusted_sources: HashMap::new(),
        }
    }
}

impl QuillConfig {
    /// Load configuration from a TOML file.
    ///
    /// On Unix the file must be a regular file, must not be world-writable,
    /// and must not be world-readable when it holds an API key.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_config_file_permissions(path)?;

        let config = Self::from_file_unchecked(path)?;

        let keyed_sections: Vec<&str> = [
            ("primary", config.primary.api_key.is_some()),
            (
                "fallback_vision",
                config
                    .fallback_vision
                    .as_ref()
                    .is_some_and(|p| p.api_key.is_some()),
            ),
            ("retrieval", config.retrieval.api_key.is_some()),
        ]
        .into_iter()
        .filter_map(|(section, has_key)| has_key.then_some(section))
        .collect();

        if !keyed_sections.is_empty() {
            warn!(
                sections = ?keyed_sections,
                "API key found in config file '{}'. For better security, use environment \
                 variables instead (OPENAI_API_KEY, ANTHROPIC_API_KEY, TAVILY_API_KEY).",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load configuration without permission checks.
    pub fn from_file_unchecked(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Requirements:
/// - regular file (not a directory or device)
/// - not world-writable
/// - not world-readable if it looks like it holds an API key
#[cfg(unix)]
fn validate_config_file_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Directories and devices are not allowed.",
            path.display()
        );
    }

    let permission_bits = metadata.permissions().mode() & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    let content = std::fs::read_to_string(path).unwrap_or_default();
    let has_api_key = content.contains("api_key")
        && (content.contains("sk-") || content.contains("tvly-") || content.contains("key ="));

    if has_api_key && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains an API key but is world-readable (mode {:04o}). \
             Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_api_key && permission_bits & 0o040 != 0 {
        warn!(
            "Config file '{}' contains an API key and is group-readable (mode {:04o}). \
             Consider restricting access with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}
