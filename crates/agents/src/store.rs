//! Persisted agent configuration stores.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quill_common::{QuillError, Result};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{AgentConfig, AgentKey, strip_nulls};

/// One row per agent key. Writes are administrator-driven.
#[async_trait]
pub trait AgentConfigStore: Send + Sync {
    async fn fetch(&self, key: AgentKey) -> Result<Option<AgentConfig>>;

    async fn upsert(&self, config: AgentConfig) -> Result<()>;
}

/// In-process store for tests and embedded use.
#[derive(Default)]
pub struct MemoryConfigStore {
    configs: RwLock<HashMap<AgentKey, AgentConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentConfigStore for MemoryConfigStore {
    async fn fetch(&self, key: AgentKey) -> Result<Option<AgentConfig>> {
        Ok(self.configs.read().await.get(&key).cloned())
    }

    async fn upsert(&self, config: AgentConfig) -> Result<()> {
        self.configs.write().await.insert(config.agent_key, config);
        Ok(())
    }
}

/// One `<agent_key>.toml` file per key. Files are re-read on every fetch so
/// edits apply to the next invocation.
pub struct TomlConfigStore {
    dir: PathBuf,
}

impl TomlConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: AgentKey) -> PathBuf {
        self.dir.join(format!("{}.toml", key.as_str()))
    }
}

#[async_trait]
impl AgentConfigStore for TomlConfigStore {
    async fn fetch(&self, key: AgentKey) -> Result<Option<AgentConfig>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let config: AgentConfig = toml::from_str(&content).map_err(|e| {
            QuillError::Storage(format!("Invalid agent config {}: {e}", path.display()))
        })?;
        debug!(agent = %key, path = %path.display(), "Loaded agent config");
        Ok(Some(config))
    }

    async fn upsert(&self, mut config: AgentConfig) -> Result<()> {
        strip_nulls(&mut config.special_config);
        tokio::fs::create_dir_all(&self.dir).await?;
        let content = toml::to_string_pretty(&config)
            .map_err(|e| QuillError::Storage(format!("Failed to encode agent config: {e}")))?;
        tokio::fs::write(self.path_for(config.agent_key), content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_upsert_then_fetch() {
        let store = MemoryConfigStore::new();
        assert!(store.fetch(AgentKey::Seo).await.unwrap().is_none());

        let mut config = AgentConfig::default_for(AgentKey::Seo);
        config.model = "gpt-4o-mini".into();
        store.upsert(config).await.unwrap();

        let fetched = store.fetch(AgentKey::Seo).await.unwrap().unwrap();
        assert_eq!(fetched.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn toml_store_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path());
        assert!(store.fetch(AgentKey::Workflow).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn toml_store_rereads_on_every_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("agents"));

        let mut config = AgentConfig::default_for(AgentKey::ToneAdapter);
        config.temperature = 0.9;
        store.upsert(config.clone()).await.unwrap();
        assert_eq!(
            store.fetch(AgentKey::ToneAdapter).await.unwrap().unwrap().temperature,
            0.9
        );

        config.enabled = false;
        store.upsert(config).await.unwrap();
        assert!(!store.fetch(AgentKey::ToneAdapter).await.unwrap().unwrap().enabled);
    }

    #[tokio::test]
    async fn toml_store_drops_null_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path());

        let mut config = AgentConfig::default_for(AgentKey::VisualExtraction);
        config
            .special_config
            .insert("fallbackModel".into(), serde_json::Value::Null);
        config.special_config.insert(
            "retry".into(),
            serde_json::json!({ "delayMs": null, "attempts": 2 }),
        );
        store.upsert(config).await.unwrap();

        let fetched = store
            .fetch(AgentKey::VisualExtraction)
            .await
            .unwrap()
            .unwrap();
        assert!(!fetched.special_config.contains_key("fallbackModel"));
        assert_eq!(
            fetched.special_config.get("retry"),
            Some(&serde_json::json!({ "attempts": 2 }))
        );
        assert_eq!(fetched.special_f64("confidenceThreshold"), Some(0.7));
    }

    #[tokio::test]
    async fn toml_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("seo.toml"), "agent_key = [").unwrap();
        let store = TomlConfigStore::new(dir.path());
        let err = store.fetch(AgentKey::Seo).await.unwrap_err();
        assert!(matches!(err, QuillError::Storage(_)));
    }
}
