use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{AgentConfig, AgentKey};
use crate::store::{AgentConfigStore, MemoryConfigStore};

/// Resolves agent configs from the backing store, falling back to defaults.
pub struct AgentRegistry {
    store: Arc<dyn AgentConfigStore>,
}

impl AgentRegistry {
    pub fn new(store: Arc<dyn AgentConfigStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfigStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn AgentConfigStore> {
        &self.store
    }

    /// Never fails. No caching: each call re-reads the store.
    pub async fn load_agent_config(&self, key: AgentKey) -> AgentConfig {
        match self.store.fetch(key).await {
            Ok(Some(config)) => config.sanitized(key),
            Ok(None) => {
                debug!(agent = %key, "No stored config, using default");
                AgentConfig::default_for(key)
            }
            Err(e) => {
                warn!(agent = %key, error = %e, "Config store unavailable, using default");
                AgentConfig::default_for(key)
            }
        }
    }
}
