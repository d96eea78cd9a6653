//! Orchestrator plus optional persistence.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::orchestrator::ResearchOrchestrator;
use crate::persistence::ResearchStore;
use crate::types::{ResearchPipelineResult, ResearchRequest};

#[derive(Debug, Clone, Serialize)]
pub struct ResearchRun {
    /// Absent when no store is configured or saving failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub result: ResearchPipelineResult,
}

pub struct ResearchService {
    orchestrator: ResearchOrchestrator,
    store: Option<Arc<dyn ResearchStore>>,
}

impl ResearchService {
    pub fn new(orchestrator: ResearchOrchestrator) -> Self {
        Self {
            orchestrator,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ResearchStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn store(&self) -> Option<&Arc<dyn ResearchStore>> {
        self.store.as_ref()
    }

    /// Run the pipeline and persist the result. A save failure is logged
    /// and the result is still returned.
    pub async fn run(&self, request: &ResearchRequest) -> ResearchRun {
        let result = self.orchestrator.run(request).await;
        let Some(store) = &self.store else {
            return ResearchRun { id: None, result };
        };

        match store.save(request.project_id.clone(), result.clone()).await {
            Ok(record) => ResearchRun {
                id: Some(record.id),
                result,
            },
            Err(e) => {
                warn!(error = %e, "Failed to persist research result");
                ResearchRun { id: None, result }
            }
        }
    }
}
