//! Storage for finished research runs and the user's selections.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quill_common::{QuillError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::ResearchPipelineResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub id: Uuid,
    pub project_id: Option<String>,
    pub result: ResearchPipelineResult,
    /// Story ids the user kept; starts as the orchestrator's pre-selection.
    pub selected_story_ids: Vec<String>,
    pub selected_keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchRecord {
    pub fn new(project_id: Option<String>, result: ResearchPipelineResult) -> Self {
        let now = Utc::now();
        let selected_story_ids = result
            .stories
            .iter()
            .filter(|s| s.is_selected)
            .map(|s| s.article.id.clone())
            .collect();
        Self {
            id: Uuid::new_v4(),
            project_id,
            result,
            selected_story_ids,
            selected_keywords: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the selection. Unknown story ids are dropped.
    pub fn select(&mut self, story_ids: Vec<String>, keywords: Vec<String>) {
        let known: Vec<&str> = self
            .result
            .stories
            .iter()
            .map(|s| s.article.id.as_str())
            .collect();
        self.selected_story_ids = story_ids
            .into_iter()
            .filter(|id| known.contains(&id.as_str()))
            .collect();
        self.selected_keywords = keywords;
        self.updated_at = Utc::now();
    }
}

#[async_trait]
pub trait ResearchStore: Send + Sync {
    async fn save(
        &self,
        project_id: Option<String>,
        result: ResearchPipelineResult,
    ) -> Result<ResearchRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<ResearchRecord>>;

    /// Most recently created record for a project.
    async fn latest_for_project(&self, project_id: &str) -> Result<Option<ResearchRecord>>;

    async fn update_selection(
        &self,
        id: Uuid,
        story_ids: Vec<String>,
        keywords: Vec<String>,
    ) -> Result<ResearchRecord>;
}

#[derive(Default)]
pub struct InMemoryResearchStore {
    records: RwLock<HashMap<Uuid, ResearchRecord>>,
}

impl InMemoryResearchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResearchStore for InMemoryResearchStore {
    async fn save(
        &self,
        project_id: Option<String>,
        result: ResearchPipelineResult,
    ) -> Result<ResearchRecord> {
        let record = ResearchRecord::new(project_id, result);
        self.records.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ResearchRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn latest_for_project(&self, project_id: &str) -> Result<Option<ResearchRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.project_id.as_deref() == Some(project_id))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn update_selection(
        &self,
        id: Uuid,
        story_ids: Vec<String>,
        keywords: Vec<String>,
    ) -> Result<ResearchRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| QuillError::Storage(format!("Research record {id} not found")))?;
        record.select(story_ids, keywords);
        Ok(record.clone())
    }
}
