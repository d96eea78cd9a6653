//! Grammar and style checking service client.

use async_trait::async_trait;
use quill_common::{QuillError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_LANGUAGETOOL_URL: &str = "https://api.languagetool.org";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    #[default]
    Standard,
    Strict,
}

impl Strictness {
    fn level(&self) -> &'static str {
        match self {
            Strictness::Standard => "default",
            Strictness::Strict => "picky",
        }
    }
}

/// One positional finding with suggested replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarMatch {
    pub message: String,
    pub offset: usize,
    pub length: usize,
    pub replacements: Vec<String>,
    pub rule_id: String,
    pub category: String,
}

#[async_trait]
pub trait GrammarChecker: Send + Sync {
    async fn check(&self, text: &str, strictness: Strictness) -> Result<Vec<GrammarMatch>>;
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Deserialize)]
struct RawMatch {
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<RawReplacement>,
    rule: Option<RawRule>,
}

#[derive(Deserialize)]
struct RawReplacement {
    value: String,
}

#[derive(Deserialize)]
struct RawRule {
    id: String,
    category: Option<RawCategory>,
}

#[derive(Deserialize)]
struct RawCategory {
    name: String,
}

impl From<RawMatch> for GrammarMatch {
    fn from(raw: RawMatch) -> Self {
        let (rule_id, category) = match raw.rule {
            Some(rule) => (rule.id, rule.category.map(|c| c.name).unwrap_or_default()),
            None => (String::new(), String::new()),
        };
        GrammarMatch {
            message: raw.message,
            offset: raw.offset,
            length: raw.length,
            replacements: raw.replacements.into_iter().map(|r| r.value).collect(),
            rule_id,
            category,
        }
    }
}

/// LanguageTool `/v2/check` client.
pub struct LanguageToolClient {
    base_url: String,
    language: String,
    http_client: reqwest::Client,
}

impl LanguageToolClient {
    pub fn new(base_url: Option<String>, language: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_LANGUAGETOOL_URL.to_string()),
            language: language.unwrap_or_else(|| "en-US".to_string()),
            http_client: reqwest::Client::new(),
        }
    }

    fn parse(body: &str) -> Result<Vec<GrammarMatch>> {
        let response: CheckResponse = serde_json::from_str(body)?;
        Ok(response.matches.into_iter().map(GrammarMatch::from).collect())
    }
}

#[async_trait]
impl GrammarChecker for LanguageToolClient {
    async fn check(&self, text: &str, strictness: Strictness) -> Result<Vec<GrammarMatch>> {
        debug!(chars = text.len(), level = strictness.level(), "Checking grammar");

        let response = self
            .http_client
            .post(format!("{}/v2/check", self.base_url.trim_end_matches('/')))
            .form(&[
                ("text", text),
                ("language", self.language.as_str()),
                ("level", strictness.level()),
            ])
            .send()
            .await
            .map_err(|e| QuillError::Provider(format!("Grammar service request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QuillError::Provider(format!("Grammar service read failed: {e}")))?;
        if !status.is_success() {
            return Err(QuillError::Provider(format!(
                "Grammar service error {status}: {body}"
            )));
        }

        Self::parse(&body)
    }
}
