//! Source-trust weighting map.

use std::collections::HashMap;

use async_trait::async_trait;
use quill_common::Result;

/// Domain to trust weight (0-100).
pub type TrustMap = HashMap<String, u32>;

pub const DEFAULT_TRUST_SCORE: u32 = 50;
pub const FLAG_BELOW_TRUST: u32 = 30;

/// Loaded once per pipeline run.
#[async_trait]
pub trait TrustSourceProvider: Send + Sync {
    async fn load(&self) -> Result<TrustMap>;
}

/// Fixed map, typically from the `[trusted_sources]` config table.
#[derive(Debug, Clone, Default)]
pub struct StaticTrustSources {
    map: TrustMap,
}

impl StaticTrustSources {
    pub fn new(map: TrustMap) -> Self {
        let map = map
            .into_iter()
            .map(|(domain, weight)| (normalize_host(&domain), weight.min(100)))
            .collect();
        Self { map }
    }
}

#[async_trait]
impl TrustSourceProvider for StaticTrustSources {
    async fn load(&self) -> Result<TrustMap> {
        Ok(self.map.clone())
    }
}

pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// Weight for a host; subdomains inherit their parent domain's weight.
pub fn trust_for(host: &str, map: &TrustMap) -> u32 {
    let host = normalize_host(host);
    let mut candidate = host.as_str();
    loop {
        if let Some(weight) = map.get(candidate) {
            return *weight;
        }
        match candidate.split_once('.') {
            Some((_, parent)) if parent.contains('.') => candidate = parent,
            _ => return DEFAULT_TRUST_SCORE,
        }
    }
}

/// Provider relevance (0-1) scaled to 0-100 and biased by source trust.
///
/// Full trust keeps the provider score; zero trust halves it.
pub fn trust_weighted_relevance(provider_score: f64, trust: u32) -> f64 {
    let factor = 0.5 + f64::from(trust.min(100)) / 200.0;
    (provider_score * 100.0 * factor).clamp(0.0, 100.0)
}
