//! Single-term executor: one request, one index call, one normalised result.
//!
//! Non-highlighted requests go through the [`ResultCache`] first; on a miss
//! the normalised result is stored after a successful call. Every index call
//! carries a timeout (the configured per-term timeout, shortened to the
//! caller's deadline when one is given).

use crate::cache::ResultCache;
use crate::config::{Config, HighlightConfig, SearchConfig};
use crate::error::{IndexError, SearchError};
use crate::index::{IndexQuery, RawSearchResponse, SearchIndex};
use crate::types::{Hit, SearchRequest, SearchResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub struct TermExecutor {
    index: Arc<dyn SearchIndex>,
    cache: Arc<ResultCache>,
    search: SearchConfig,
    highlight: HighlightConfig,
    primary_key: String,
}

impl TermExecutor {
    pub fn new(index: Arc<dyn SearchIndex>, cache: Arc<ResultCache>, config: &Config) -> Self {
        Self {
            index,
            cache,
            search: config.search.clone(),
            highlight: config.highlight.clone(),
            primary_key: config.index.primary_key.clone(),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        self.execute_until(request, None).await
    }

    /// Run `request`, giving up at `deadline` if that comes before the
    /// per-term timeout.
    pub async fn execute_until(
        &self,
        request: &SearchRequest,
        deadline: Option<Instant>,
    ) -> Result<SearchResult, SearchError> {
        let key = ResultCache::key(request);

        if let Some(key) = key.as_deref() {
            if let Some(mut cached) = self.cache.get(key) {
                tracing::debug!(term = %request.term, "executor: cache hit");
                cached.from_cache = true;
                return Ok(cached);
            }
        }

        let budget = self.budget(deadline);
        let query = IndexQuery::build(request, &self.search, &self.highlight);
        tracing::debug!(
            term = %request.term,
            limit = request.limit,
            offset = request.offset,
            highlighting = request.highlighting,
            "executor: querying index"
        );

        let raw = match tokio::time::timeout(budget, self.index.search(&query)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(source)) => return Err(unavailable(request, source)),
            Err(_) => return Err(unavailable(request, IndexError::Timeout(budget))),
        };

        let result = normalize(raw, request, &self.primary_key);
        if let Some(key) = key {
            self.cache.set(key, result.clone());
        }
        Ok(result)
    }

    fn budget(&self, deadline: Option<Instant>) -> Duration {
        let timeout = self.search.term_timeout();
        match deadline {
            Some(d) => timeout.min(d.saturating_duration_since(Instant::now())),
            None => timeout,
        }
    }
}

fn unavailable(request: &SearchRequest, source: IndexError) -> SearchError {
    tracing::warn!(term = %request.term, error = %source, "executor: index call failed");
    SearchError::IndexUnavailable { term: request.term.clone(), source }
}

/// Map a raw index answer onto [`SearchResult`]. Hits without a usable
/// primary key are dropped.
pub fn normalize(raw: RawSearchResponse, request: &SearchRequest, primary_key: &str) -> SearchResult {
    let total_hits = raw.total();
    let hits = raw
        .hits
        .into_iter()
        .filter_map(|doc| match hit_id(&doc, primary_key) {
            Some(id) => Some(Hit::new(id, doc)),
            None => {
                tracing::warn!(primary_key, "executor: hit without usable id dropped");
                None
            }
        })
        .collect();

    SearchResult {
        hits,
        total_hits,
        limit: request.limit,
        offset: request.offset,
        processing_time_ms: raw.processing_time_ms,
        facet_distribution: raw.facet_distribution.unwrap_or_default(),
        ..SearchResult::empty(request.limit, request.offset)
    }
}

/// Render the primary key as the hit id. Numbers and strings share one id
/// space, as in the index itself: `1` and `"1"` name the same document.
fn hit_id(doc: &serde_json::Map<String, serde_json::Value>, primary_key: &str) -> Option<String> {
    match doc.get(primary_key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
