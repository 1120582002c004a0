//! Test builders: ergonomic constructors for documents, options and facades.
//!
//! These are for readability in assertions, not production use. They panic
//! on invalid input rather than returning `Result`.

use serde_json::{Map, Value};
use sift::{Config, ResultCache, SearchFacade, SearchIndex, SearchOptions};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// DocBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for index documents.
///
/// ```rust
/// let doc = DocBuilder::new(7).name("Wool Coat").field("brand", "acme").build();
/// ```
pub struct DocBuilder {
    fields: Map<String, Value>,
}

impl DocBuilder {
    pub fn new(id: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), id.into());
        Self { fields }
    }

    pub fn name(self, name: &str) -> Self {
        self.field("name", name)
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> Map<String, Value> {
        self.fields
    }
}

/// Shorthand: documents with only an id, for index scripts that just need
/// membership.
pub fn docs(ids: &[u64]) -> Vec<Map<String, Value>> {
    ids.iter().map(|&id| DocBuilder::new(id).build()).collect()
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

pub fn page(limit: i64, offset: i64) -> SearchOptions {
    SearchOptions { limit, offset, ..SearchOptions::default() }
}

pub fn with_deadline(options: SearchOptions, deadline: Duration) -> SearchOptions {
    SearchOptions { deadline: Some(deadline), ..options }
}

pub fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Facades
// ---------------------------------------------------------------------------

/// Default config with a chosen per-term timeout.
pub fn config_with_term_timeout(timeout: Duration) -> Config {
    let mut config = Config::defaults();
    config.search.term_timeout_ms = timeout.as_millis() as u64;
    config
}

/// Facade over `index` with default config, returning the shared cache too.
pub fn facade_over(index: Arc<dyn SearchIndex>) -> (SearchFacade, Arc<ResultCache>) {
    facade_with(index, &Config::defaults())
}

pub fn facade_with(index: Arc<dyn SearchIndex>, config: &Config) -> (SearchFacade, Arc<ResultCache>) {
    let cache = Arc::new(ResultCache::from_config(&config.cache));
    (SearchFacade::with_cache(index, Arc::clone(&cache), config), cache)
}
