//! Search facade: the only entry point callers use.
//!
//! Validates options, picks the single- or multi-term path, and wraps the
//! result in a [`SearchResponse`] with pagination and wall-clock timing.
//! Safe to share across tasks behind an `Arc`.

use crate::aggregate::MultiTermAggregator;
use crate::cache::ResultCache;
use crate::config::Config;
use crate::error::SearchError;
use crate::executor::TermExecutor;
use crate::index::SearchIndex;
use crate::types::{Pagination, SearchOptions, SearchRequest, SearchResponse};
use crate::understanding::{and_filters, normalize_terms, ExpandedQuery, QueryUnderstanding, Vocabulary};
use std::sync::Arc;
use tokio::time::Instant;

pub struct SearchFacade {
    executor: Arc<TermExecutor>,
    aggregator: MultiTermAggregator,
    max_limit: usize,
}

impl SearchFacade {
    /// Build a facade with its own cache sized from `config`.
    pub fn new(index: Arc<dyn SearchIndex>, config: &Config) -> Self {
        Self::with_cache(index, Arc::new(ResultCache::from_config(&config.cache)), config)
    }

    /// Build a facade around an existing cache (shared between facades, or
    /// inspected by tests).
    pub fn with_cache(index: Arc<dyn SearchIndex>, cache: Arc<ResultCache>, config: &Config) -> Self {
        let executor = Arc::new(TermExecutor::new(index, cache, config));
        Self {
            aggregator: MultiTermAggregator::new(
                Arc::clone(&executor),
                config.search.candidate_multiplier,
            ),
            executor,
            max_limit: config.search.max_limit,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        self.executor.cache()
    }

    /// Search `query`, or the terms it was expanded into.
    ///
    /// Zero or one distinct expanded term takes the single-term path (the
    /// sole term replaces `query`); two or more are aggregated.
    pub async fn search(
        &self,
        query: &str,
        expanded_terms: &[String],
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();
        let base = self.validate(options)?;
        let deadline = options.deadline.map(|d| started + d);
        let mut terms = normalize_terms(expanded_terms);

        let result = if terms.len() >= 2 {
            tracing::debug!(query, terms = terms.len(), "facade: multi-term path");
            self.aggregator.aggregate(&terms, &base, deadline).await
        } else {
            let term = terms.pop().unwrap_or_else(|| query.trim().to_string());
            tracing::debug!(query, term = %term, "facade: single-term path");
            let result = self
                .executor
                .execute_until(&base.for_term(term.clone(), base.limit, base.offset), deadline)
                .await?;
            terms = vec![term];
            result
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            query,
            total_hits = result.total_hits,
            from_cache = result.from_cache,
            partial = result.partial,
            elapsed_ms,
            "facade: search complete"
        );

        Ok(SearchResponse {
            query: query.to_string(),
            terms,
            intent: None,
            pagination: Pagination::of(&result),
            result,
            elapsed_ms,
        })
    }

    /// Inbound path with `useExpansion`: ask the understanding component for
    /// terms and filters (falling back to the bare query if it fails), AND
    /// its filter with the caller's, then [`search`](Self::search).
    pub async fn search_with_expansion(
        &self,
        query: &str,
        understanding: &dyn QueryUnderstanding,
        vocabulary: &Vocabulary,
        options: &SearchOptions,
    ) -> Result<SearchResponse, SearchError> {
        // Reject bad windows before paying for understanding.
        self.validate(options)?;

        let expanded = if options.use_expansion {
            match understanding.understand(query, vocabulary).await {
                Ok(u) => ExpandedQuery::from_understanding(query, u),
                Err(err) => {
                    tracing::warn!(query, error = %err, "facade: understanding failed, using query as-is");
                    ExpandedQuery::fallback(query)
                }
            }
        } else {
            ExpandedQuery::fallback(query)
        };

        let options = SearchOptions {
            filter: and_filters(options.filter.as_deref(), expanded.filter.as_deref()),
            ..options.clone()
        };
        let mut response = self.search(query, &expanded.terms, &options).await?;
        response.intent = expanded.intent;
        Ok(response)
    }

    fn validate(&self, options: &SearchOptions) -> Result<SearchRequest, SearchError> {
        if options.limit <= 0 {
            return Err(SearchError::InvalidRequest(format!(
                "limit must be positive, got {}",
                options.limit
            )));
        }
        if options.offset < 0 {
            return Err(SearchError::InvalidRequest(format!(
                "offset must not be negative, got {}",
                options.offset
            )));
        }
        let limit = options.limit as usize;
        if limit > self.max_limit {
            return Err(SearchError::InvalidRequest(format!(
                "limit {limit} exceeds the maximum of {}",
                self.max_limit
            )));
        }

        Ok(SearchRequest::new(String::new(), limit, options.offset as usize)
            .filter(options.filter.clone())
            .sort(options.sort.clone())
            .highlighting(options.highlighting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::index::{IndexQuery, RawSearchResponse};
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingIndex(AtomicUsize);

    #[async_trait::async_trait]
    impl SearchIndex for CountingIndex {
        async fn search(&self, query: &IndexQuery) -> Result<RawSearchResponse, IndexError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let mut hit = serde_json::Map::new();
            hit.insert("id".into(), query.q.clone().into());
            Ok(RawSearchResponse { hits: vec![hit], estimated_total_hits: Some(1), ..Default::default() })
        }
    }

    fn facade() -> (Arc<CountingIndex>, SearchFacade) {
        let index = Arc::new(CountingIndex(AtomicUsize::new(0)));
        let facade = SearchFacade::new(index.clone(), &Config::defaults());
        (index, facade)
    }

    #[rstest]
    #[case::zero_limit(0, 0)]
    #[case::negative_limit(-5, 0)]
    #[case::negative_offset(10, -1)]
    #[case::over_max(5000, 0)]
    #[tokio::test]
    async fn invalid_windows_are_rejected_before_any_call(#[case] limit: i64, #[case] offset: i64) {
        let (index, facade) = facade();
        let opts = SearchOptions { limit, offset, ..SearchOptions::default() };
        let err = facade.search("coat", &[], &opts).await.unwrap_err();

        assert!(matches!(err, SearchError::InvalidRequest(_)));
        assert_eq!(index.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_distinct_term_takes_single_path_with_that_term() {
        let (index, facade) = facade();
        let terms = vec!["Parka".to_string(), " parka".to_string()];
        let resp = facade.search("warm coat", &terms, &SearchOptions::default()).await.unwrap();

        assert!(!resp.result.multi_term);
        assert_eq!(resp.terms, vec!["Parka".to_string()]);
        assert_eq!(resp.result.ids(), vec!["Parka"]);
        assert_eq!(index.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_terms_searches_the_query() {
        let (_, facade) = facade();
        let resp = facade.search("boots", &[], &SearchOptions::default()).await.unwrap();
        assert_eq!(resp.terms, vec!["boots".to_string()]);
        assert_eq!(resp.pagination.page, 1);
    }

    #[tokio::test]
    async fn two_terms_take_multi_path() {
        let (index, facade) = facade();
        let terms = vec!["coat".to_string(), "jacket".to_string()];
        let resp = facade.search("coat", &terms, &SearchOptions::default()).await.unwrap();

        assert!(resp.result.multi_term);
        assert!(resp.result.facet_distribution.is_empty());
        assert_eq!(resp.result.total_hits, 2);
        assert_eq!(index.0.load(Ordering::SeqCst), 2);
    }
}
