//! Core types shared by every search layer.
//!
//! Requests flow in as [`SearchOptions`] (caller-facing, unvalidated) and are
//! narrowed to [`SearchRequest`] (one term, validated window) before they reach
//! the executor. Results flow back out as [`SearchResult`], wrapped by the
//! facade in a [`SearchResponse`] envelope.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Facet name → facet value → number of matching documents.
pub type FacetDistribution = BTreeMap<String, BTreeMap<String, u64>>;

// ---------------------------------------------------------------------------
// Inbound options
// ---------------------------------------------------------------------------

/// Caller-supplied search options, as received from the HTTP layer.
///
/// `limit` and `offset` are signed on purpose: they are validated by the
/// facade and rejected with [`SearchError::InvalidRequest`](crate::SearchError)
/// before any index call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub limit: i64,
    pub offset: i64,
    pub filter: Option<String>,
    pub sort: Vec<String>,
    pub highlighting: bool,
    /// Run the query through the understanding component first.
    pub use_expansion: bool,
    /// Overall budget for the call. Terms still running when it elapses are
    /// reported as failed and the response is flagged `partial`.
    #[serde(skip)]
    pub deadline: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            filter: None,
            sort: Vec::new(),
            highlighting: false,
            use_expansion: false,
            deadline: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SearchRequest
// ---------------------------------------------------------------------------

/// One validated single-term request against the search index.
///
/// Invariant: `limit > 0`. An empty `term` means "match everything" and is
/// passed through to the index unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
    pub limit: usize,
    pub offset: usize,
    pub filter: Option<String>,
    pub sort: Vec<String>,
    pub highlighting: bool,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>, limit: usize, offset: usize) -> Self {
        Self {
            term: term.into(),
            limit,
            offset,
            filter: None,
            sort: Vec::new(),
            highlighting: false,
        }
    }

    pub fn filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.trim().is_empty());
        self
    }

    pub fn sort(mut self, sort: Vec<String>) -> Self {
        self.sort = sort.into_iter().filter(|s| !s.trim().is_empty()).collect();
        self
    }

    pub fn highlighting(mut self, highlighting: bool) -> Self {
        self.highlighting = highlighting;
        self
    }

    /// Same filter, sort and highlighting, different term and window.
    pub fn for_term(&self, term: impl Into<String>, limit: usize, offset: usize) -> Self {
        Self {
            term: term.into(),
            limit,
            offset,
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            highlighting: self.highlighting,
        }
    }
}

// ---------------------------------------------------------------------------
// Hits and results
// ---------------------------------------------------------------------------

/// A single document returned by the search index.
///
/// `fields` is the document exactly as the index returned it (including the
/// primary key). `matched_terms` and `term_relevance` are only populated by
/// the multi-term aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "_matchedTerms", skip_serializing_if = "BTreeSet::is_empty")]
    pub matched_terms: BTreeSet<String>,
    #[serde(rename = "_termRelevance", skip_serializing_if = "is_zero")]
    pub term_relevance: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Hit {
    pub fn new(id: impl Into<String>, fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            matched_terms: BTreeSet::new(),
            term_relevance: 0,
        }
    }
}

/// What happened to one term of a multi-term search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermOutcome {
    pub term: String,
    #[serde(skip_serializing)]
    pub hits: Vec<Hit>,
    /// Total matches the index reported for this term (not just the
    /// candidates fetched).
    pub hit_count: usize,
    pub failed: bool,
    pub from_cache: bool,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TermOutcome {
    pub fn succeeded(term: impl Into<String>, result: SearchResult) -> Self {
        Self {
            term: term.into(),
            hit_count: result.total_hits,
            hits: result.hits,
            failed: false,
            from_cache: result.from_cache,
            processing_time_ms: result.processing_time_ms,
            error: None,
        }
    }

    pub fn failed(term: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            hits: Vec::new(),
            hit_count: 0,
            failed: true,
            from_cache: false,
            processing_time_ms: 0,
            error: Some(error.into()),
        }
    }
}

/// A normalised, paginated result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub hits: Vec<Hit>,
    pub total_hits: usize,
    pub limit: usize,
    pub offset: usize,
    pub processing_time_ms: u64,
    pub facet_distribution: FacetDistribution,
    pub multi_term: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_outcomes: Option<Vec<TermOutcome>>,
    pub from_cache: bool,
    /// The caller's deadline elapsed before every term finished.
    pub partial: bool,
    /// Multi-term search where every term failed.
    pub all_failed: bool,
}

impl SearchResult {
    pub fn empty(limit: usize, offset: usize) -> Self {
        Self {
            hits: Vec::new(),
            total_hits: 0,
            limit,
            offset,
            processing_time_ms: 0,
            facet_distribution: FacetDistribution::new(),
            multi_term: false,
            term_outcomes: None,
            from_cache: false,
            partial: false,
            all_failed: false,
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number derived from `offset / limit`.
    pub page: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl Pagination {
    pub fn of(result: &SearchResult) -> Self {
        let limit = result.limit.max(1);
        Self {
            page: result.offset / limit + 1,
            total_pages: result.total_hits.div_ceil(limit),
            has_more: result.offset + result.hits.len() < result.total_hits,
        }
    }
}

/// What the facade hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    /// The terms actually sent to the index.
    pub terms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(flatten)]
    pub result: SearchResult,
    pub pagination: Pagination,
    /// Wall clock for the whole facade call.
    pub elapsed_ms: u64,
}
