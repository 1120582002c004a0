//! Error taxonomy for the search layers.

use std::time::Duration;

/// Failure reported by a [`SearchIndex`](crate::index::SearchIndex)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("search index unreachable: {0}")]
    Unreachable(String),

    #[error("search index did not answer within {0:?}")]
    Timeout(Duration),

    #[error("search index returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed search index response: {0}")]
    Decode(String),

    #[error("not supported by this index: {0}")]
    Unsupported(String),
}

/// Errors surfaced by the executor and the facade.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Rejected before any index call was made.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The index could not serve a single-term search. Retryable.
    #[error("search index unavailable while searching {term:?}: {source}")]
    IndexUnavailable {
        term: String,
        #[source]
        source: IndexError,
    },

    /// One term of a multi-term search failed. Recovered by the aggregator
    /// and only ever surfaced through `TermOutcome::error`.
    #[error("search for term {term:?} failed: {reason}")]
    TermSearchFailed { term: String, reason: String },
}

impl SearchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::IndexUnavailable { .. })
    }
}
