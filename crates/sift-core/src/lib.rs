//! sift-core: multi-term search aggregation over a faceted search index.
//!
//! This crate exposes the search layers as public modules, plus the shared
//! types used across all of them.
//!
//! # Architecture
//!
//! ```text
//!                        ┌──► TermExecutor ──► ResultCache
//! caller ──► SearchFacade│                  └─► SearchIndex
//!                        └──► MultiTermAggregator ──► N × TermExecutor (concurrent)
//! ```
//!
//! The search index and the query-understanding component are external and
//! reached through the [`SearchIndex`] and [`QueryUnderstanding`] traits.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod facade;
pub mod index;
pub mod types;
pub mod understanding;

pub use cache::ResultCache;
pub use config::Config;
pub use error::{IndexError, SearchError};
pub use facade::SearchFacade;
pub use index::{IndexQuery, RawSearchResponse, SearchIndex};
pub use types::{
    FacetDistribution, Hit, Pagination, SearchOptions, SearchRequest, SearchResponse, SearchResult,
    TermOutcome,
};
pub use understanding::{ExpandedQuery, QueryUnderstanding, Understanding, Vocabulary};
