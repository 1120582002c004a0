//! The search index seam.
//!
//! The core never talks HTTP itself: it builds an [`IndexQuery`], hands it to
//! a [`SearchIndex`], and gets a [`RawSearchResponse`] back. Both types use
//! the Meilisearch wire names so the HTTP adapter can pass them through
//! untouched.

use crate::config::{HighlightConfig, SearchConfig};
use crate::error::IndexError;
use crate::types::{FacetDistribution, SearchRequest};
use serde::{Deserialize, Serialize};

/// A full-text / faceted search service.
#[async_trait::async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, query: &IndexQuery) -> Result<RawSearchResponse, IndexError>;
}

/// Outbound search call. Optional members are omitted from the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuery {
    pub q: String,
    pub limit: usize,
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_highlight: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_pre_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_post_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes_to_crop: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_length: Option<usize>,
}

impl IndexQuery {
    /// Build the index call for one request. Highlight and crop directives
    /// are attached only when the request asks for highlighting; filter and
    /// sort only when non-empty.
    pub fn build(request: &SearchRequest, search: &SearchConfig, highlight: &HighlightConfig) -> Self {
        let mut query = Self {
            q: request.term.clone(),
            limit: request.limit,
            offset: request.offset,
            filter: request.filter.clone(),
            sort: (!request.sort.is_empty()).then(|| request.sort.clone()),
            facets: (!search.facets.is_empty()).then(|| search.facets.clone()),
            ..Self::default()
        };

        if request.highlighting {
            query.attributes_to_highlight = Some(highlight.attributes.clone());
            query.highlight_pre_tag = Some(highlight.pre_tag.clone());
            query.highlight_post_tag = Some(highlight.post_tag.clone());
            if !highlight.crop_attributes.is_empty() {
                query.attributes_to_crop = Some(highlight.crop_attributes.clone());
                query.crop_length = Some(highlight.crop_length);
            }
        }

        query
    }

    pub fn highlighting(&self) -> bool {
        self.attributes_to_highlight.is_some()
    }
}

/// Raw index answer. Unknown members are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchResponse {
    #[serde(default)]
    pub hits: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_total_hits: Option<u64>,
    /// Exhaustive count, sent instead of the estimate for page-based queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hits: Option<u64>,
    #[serde(default)]
    pub processing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_distribution: Option<FacetDistribution>,
}

impl RawSearchResponse {
    pub fn total(&self) -> usize {
        self.estimated_total_hits
            .or(self.total_hits)
            .map(|n| n as usize)
            .unwrap_or(self.hits.len())
    }
}
