//! Query understanding seam.
//!
//! The natural-language step that turns "warm winter jacket for women under
//! 100" into search terms and structured filters lives outside this crate.
//! This module defines what it must return ([`Understanding`]), how that is
//! folded into an [`ExpandedQuery`], and the fallback used when the component
//! is unavailable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Known catalog vocabularies offered to the understanding component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
}

/// Structured output of the understanding component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Understanding {
    pub terms: Vec<String>,
    pub category: Option<String>,
    pub gender: Option<String>,
    pub brand: Option<String>,
    pub price_range: Option<PriceRange>,
    pub intent: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// External natural-language understanding component.
#[async_trait::async_trait]
pub trait QueryUnderstanding: Send + Sync {
    async fn understand(&self, query: &str, vocabulary: &Vocabulary) -> anyhow::Result<Understanding>;
}

/// A query expanded into the terms that will each be searched.
///
/// Invariant: `terms` is non-empty and holds no duplicates (compared
/// case-insensitively after trimming).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedQuery {
    pub original_query: String,
    pub terms: Vec<String>,
    pub filter: Option<String>,
    pub intent: Option<String>,
}

impl ExpandedQuery {
    /// Used when understanding is disabled or failed: the query is the only
    /// term and no filter is added.
    pub fn fallback(query: &str) -> Self {
        Self {
            original_query: query.to_string(),
            terms: vec![query.trim().to_string()],
            filter: None,
            intent: None,
        }
    }

    pub fn from_understanding(query: &str, understanding: Understanding) -> Self {
        let mut terms = normalize_terms(&understanding.terms);
        if terms.is_empty() {
            terms.push(query.trim().to_string());
        }
        Self {
            original_query: query.to_string(),
            filter: understanding_filter(&understanding),
            intent: understanding.intent,
            terms,
        }
    }
}

/// Trim, drop blanks, and de-duplicate case-insensitively. The first
/// spelling of a term wins and order is preserved.
pub fn normalize_terms<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Render the structured filters as a filter expression, or `None` when the
/// understanding carried none.
pub fn understanding_filter(understanding: &Understanding) -> Option<String> {
    let mut clauses = Vec::new();
    for (attr, value) in [
        ("category", &understanding.category),
        ("gender", &understanding.gender),
        ("brand", &understanding.brand),
    ] {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            clauses.push(format!("{attr} = {}", quote(v)));
        }
    }
    if let Some(range) = understanding.price_range {
        if let Some(min) = range.min {
            clauses.push(format!("price >= {min}"));
        }
        if let Some(max) = range.max {
            clauses.push(format!("price <= {max}"));
        }
    }
    (!clauses.is_empty()).then(|| clauses.join(" AND "))
}

/// AND two optional filter expressions together.
pub fn and_filters(a: Option<&str>, b: Option<&str>) -> Option<String> {
    let a = a.map(str::trim).filter(|s| !s.is_empty());
    let b = b.map(str::trim).filter(|s| !s.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => Some(format!("({a}) AND ({b})")),
        (Some(x), None) | (None, Some(x)) => Some(x.to_string()),
        (None, None) => None,
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
