//! In-memory search index over JSON documents.
//!
//! Good enough for offline CLI use, benchmarks and tests; not a relevance
//! engine. Matching is a case-insensitive substring test of the term against
//! every string attribute (an empty term matches everything), in document
//! order.
//!
//! # Filters
//!
//! Clauses joined with `AND`, each optionally parenthesised:
//! `attr = value`, `attr != value`, `attr > n`, `attr >= n`, `attr < n`,
//! `attr <= n`. Values may be double-quoted. `OR` is not supported and is
//! reported as [`IndexError::Unsupported`].

use serde_json::{Map, Value};
use sift_core::{FacetDistribution, IndexError, IndexQuery, RawSearchResponse, SearchIndex};
use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;

type Document = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    documents: Vec<Document>,
}

impl MemoryIndex {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Build from arbitrary JSON values; every value must be an object.
    pub fn from_values(values: Vec<Value>) -> Result<Self, IndexError> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Object(doc) => Ok(doc),
                other => Err(IndexError::Decode(format!(
                    "document {i} is not an object: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Load a JSON array of documents from `path`.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let values: Vec<Value> = serde_json::from_str(&raw)?;
        Ok(Self::from_values(values)?)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn run(&self, query: &IndexQuery) -> Result<RawSearchResponse, IndexError> {
        let started = Instant::now();
        let clauses = match query.filter.as_deref() {
            Some(expr) => parse_filter(expr)?,
            None => Vec::new(),
        };
        let sort_keys = query
            .sort
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|k| parse_sort_key(k))
            .collect::<Result<Vec<_>, _>>()?;

        let needle = query.q.trim().to_lowercase();
        let mut matched: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| needle.is_empty() || contains_text(doc, &needle))
            .filter(|doc| clauses.iter().all(|c| c.matches(doc)))
            .collect();

        if !sort_keys.is_empty() {
            matched.sort_by(|a, b| {
                sort_keys
                    .iter()
                    .map(|key| key.compare(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let facet_distribution = query
            .facets
            .as_ref()
            .map(|facets| count_facets(&matched, facets));

        let total = matched.len();
        let hits = matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|doc| {
                let mut doc = doc.clone();
                if query.highlighting() {
                    let formatted = format_document(&doc, query);
                    doc.insert("_formatted".to_string(), Value::Object(formatted));
                }
                doc
            })
            .collect();

        Ok(RawSearchResponse {
            hits,
            estimated_total_hits: Some(total as u64),
            total_hits: None,
            processing_time_ms: started.elapsed().as_millis() as u64,
            facet_distribution,
        })
    }
}

#[async_trait::async_trait]
impl SearchIndex for MemoryIndex {
    async fn search(&self, query: &IndexQuery) -> Result<RawSearchResponse, IndexError> {
        self.run(query)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

fn contains_text(doc: &Document, needle: &str) -> bool {
    doc.values().any(|v| value_contains(v, needle))
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|v| value_contains(v, needle)),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    attr: String,
    op: Op,
    value: String,
}

// Two-character operators first so `>=` is not read as `>`.
const OPERATORS: &[(&str, Op)] = &[
    (">=", Op::Ge),
    ("<=", Op::Le),
    ("!=", Op::Ne),
    ("=", Op::Eq),
    (">", Op::Gt),
    ("<", Op::Lt),
];

fn parse_filter(expr: &str) -> Result<Vec<Clause>, IndexError> {
    if expr.contains(" OR ") {
        return Err(IndexError::Unsupported(format!("OR in filter {expr:?}")));
    }
    expr.split(" AND ")
        .map(|raw| raw.trim().trim_start_matches('(').trim_end_matches(')').trim())
        .filter(|raw| !raw.is_empty())
        .map(parse_clause)
        .collect()
}

fn parse_clause(raw: &str) -> Result<Clause, IndexError> {
    let (pos, token, op) = OPERATORS
        .iter()
        .filter_map(|(token, op)| raw.find(token).map(|pos| (pos, *token, *op)))
        .min_by_key(|(pos, token, _)| (*pos, std::cmp::Reverse(token.len())))
        .ok_or_else(|| IndexError::Unsupported(format!("no operator in filter clause {raw:?}")))?;

    let attr = raw[..pos].trim();
    let value = unquote(raw[pos + token.len()..].trim());
    if attr.is_empty() {
        return Err(IndexError::Unsupported(format!("missing attribute in {raw:?}")));
    }
    Ok(Clause { attr: attr.to_string(), op, value })
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

impl Clause {
    fn matches(&self, doc: &Document) -> bool {
        match doc.get(&self.attr) {
            Some(Value::Array(items)) => match self.op {
                Op::Ne => !items.iter().any(|v| self.equals(v)),
                _ => items.iter().any(|v| self.test(v)),
            },
            Some(v) => self.test(v),
            None => self.op == Op::Ne,
        }
    }

    fn test(&self, value: &Value) -> bool {
        match self.op {
            Op::Eq => self.equals(value),
            Op::Ne => !self.equals(value),
            op => {
                let (Some(lhs), Ok(rhs)) = (as_number(value), self.value.parse::<f64>()) else {
                    return false;
                };
                match op {
                    Op::Gt => lhs > rhs,
                    Op::Ge => lhs >= rhs,
                    Op::Lt => lhs < rhs,
                    _ => lhs <= rhs,
                }
            }
        }
    }

    fn equals(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => s.to_lowercase() == self.value.to_lowercase(),
            Value::Number(_) => match (as_number(value), self.value.parse::<f64>()) {
                (Some(a), Ok(b)) => a == b,
                _ => false,
            },
            Value::Bool(b) => self.value.parse::<bool>().is_ok_and(|v| v == *b),
            _ => false,
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

struct SortKey {
    attr: String,
    descending: bool,
}

fn parse_sort_key(raw: &str) -> Result<SortKey, IndexError> {
    let (attr, dir) = raw.rsplit_once(':').unwrap_or((raw, "asc"));
    let descending = match dir {
        "asc" => false,
        "desc" => true,
        other => {
            return Err(IndexError::Unsupported(format!("sort direction {other:?} in {raw:?}")))
        }
    };
    Ok(SortKey { attr: attr.trim().to_string(), descending })
}

impl SortKey {
    /// Missing attributes sort last in both directions.
    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match (a.get(&self.attr), b.get(&self.attr)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                if self.descending { ord.reverse() } else { ord }
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_number(a)
            .partial_cmp(&as_number(b))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Facets and highlighting
// ---------------------------------------------------------------------------

fn count_facets(docs: &[&Document], facets: &[String]) -> FacetDistribution {
    let mut distribution = FacetDistribution::new();
    for facet in facets {
        let counts = distribution.entry(facet.clone()).or_default();
        for doc in docs {
            let values = match doc.get(facet) {
                Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
                Some(v) => vec![v],
                None => continue,
            };
            for value in values {
                let label = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                *counts.entry(label).or_insert(0) += 1;
            }
        }
    }
    distribution
}

fn format_document(doc: &Document, query: &IndexQuery) -> Document {
    let pre = query.highlight_pre_tag.as_deref().unwrap_or("<em>");
    let post = query.highlight_post_tag.as_deref().unwrap_or("</em>");
    let highlight = query.attributes_to_highlight.as_deref().unwrap_or_default();
    let crop = query.attributes_to_crop.as_deref().unwrap_or_default();
    let crop_length = query.crop_length.unwrap_or(10);
    let term = query.q.trim();

    let mut formatted = Document::new();
    for (attr, value) in doc {
        let Value::String(text) = value else {
            formatted.insert(attr.clone(), value.clone());
            continue;
        };
        let wants = |list: &[String]| list.iter().any(|a| a == "*" || a == attr);
        let mut text = text.clone();
        if wants(crop) {
            text = crop_words(&text, term, crop_length);
        }
        if wants(highlight) {
            text = highlight_text(&text, term, pre, post);
        }
        formatted.insert(attr.clone(), Value::String(text));
    }
    formatted
}

/// Wrap every ASCII-case-insensitive occurrence of `term` in `pre`/`post`.
pub(crate) fn highlight_text(text: &str, term: &str, pre: &str, post: &str) -> String {
    if term.is_empty() {
        return text.to_string();
    }
    let haystack = text.to_ascii_lowercase();
    let needle = term.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in haystack.match_indices(&needle) {
        let end = start + needle.len();
        out.push_str(&text[last..start]);
        out.push_str(pre);
        out.push_str(&text[start..end]);
        out.push_str(post);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

/// Keep at most `length` words, centred on the first word containing `term`.
pub(crate) fn crop_words(text: &str, term: &str, length: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= length || length == 0 {
        return text.to_string();
    }
    let needle = term.to_lowercase();
    let hit = if needle.is_empty() {
        0
    } else {
        words.iter().position(|w| w.to_lowercase().contains(&needle)).unwrap_or(0)
    };
    let start = hit.saturating_sub(length / 2).min(words.len() - length);
    let mut cropped = words[start..start + length].join(" ");
    if start > 0 {
        cropped.insert_str(0, "… ");
    }
    if start + length < words.len() {
        cropped.push_str(" …");
    }
    cropped
}
