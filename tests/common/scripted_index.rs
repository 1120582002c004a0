//! ScriptedIndex: an in-process [`SearchIndex`] whose answers, delays and
//! failures are set per term.
//!
//! Delays use `tokio::time::sleep`, so harnesses running with paused time
//! can make completion order and timeouts fully deterministic.

use serde_json::{Map, Value};
use sift::{IndexError, IndexQuery, RawSearchResponse, SearchIndex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Default)]
struct Script {
    hits: Vec<Map<String, Value>>,
    delay: Duration,
    failure: Option<String>,
}

/// Index double. Unscripted terms answer with no hits immediately.
#[derive(Default)]
pub struct ScriptedIndex {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
    queries: Mutex<Vec<IndexQuery>>,
}

impl ScriptedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `term` with `hits`.
    pub fn answer(mut self, term: &str, hits: Vec<Map<String, Value>>) -> Self {
        self.scripts.entry(term.to_string()).or_default().hits = hits;
        self
    }

    /// Hold `term`'s answer back for `delay`.
    pub fn delay(mut self, term: &str, delay: Duration) -> Self {
        self.scripts.entry(term.to_string()).or_default().delay = delay;
        self
    }

    /// Make every call for `term` fail as unreachable.
    pub fn fail(mut self, term: &str, reason: &str) -> Self {
        self.scripts.entry(term.to_string()).or_default().failure = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, term: &str) -> usize {
        self.queries.lock().unwrap().iter().filter(|q| q.q == term).count()
    }

    pub fn queries(&self) -> Vec<IndexQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchIndex for ScriptedIndex {
    async fn search(&self, query: &IndexQuery) -> Result<RawSearchResponse, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        let script = self.scripts.get(&query.q).cloned().unwrap_or_default();

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        if let Some(reason) = script.failure {
            return Err(IndexError::Unreachable(reason));
        }

        let total = script.hits.len() as u64;
        let hits = script.hits.into_iter().skip(query.offset).take(query.limit).collect();
        Ok(RawSearchResponse {
            hits,
            estimated_total_hits: Some(total),
            processing_time_ms: script.delay.as_millis() as u64,
            ..RawSearchResponse::default()
        })
    }
}
