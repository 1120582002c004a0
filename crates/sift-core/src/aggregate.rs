//! Multi-term aggregator: fan out one executor call per expanded term, wait
//! for all of them, then merge, rank and paginate.
//!
//! # Weighting
//!
//! Term `i` of `n` weighs `n - i`: earlier terms in the expansion count for
//! more. Weights come from list position only, so the order in which term
//! calls complete never changes the ranking.
//!
//! # Ranking
//!
//! Descending by number of distinct matched terms, then by accumulated term
//! relevance, then ascending by id so equal hits sort reproducibly.
//!
//! # Failure
//!
//! A failed, timed-out or panicked term becomes a failed [`TermOutcome`] and
//! never aborts its siblings. If the caller's deadline elapses, terms still
//! running are abandoned (their tasks aborted) and the result is flagged
//! `partial`.

use crate::error::SearchError;
use crate::executor::TermExecutor;
use crate::types::{FacetDistribution, Hit, SearchRequest, SearchResult, TermOutcome};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

pub const DEADLINE_ELAPSED: &str = "deadline elapsed before the term completed";

pub struct MultiTermAggregator {
    executor: Arc<TermExecutor>,
    candidate_multiplier: usize,
}

impl MultiTermAggregator {
    pub fn new(executor: Arc<TermExecutor>, candidate_multiplier: usize) -> Self {
        Self { executor, candidate_multiplier: candidate_multiplier.max(1) }
    }

    /// Search every term in `terms` with `request`'s filter, sort and
    /// highlighting. `request.term` is ignored; its `limit`/`offset` describe
    /// the page of the merged result.
    pub async fn aggregate(
        &self,
        terms: &[String],
        request: &SearchRequest,
        deadline: Option<Instant>,
    ) -> SearchResult {
        let candidates = request.limit.saturating_mul(self.candidate_multiplier);
        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(terms.len());

        for (i, term) in terms.iter().enumerate() {
            let executor = Arc::clone(&self.executor);
            let term_request = request.for_term(term.clone(), candidates, 0);
            // The overall deadline is enforced below, not per task, so a term
            // cut off by it is always reported as abandoned.
            let handle = tasks.spawn(async move {
                match executor.execute(&term_request).await {
                    Ok(result) => TermOutcome::succeeded(term_request.term, result),
                    Err(err) => term_failed(&term_request.term, err),
                }
            });
            positions.insert(handle.id(), i);
        }

        let mut slots: Vec<Option<TermOutcome>> = vec![None; terms.len()];
        let mut partial = false;

        loop {
            let next = match deadline {
                Some(d) => match tokio::time::timeout_at(d, tasks.join_next_with_id()).await {
                    Ok(next) => next,
                    Err(_) => {
                        partial = true;
                        break;
                    }
                },
                None => tasks.join_next_with_id().await,
            };
            let Some(joined) = next else { break };

            match joined {
                Ok((id, outcome)) => slots[positions[&id]] = Some(outcome),
                Err(err) => {
                    let i = positions[&err.id()];
                    slots[i] = Some(term_failed(
                        &terms[i],
                        SearchError::TermSearchFailed { term: terms[i].clone(), reason: err.to_string() },
                    ));
                }
            }
        }
        tasks.abort_all();

        let outcomes: Vec<TermOutcome> = slots
            .into_iter()
            .zip(terms)
            .map(|(slot, term)| {
                slot.unwrap_or_else(|| {
                    tracing::warn!(term = %term, "aggregate: term abandoned at deadline");
                    TermOutcome::failed(term.clone(), DEADLINE_ELAPSED)
                })
            })
            .collect();

        let mut result = assemble(outcomes, request.limit, request.offset);
        result.partial = partial;
        result
    }
}

fn term_failed(term: &str, cause: SearchError) -> TermOutcome {
    let err = match cause {
        e @ SearchError::TermSearchFailed { .. } => e,
        other => SearchError::TermSearchFailed { term: term.to_string(), reason: other.to_string() },
    };
    tracing::warn!(term, error = %err, "aggregate: term search failed");
    TermOutcome::failed(term, err.to_string())
}

/// Weight of the term at `position` in a list of `num_terms`.
pub fn term_weight(position: usize, num_terms: usize) -> u64 {
    num_terms.saturating_sub(position) as u64
}

/// Merge per-term hits into one de-duplicated list, ranked.
///
/// `outcomes` must be in expansion order; position `i` determines the weight.
pub fn merge_outcomes(outcomes: &[TermOutcome]) -> Vec<Hit> {
    let n = outcomes.len();
    let mut merged: HashMap<&str, Hit> = HashMap::new();

    for (i, outcome) in outcomes.iter().enumerate() {
        let weight = term_weight(i, n);
        for hit in &outcome.hits {
            match merged.get_mut(hit.id.as_str()) {
                Some(existing) => {
                    // A term counts once per hit even if the index repeats it.
                    if existing.matched_terms.insert(outcome.term.clone()) {
                        existing.term_relevance = existing.term_relevance.saturating_add(weight);
                    }
                }
                None => {
                    let mut fresh = hit.clone();
                    fresh.matched_terms.clear();
                    fresh.matched_terms.insert(outcome.term.clone());
                    fresh.term_relevance = weight;
                    merged.insert(hit.id.as_str(), fresh);
                }
            }
        }
    }

    let mut ranked: Vec<Hit> = merged.into_values().collect();
    ranked.sort_by(rank_order);
    ranked
}

/// Ranking comparator; `Less` means `a` ranks first.
pub fn rank_order(a: &Hit, b: &Hit) -> Ordering {
    b.matched_terms
        .len()
        .cmp(&a.matched_terms.len())
        .then_with(|| b.term_relevance.cmp(&a.term_relevance))
        .then_with(|| a.id.cmp(&b.id))
}

/// Slice `[offset, offset + limit)` out of a ranked list.
pub fn paginate(mut ranked: Vec<Hit>, offset: usize, limit: usize) -> Vec<Hit> {
    if offset >= ranked.len() {
        return Vec::new();
    }
    ranked.drain(..offset);
    ranked.truncate(limit);
    ranked
}

/// Build the multi-term [`SearchResult`] from finished outcomes.
pub fn assemble(outcomes: Vec<TermOutcome>, limit: usize, offset: usize) -> SearchResult {
    let ranked = merge_outcomes(&outcomes);
    let total_hits = ranked.len();
    let succeeded: Vec<&TermOutcome> = outcomes.iter().filter(|o| !o.failed).collect();

    SearchResult {
        hits: paginate(ranked, offset, limit),
        total_hits,
        limit,
        offset,
        // Terms run concurrently, so the slowest one bounds index time.
        processing_time_ms: succeeded.iter().map(|o| o.processing_time_ms).max().unwrap_or(0),
        facet_distribution: FacetDistribution::new(),
        multi_term: true,
        from_cache: !succeeded.is_empty() && succeeded.iter().all(|o| o.from_cache),
        all_failed: succeeded.is_empty(),
        partial: false,
        term_outcomes: Some(outcomes),
    }
}
