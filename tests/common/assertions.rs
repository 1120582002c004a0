//! Domain-specific assertion macros for sift harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! result invariant broke.

// ---------------------------------------------------------------------------
// Hit ordering
// ---------------------------------------------------------------------------

/// Assert the page of a `SearchResult` holds exactly `ids`, in order.
///
/// ```rust
/// assert_ids!(response.result, ["2", "1"]);
/// ```
#[macro_export]
macro_rules! assert_ids {
    ($result:expr, [$($id:expr),* $(,)?]) => {{
        let result: &sift::SearchResult = &$result;
        let expected: Vec<&str> = vec![$($id),*];
        pretty_assertions::assert_eq!(result.ids(), expected, "hit ids (in rank order)");
    }};
}

/// Assert no id appears twice in a result page.
#[macro_export]
macro_rules! assert_no_duplicate_ids {
    ($result:expr) => {{
        let result: &sift::SearchResult = &$result;
        let mut seen = std::collections::HashSet::new();
        for id in result.ids() {
            if !seen.insert(id) {
                panic!("assert_no_duplicate_ids! failed: {:?} repeated in {:?}", id, result.ids());
            }
        }
    }};
}

// ---------------------------------------------------------------------------
// Term diagnostics
// ---------------------------------------------------------------------------

/// Assert the per-term diagnostics mark exactly the terms in `failed` as
/// failed, in expansion order.
///
/// ```rust
/// assert_failed_terms!(response.result, ["coat"]);
/// ```
#[macro_export]
macro_rules! assert_failed_terms {
    ($result:expr, [$($term:expr),* $(,)?]) => {{
        let result: &sift::SearchResult = &$result;
        let outcomes = result
            .term_outcomes
            .as_ref()
            .expect("assert_failed_terms! needs a multi-term result");
        let failed: Vec<&str> = outcomes.iter().filter(|o| o.failed).map(|o| o.term.as_str()).collect();
        let expected: Vec<&str> = vec![$($term),*];
        pretty_assertions::assert_eq!(failed, expected, "failed terms");
    }};
}
