//! Shared test utilities for sift integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. The scripted index is deterministic under
//! `tokio::time::pause()` / `start_paused = true`.

pub mod assertions;
pub mod builders;
pub mod fake_meili_api;
pub mod fixtures;
pub mod scripted_index;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use scripted_index::*;
