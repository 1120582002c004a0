//! sift-index: [`SearchIndex`](sift_core::SearchIndex) implementations.
//!
//! - [`MeiliIndex`]: a Meilisearch-compatible server over plain HTTP.
//! - [`MemoryIndex`]: documents held in memory, for offline use and tests.

pub mod meili;
pub mod memory;

pub use meili::MeiliIndex;
pub use memory::MemoryIndex;
