//! sift: multi-term search aggregation with a TTL result cache.
//!
//! Re-exports the core engine and the index adapters so the binary, the
//! integration harnesses and the benches share one import path.
//!
//! # Architecture
//!
//! ```text
//! CLI ──► SearchFacade ──► TermExecutor / MultiTermAggregator ──► SearchIndex
//!                                                                  ├─ MeiliIndex  (HTTP)
//!                                                                  └─ MemoryIndex (JSON file)
//! ```

pub use sift_core::*;
pub use sift_index::{MeiliIndex, MemoryIndex};

/// Install the global `tracing` subscriber, writing to stderr so stdout
/// stays clean for JSON output. `RUST_LOG` wins when set; otherwise `debug`
/// enables debug output and everything else defaults to `warn`.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

/// Query understanding that always answers with the same [`Understanding`],
/// regardless of query or vocabulary. Lets the CLI replay a captured answer
/// from the real component.
#[derive(Debug, Clone)]
pub struct FixedUnderstanding(pub sift_core::Understanding);

impl FixedUnderstanding {
    pub fn from_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self(serde_json::from_str(&raw)?))
    }
}

#[async_trait::async_trait]
impl sift_core::QueryUnderstanding for FixedUnderstanding {
    async fn understand(
        &self,
        _query: &str,
        _vocabulary: &sift_core::Vocabulary,
    ) -> anyhow::Result<sift_core::Understanding> {
        Ok(self.0.clone())
    }
}
