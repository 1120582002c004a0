//! Configuration types for sift.
//!
//! [`Config::load`] layers, in order: the embedded defaults, the config file
//! (an explicit path, or `~/.config/sift/config.toml` if it exists), and
//! `SIFT_`-prefixed environment variables (`SIFT_CACHE__TTL_SECS=60`).
//! [`Config::defaults`] returns the embedded defaults without touching the
//! filesystem or environment (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[cache]
enabled  = true
ttl_secs = 300
capacity = 100

[search]
default_limit        = 20
max_limit            = 1000
candidate_multiplier = 2
term_timeout_ms      = 3000
facets               = ["brand", "category", "gender"]

[highlight]
attributes      = ["name", "description"]
pre_tag         = "<mark>"
post_tag        = "</mark>"
crop_attributes = ["description"]
crop_length     = 50

[index]
url                = "http://127.0.0.1:7700"
uid                = "products"
primary_key        = "id"
request_timeout_ms = 5000
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_cache_enabled() -> bool { true }
fn default_ttl_secs() -> u64 { 300 }
fn default_capacity() -> usize { 100 }

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Capacity actually handed to the cache; zero when disabled.
    pub fn effective_capacity(&self) -> usize {
        if self.enabled { self.capacity } else { 0 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_ttl_secs(),
            capacity: default_capacity(),
        }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Per-term candidate window multiplier for multi-term searches.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    #[serde(default = "default_term_timeout_ms")]
    pub term_timeout_ms: u64,
    /// Attributes whose distribution is requested from the index.
    #[serde(default = "default_facets")]
    pub facets: Vec<String>,
}

fn default_limit() -> usize { 20 }
fn default_max_limit() -> usize { 1000 }
fn default_candidate_multiplier() -> usize { 2 }
fn default_term_timeout_ms() -> u64 { 3000 }
fn default_facets() -> Vec<String> {
    vec!["brand".to_string(), "category".to_string(), "gender".to_string()]
}

impl SearchConfig {
    pub fn term_timeout(&self) -> Duration {
        Duration::from_millis(self.term_timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            candidate_multiplier: default_candidate_multiplier(),
            term_timeout_ms: default_term_timeout_ms(),
            facets: default_facets(),
        }
    }
}

/// `[highlight]` section. Only sent to the index when a request asks for
/// highlighting.
#[derive(Debug, Clone, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_highlight_attributes")]
    pub attributes: Vec<String>,
    #[serde(default = "default_pre_tag")]
    pub pre_tag: String,
    #[serde(default = "default_post_tag")]
    pub post_tag: String,
    #[serde(default = "default_crop_attributes")]
    pub crop_attributes: Vec<String>,
    #[serde(default = "default_crop_length")]
    pub crop_length: usize,
}

fn default_highlight_attributes() -> Vec<String> {
    vec!["name".to_string(), "description".to_string()]
}
fn default_pre_tag() -> String { "<mark>".to_string() }
fn default_post_tag() -> String { "</mark>".to_string() }
fn default_crop_attributes() -> Vec<String> { vec!["description".to_string()] }
fn default_crop_length() -> usize { 50 }

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            attributes: default_highlight_attributes(),
            pre_tag: default_pre_tag(),
            post_tag: default_post_tag(),
            crop_attributes: default_crop_attributes(),
            crop_length: default_crop_length(),
        }
    }
}

/// `[index]` section: where the search index lives.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub url: String,
    #[serde(default = "default_index_uid")]
    pub uid: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_index_url() -> String { "http://127.0.0.1:7700".to_string() }
fn default_index_uid() -> String { "products".to_string() }
fn default_primary_key() -> String { "id".to_string() }
fn default_request_timeout_ms() -> u64 { 5000 }

impl IndexConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            uid: default_index_uid(),
            api_key: None,
            primary_key: default_primary_key(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load the layered configuration. An explicit `path` must exist; the
    /// per-user file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::from(config_path().as_path()).required(false),
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SIFT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("sift")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
