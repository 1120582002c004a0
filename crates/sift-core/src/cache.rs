//! Result cache: TTL-bounded, capacity-bounded map from a canonical request
//! fingerprint to a normalised [`SearchResult`].
//!
//! Eviction is insertion-ordered: when the cache is full the entry that was
//! inserted first goes, regardless of how recently it was read. Stale entries
//! are dropped lazily on read.
//!
//! Timestamps use [`tokio::time::Instant`] so tests can drive expiry with
//! `tokio::time::pause()` / `advance()`.

use crate::types::{SearchRequest, SearchResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CAPACITY: usize = 100;

/// One cached result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub payload: SearchResult,
    pub inserted_at: Instant,
}

/// Hit/miss/eviction counters, read with [`ResultCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evicted: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order; always holds exactly the keys of `entries`.
    order: VecDeque<String>,
}

impl CacheInner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        Some(entry)
    }
}

/// Shared result cache. Cheap to share behind an `Arc`; every operation takes
/// a short internal lock and never awaits while holding it.
pub struct ResultCache {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    evicted: AtomicU64,
}

impl ResultCache {
    /// A capacity of zero disables caching entirely.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            inner: Mutex::new(CacheInner::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &crate::config::CacheConfig) -> Self {
        Self::new(config.ttl(), config.effective_capacity())
    }

    /// Canonical fingerprint of `(term, limit, offset, filter, sort)`.
    ///
    /// Returns `None` for highlighted requests: those are never cached.
    pub fn key(request: &SearchRequest) -> Option<String> {
        if request.highlighting {
            return None;
        }
        let parts = serde_json::json!([
            request.term,
            request.limit,
            request.offset,
            request.filter,
            request.sort,
        ]);
        Some(parts.to_string())
    }

    /// Fetch a live entry. An expired entry is removed and reported absent.
    pub fn get(&self, key: &str) -> Option<SearchResult> {
        let now = Instant::now();
        let mut inner = self.lock();

        let fresh = match inner.entries.get(key) {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Some(entry) => now.duration_since(entry.inserted_at) <= self.ttl,
        };

        if fresh {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return inner.entries.get(key).map(|e| e.payload.clone());
        }

        inner.remove(key);
        self.expired.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key, "cache: expired entry dropped");
        None
    }

    /// Insert or replace. Replacing an existing key refreshes its timestamp
    /// and moves it to the back of the eviction queue; inserting a new key
    /// into a full cache first evicts the oldest insertion.
    pub fn set(&self, key: impl Into<String>, payload: SearchResult) {
        if self.capacity == 0 {
            return;
        }
        let key = key.into();
        let mut inner = self.lock();

        if inner.remove(&key).is_none() {
            while inner.entries.len() >= self.capacity {
                let Some(oldest) = inner.order.pop_front() else { break };
                inner.entries.remove(&oldest);
                self.evicted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %oldest, "cache: evicted oldest entry");
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key.clone(),
            CacheEntry { key, payload, inserted_at: Instant::now() },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }

    // A panic while holding the lock cannot leave `entries` and `order`
    // out of step (both are updated together), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}
