use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    /// Percentage, 0.0 when nothing was looked up yet.
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
}

#[derive(Debug)]
struct CacheInner {
    /// `None` when the capacity is zero.
    entries: Option<LruCache<String, String>>,
    hits: u64,
    misses: u64,
}

/// Bounded response cache. Evicts the oldest entry first.
///
/// Lookups use `peek`, so reads never refresh an entry's position.
#[derive(Debug)]
pub struct ResponseCache {
    max_size: usize,
    inner: Mutex<CacheInner>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ResponseCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            inner: Mutex::new(CacheInner {
                entries: NonZeroUsize::new(max_size).map(LruCache::new),
                hits: 0,
                misses: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();
        let found = inner
            .entries
            .as_ref()
            .and_then(|entries| entries.peek(key).cloned());
        if found.is_some() {
            inner.hits += 1;
            tracing::info!(key = %preview(key), "cache hit");
        } else {
            inner.misses += 1;
            tracing::info!(key = %preview(key), "cache miss");
        }
        found
    }

    pub fn insert(&self, key: &str, result: &str) {
        let mut inner = self.lock();
        let Some(entries) = inner.entries.as_mut() else {
            return;
        };
        if let Some(existing) = entries.peek_mut(key) {
            *existing = result.to_string();
            return;
        }
        if let Some((evicted, _)) = entries.push(key.to_string(), result.to_string()) {
            tracing::debug!(key = %preview(&evicted), "evicted oldest entry");
        }
        tracing::debug!(key = %preview(key), "cached result");
    }

    pub fn len(&self) -> usize {
        self.lock().entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total_requests = inner.hits + inner.misses;
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            inner.hits as f64 / total_requests as f64 * 100.0
        };
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            total_requests,
            hit_rate,
            size: inner.entries.as_ref().map_or(0, LruCache::len),
            max_size: self.max_size,
        }
    }

    /// Drops every entry. Hit and miss counters are kept.
    pub fn clear(&self) {
        if let Some(entries) = self.lock().entries.as_mut() {
            entries.clear();
        }
        tracing::info!("cache cleared");
    }
}

fn preview(key: &str) -> String {
    switchyard_core::truncate_preview(key, 50)
}
