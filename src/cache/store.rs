//! Result cache storage.
//!
//! Entries are stamped when written and judged against the freshness window when read.
//! Stale entries are never swept; they linger until overwritten or the cache is cleared.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use metrics::counter;
use time::OffsetDateTime;

use crate::domain::ContentResult;

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub const METRIC_CACHE_HIT: &str = "newsdesk_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "newsdesk_cache_miss_total";
pub const METRIC_CACHE_STALE: &str = "newsdesk_cache_stale_total";

/// Key/value store for fetched content results.
pub trait ResultCache: Send + Sync {
    /// A fresh payload for `key`, or `None` when absent or older than the freshness window.
    fn get(&self, key: &CacheKey) -> Option<ContentResult>;

    /// Store `payload` under `key`, replacing any previous entry.
    fn set(&self, key: CacheKey, payload: ContentResult);

    fn clear(&self);
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: ContentResult,
    pub stored_at: OffsetDateTime,
}

impl CacheEntry {
    fn is_fresh(&self, now: OffsetDateTime, freshness: Duration) -> bool {
        now - self.stored_at <= freshness
    }
}

/// Process-wide in-memory result cache. Unbounded; last write wins.
pub struct MemoryResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
    freshness: Duration,
}

impl MemoryResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            freshness: config.freshness,
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryResultCache {
    fn get(&self, key: &CacheKey) -> Option<ContentResult> {
        let entries = rw_read(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.clock.now(), self.freshness) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(entry.payload.clone())
            }
            Some(_) => {
                counter!(METRIC_CACHE_STALE).increment(1);
                None
            }
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    fn set(&self, key: CacheKey, payload: ContentResult) {
        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now(),
        };
        rw_write(&self.entries, SOURCE, "set").insert(key, entry);
    }

    fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }
}

/// Stand-in used when caching is disabled: never stores, never hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResultCache;

impl ResultCache for NoopResultCache {
    fn get(&self, _key: &CacheKey) -> Option<ContentResult> {
        None
    }

    fn set(&self, _key: CacheKey, _payload: ContentResult) {}

    fn clear(&self) {}
}

/// Build the cache the configuration asks for.
pub fn build_result_cache(config: &CacheConfig, clock: Arc<dyn Clock>) -> Arc<dyn ResultCache> {
    if config.enabled {
        Arc::new(MemoryResultCache::with_clock(config, clock))
    } else {
        Arc::new(NoopResultCache)
    }
}
