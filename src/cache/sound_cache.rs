// Least-recently-used cache of loaded sounds
// Capacity is a count of distinct files, not a byte budget

use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

use super::CacheKey;
use crate::error::LoadError;

/// Number of distinct sounds kept loaded when nothing else is configured
pub const DEFAULT_CAPACITY: usize = 50;

/// Counters describing how the cache has been used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub failed_loads: u64,
}

/// Bounded cache of engine resources keyed by canonical path
///
/// Mapping and recency order live in a single `LruCache`, so every cached
/// key has exactly one position in the order and vice versa.
pub struct SoundCache<R> {
    entries: LruCache<CacheKey, R>,
    stats: CacheStats,
}

impl<R: Clone> SoundCache<R> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the cached resource for `key`, loading it on a miss
    ///
    /// A hit moves the key to the most-recently-used end. On a miss the
    /// loader runs first; only a successful load is inserted, evicting the
    /// least-recently-used entry if the cache is full. A failed load leaves
    /// the cache exactly as it was.
    pub fn get_or_try_load<F>(&mut self, key: CacheKey, load: F) -> Result<R, LoadError>
    where
        F: FnOnce(&CacheKey) -> Result<R, LoadError>,
    {
        if let Some(resource) = self.entries.get(&key) {
            self.stats.hits += 1;
            debug!(sound = %key, "cache hit");
            return Ok(resource.clone());
        }

        self.stats.misses += 1;
        let resource = match load(&key) {
            Ok(resource) => resource,
            Err(e) => {
                self.stats.failed_loads += 1;
                return Err(e);
            }
        };

        // The key was absent, so anything handed back here is the LRU victim
        if let Some((evicted, _)) = self.entries.push(key.clone(), resource.clone()) {
            self.stats.evictions += 1;
            debug!(sound = %evicted, "evicted least recently used sound");
        }
        debug!(sound = %key, cached = self.entries.len(), "cache miss, loaded");

        Ok(resource)
    }

    /// Whether `key` is cached, without touching its recency
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Borrow a cached resource without touching its recency
    pub fn peek(&self, key: &CacheKey) -> Option<&R> {
        self.entries.peek(key)
    }

    /// Cached keys from least to most recently used
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.iter().rev().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl<R: Clone> Default for SoundCache<R> {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}
