//! In-memory tile cache
//!
//! This module provides an async-safe memory cache backed by
//! `moka::future::Cache`, keyed by [`TileCoord`]. Moka uses lock-free data
//! structures internally, making it safe to use from async contexts
//! without blocking the Tokio runtime.
//!
//! Entries are populated lazily by the fetch service on first access. By
//! default the cache is unbounded and entries live for the process
//! lifetime; an optional byte limit enables size-based LRU eviction for
//! long-running sessions.

use crate::coord::TileCoord;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Snapshot of cache effectiveness counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Current number of cached tiles.
    pub entries: u64,
    /// Current weighted size of cached tile data in bytes.
    pub size_bytes: u64,
}

impl CacheStats {
    /// Hit ratio in [0, 1]; zero when no lookups have happened.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-memory cache mapping tile coordinates to encoded image bytes.
///
/// Values are shared as `Arc<Vec<u8>>` so concurrent readers and the
/// renderer hold the same allocation.
pub struct TileCache {
    tiles: Cache<TileCoord, Arc<Vec<u8>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TileCache {
    /// Creates an unbounded cache: entries are never evicted within a
    /// session.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a cache bounded to `max_size_bytes`, with entries weighted
    /// by their data size and evicted LRU-style past the limit.
    pub fn with_max_size_bytes(max_size_bytes: u64) -> Self {
        Self::build(Some(max_size_bytes))
    }

    fn build(max_size_bytes: Option<u64>) -> Self {
        let mut builder = Cache::builder()
            .weigher(|_key: &TileCoord, value: &Arc<Vec<u8>>| -> u32 {
                // moka weighs in u32; cap oversized entries
                value.len().min(u32::MAX as usize) as u32
            });

        if let Some(max) = max_size_bytes {
            builder = builder.max_capacity(max);
        }

        Self {
            tiles: builder.build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a tile, counting the hit or miss.
    pub async fn get(&self, tile: &TileCoord) -> Option<Arc<Vec<u8>>> {
        match self.tiles.get(tile).await {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts a tile's image bytes.
    ///
    /// Replaces any existing entry for the key. Only the fetch task that
    /// owns a tile's in-flight request inserts it, so concurrent
    /// duplicate writes do not happen in practice.
    pub async fn insert(&self, tile: TileCoord, data: Arc<Vec<u8>>) {
        self.tiles.insert(tile, data).await;
        self.tiles.run_pending_tasks().await;
    }

    /// Whether a tile is cached, without counting a lookup.
    pub async fn contains(&self, tile: &TileCoord) -> bool {
        self.tiles.contains_key(tile)
    }

    /// Current number of cached tiles.
    pub fn entry_count(&self) -> u64 {
        self.tiles.entry_count()
    }

    /// Current weighted size of cached data in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.tiles.weighted_size()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entry_count(),
            size_bytes: self.size_bytes(),
        }
    }

    /// Removes all entries.
    pub async fn clear(&self) {
        self.tiles.invalidate_all();
        self.tiles.run_pending_tasks().await;
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(x: u32, y: u32) -> TileCoord {
        TileCoord::new(x, y, 10)
    }

    #[tokio::test]
    async fn test_get_miss_then_hit() {
        let cache = TileCache::new();
        let key = tile(194, 385);

        assert!(cache.get(&key).await.is_none());

        cache.insert(key, Arc::new(vec![1, 2, 3])).await;
        let data = cache.get(&key).await.unwrap();
        assert_eq!(*data, vec![1, 2, 3]);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_insert_replaces_existing() {
        let cache = TileCache::new();
        let key = tile(1, 1);

        cache.insert(key, Arc::new(vec![1])).await;
        cache.insert(key, Arc::new(vec![2])).await;

        assert_eq!(*cache.get(&key).await.unwrap(), vec![2]);
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_cache_keeps_everything() {
        let cache = TileCache::new();

        for x in 0..100 {
            cache.insert(tile(x, 0), Arc::new(vec![0u8; 1024])).await;
        }

        assert_eq!(cache.entry_count(), 100);
        assert_eq!(cache.size_bytes(), 100 * 1024);
    }

    #[tokio::test]
    async fn test_bounded_cache_evicts_past_limit() {
        let cache = TileCache::with_max_size_bytes(10 * 1024);

        for x in 0..100 {
            cache.insert(tile(x, 0), Arc::new(vec![0u8; 1024])).await;
        }

        assert!(cache.entry_count() < 100);
        assert!(cache.size_bytes() <= 10 * 1024);
    }

    #[tokio::test]
    async fn test_contains_does_not_count_lookup() {
        let cache = TileCache::new();
        let key = tile(5, 5);

        assert!(!cache.contains(&key).await);
        cache.insert(key, Arc::new(vec![9])).await;
        assert!(cache.contains(&key).await);

        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = TileCache::new();
        cache.insert(tile(1, 2), Arc::new(vec![1])).await;
        cache.clear().await;
        assert_eq!(cache.entry_count(), 0);
    }
}
