//! Byte-bounded LRU cache for decoded thumbnails.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use super::Thumbnail;

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a value
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Values stored
    pub insertions: u64,
    /// Values dropped to make room
    pub evictions: u64,
}

struct CacheInner {
    /// Recency order lives in the `LruCache`; its own capacity is unbounded
    /// because the limit is expressed in bytes, not entries.
    entries: LruCache<String, Thumbnail>,
    size_bytes: usize,
    stats: CacheStats,
}

/// Thread-safe thumbnail cache bounded by total decoded size.
///
/// Every call locks once, so recency updates and evictions are atomic with
/// respect to concurrent fetch tasks.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Mutex<CacheInner>>,
    budget_bytes: usize,
}

impl ImageCache {
    /// Create a cache holding at most `budget_bytes` of decoded images.
    #[must_use]
    pub fn new(budget_bytes: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                size_bytes: 0,
                stats: CacheStats::default(),
            })),
            budget_bytes: budget_bytes.get(),
        }
    }

    /// Get a thumbnail, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<Thumbnail> {
        let mut cache = self.inner.lock();
        let found = cache.entries.get(key).cloned();
        if found.is_some() {
            cache.stats.hits += 1;
        } else {
            cache.stats.misses += 1;
        }
        found
    }

    /// Store a thumbnail unless the key is already present.
    ///
    /// The first writer wins: a second value for a cached key only refreshes
    /// the existing entry's recency. Returns `true` if `thumbnail` was stored.
    pub fn put(&self, key: &str, thumbnail: Thumbnail) -> bool {
        let mut cache = self.inner.lock();

        if cache.entries.get(key).is_some() {
            return false;
        }

        let size = thumbnail.size_bytes();
        if size > self.budget_bytes {
            tracing::debug!(
                "Not caching {key}: {size} bytes exceeds budget of {}",
                self.budget_bytes
            );
            return false;
        }

        cache.entries.put(key.to_string(), thumbnail);
        cache.size_bytes += size;
        cache.stats.insertions += 1;

        while cache.size_bytes > self.budget_bytes {
            let Some((evicted, old)) = cache.entries.pop_lru() else {
                break;
            };
            cache.size_bytes -= old.size_bytes();
            cache.stats.evictions += 1;
            tracing::debug!("Evicted {evicted} ({} bytes)", old.size_bytes());
        }

        true
    }

    /// Check if a key is cached without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut cache = self.inner.lock();
        cache.entries.clear();
        cache.size_bytes = 0;
    }

    /// Number of cached thumbnails.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Total decoded bytes currently held.
    pub fn size_bytes(&self) -> usize {
        self.inner.lock().size_bytes
    }

    /// Configured byte budget.
    pub const fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    /// Snapshot of the hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn budget(bytes: usize) -> NonZeroUsize {
        NonZeroUsize::new(bytes).unwrap()
    }

    fn thumb(size: u32) -> Thumbnail {
        Thumbnail::new(DynamicImage::new_luma8(size, 1))
    }

    #[test]
    fn test_evicts_oldest_when_over_budget() {
        let cache = ImageCache::new(budget(100));
        assert!(cache.put("a", thumb(40)));
        assert!(cache.put("b", thumb(40)));
        assert!(cache.put("c", thumb(40)));

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.size_bytes(), 80);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = ImageCache::new(budget(100));
        cache.put("a", thumb(40));
        cache.put("b", thumb(40));
        assert!(cache.get("a").is_some());

        cache.put("c", thumb(40));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_put_existing_key_refreshes_recency() {
        let cache = ImageCache::new(budget(100));
        cache.put("a", thumb(40));
        cache.put("b", thumb(40));
        assert!(!cache.put("a", thumb(40)));

        cache.put("c", thumb(40));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_first_writer_wins() {
        let cache = ImageCache::new(budget(1000));
        let first = thumb(10);
        let second = thumb(20);
        assert!(cache.put("a", first.clone()));
        assert!(!cache.put("a", second));

        let stored = cache.get("a").unwrap();
        assert!(stored.ptr_eq(&first));
        assert_eq!(cache.size_bytes(), 10);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_racing_puts_keep_one_value() {
        let cache = ImageCache::new(budget(10_000));
        let writers = 8;
        let start = std::sync::Barrier::new(writers);

        let results: Vec<(u32, bool)> = std::thread::scope(|scope| {
            let workers: Vec<_> = (1..=writers as u32)
                .map(|size| {
                    let cache = cache.clone();
                    let start = &start;
                    scope.spawn(move || {
                        let value = thumb(size * 10);
                        start.wait();
                        (size * 10, cache.put("shared", value))
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        let winners: Vec<u32> = results
            .iter()
            .filter(|(_, stored)| *stored)
            .map(|(size, _)| *size)
            .collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_bytes(), winners[0] as usize);
        assert_eq!(cache.get("shared").unwrap().size_bytes(), winners[0] as usize);
        assert_eq!(cache.stats().insertions, 1);
    }

    #[test]
    fn test_size_never_exceeds_budget() {
        let cache = ImageCache::new(budget(256));
        let sizes = [17, 90, 3, 120, 64, 255, 1, 33, 200, 70, 70, 70, 9];
        for (i, size) in sizes.iter().enumerate() {
            cache.put(&format!("k{i}"), thumb(*size));
            assert!(cache.size_bytes() <= cache.budget_bytes());
            if i % 3 == 0 {
                let _ = cache.get(&format!("k{}", i / 2));
            }
        }
    }

    #[test]
    fn test_oversized_value_is_rejected() {
        let cache = ImageCache::new(budget(50));
        cache.put("small", thumb(20));
        assert!(!cache.put("huge", thumb(51)));
        assert!(cache.contains("small"));
        assert!(!cache.contains("huge"));
        assert_eq!(cache.size_bytes(), 20);
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = ImageCache::new(budget(100));
        assert!(cache.is_empty());
        cache.put("a", thumb(10));
        let _ = cache.get("a");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.size_bytes(), 0);
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = ImageCache::new(budget(100));
        let other = cache.clone();
        cache.put("a", thumb(10));
        assert!(other.contains("a"));
    }
}
