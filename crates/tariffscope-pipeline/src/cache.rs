//! Time-boxed result cache.
//!
//! A process-wide key → entry table with a fixed TTL. Expired entries
//! are evicted lazily on the next read, never proactively. Two
//! concurrent lookups for the same missing key may both recompute; that
//! race is accepted — single-flight deduplication can be layered into
//! this type later without touching pipeline logic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct CacheEntry<T> {
    payload: T,
    inserted_at: Instant,
}

/// Thread-safe TTL cache.
pub struct TtlCache<T: Clone> {
    inner: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a live entry. A stale entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock();
        match inner.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.payload.clone()),
            Some(_) => {
                inner.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: String, payload: T) {
        self.inner.lock().insert(
            key,
            CacheEntry {
                payload,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn delete(&self, key: &str) {
        self.inner.lock().remove(key);
    }

    /// Number of entries, live and stale alike.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let cache = TtlCache::new(Duration::from_secs(3600));
        assert!(cache.get("k").is_none());

        cache.set("k".into(), 42);
        assert_eq!(cache.get("k"), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_entry_evicted_on_read() {
        let cache = TtlCache::new(Duration::from_millis(1));
        cache.set("k".into(), 1);
        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get("k").is_none());
        // Eviction happened during the read.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete() {
        let cache = TtlCache::new(Duration::from_secs(3600));
        cache.set("k".into(), "v".to_string());
        cache.delete("k");
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_set_refreshes_entry() {
        let cache = TtlCache::new(Duration::from_secs(3600));
        cache.set("k".into(), 1);
        cache.set("k".into(), 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
