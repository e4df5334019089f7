// File: src/cache/ttl_cache.rs

use std::collections::HashMap;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

pub const DEFAULT_CAPACITY: usize = 5000;

/// Key → (insertion instant, value) with age-based invalidation and a hard capacity.
///
/// Every operation is one critical section on a blocking mutex, so the cache is safe
/// to share between async tasks and plain threads alike. Timestamps come from
/// `tokio::time::Instant`, which follows the paused test clock.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, (Instant, V)>>,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// The stored value, unless it is older than `ttl` (in which case it is dropped).
    pub fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        let mut entries = self.entries.lock();
        let (inserted, value) = entries.get(key)?;
        if Instant::now().duration_since(*inserted) > ttl {
            trace!("cache entry expired: {}", key);
            entries.remove(key);
            return None;
        }
        Some(value.clone())
    }

    /// Inserts or refreshes `key`. A new key arriving at a full cache first evicts the
    /// single entry with the oldest insertion time.
    pub fn set(&self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }
        let key = key.into();
        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, (inserted, _))| *inserted)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                trace!("cache full, evicting {}", oldest);
                entries.remove(&oldest);
            }
        }
        entries.insert(key, (Instant::now(), value));
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
