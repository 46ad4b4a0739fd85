use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Provider response cache keyed by request URL.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, body: String);
    /// Drop expired entries, returning how many were removed.
    fn evict_expired(&self) -> usize;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.fetched_at) < self.ttl
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if self.is_fresh(entry, Instant::now()) {
            return Some(entry.body.clone());
        }
        entries.remove(key);
        None
    }

    fn set(&self, key: &str, body: String) {
        let entry = CacheEntry {
            body,
            fetched_at: Instant::now(),
        };
        self.lock().insert(key.to_string(), entry);
    }

    fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.fetched_at) < self.ttl);
        before - entries.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl ResponseCache for NoopCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _body: String) {}

    fn evict_expired(&self) -> usize {
        0
    }
}

/// Memory cache for a positive TTL, no-op cache otherwise.
pub fn cache_for_ttl(ttl: Duration) -> Arc<dyn ResponseCache> {
    if ttl.is_zero() {
        Arc::new(NoopCache)
    } else {
        Arc::new(MemoryCache::new(ttl))
    }
}
