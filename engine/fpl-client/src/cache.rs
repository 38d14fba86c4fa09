//! Time-windowed memo of idempotent GET responses.
//!
//! Keyed by request URL. Entries expire after their TTL and are evicted
//! lazily on the next lookup; nothing here is ever persisted.

use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// Shared in-process response cache.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached body if the entry is still within its TTL.
    /// An expired entry is removed and treated as a miss.
    pub fn get(&self, url: &str) -> Option<Value> {
        let expired = match self.entries.get(url) {
            Some(entry) if entry.is_live() => return Some(entry.body.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(url);
        }
        None
    }

    /// Store a response body, replacing any previous entry for the URL.
    pub fn put(&self, url: &str, body: Value, ttl: Duration) {
        self.entries
            .insert(url.to_string(), CacheEntry { body, stored_at: Instant::now(), ttl });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn live_entry_is_returned() {
        let cache = ResponseCache::new();
        cache.put("https://x/api/", json!({"ok": true}), Duration::from_secs(60));
        assert_eq!(cache.get("https://x/api/"), Some(json!({"ok": true})));
    }

    #[test]
    fn expired_entry_is_evicted_on_lookup() {
        let cache = ResponseCache::new();
        cache.put("https://x/api/", json!(1), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("https://x/api/"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn put_overwrites_previous_entry() {
        let cache = ResponseCache::new();
        cache.put("k", json!(1), Duration::from_secs(60));
        cache.put("k", json!(2), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = ResponseCache::new();
        cache.put("k", json!(1), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }
}
