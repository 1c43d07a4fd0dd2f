use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::api::transport::HttpMethod;

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub payload: Value,
    pub stored_at: Instant,
}

impl CachedResponse {
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.stored_at)
    }
}

/// Result of looking an entry up without evicting it.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(Value),
    Expired(Value),
    Miss,
}

/// In-memory cache of parsed GET responses, owned by one client.
///
/// Entries are fresh while `now - stored_at < ttl`. `get` evicts expired
/// entries; `lookup` leaves them in place so they can still serve as a
/// last-resort fallback when the backend is unreachable. Past
/// `ttl + stale_retention` an entry is retired: it is never served and is
/// dropped on the next `set`. `set` also caps the map at `max_entries` by
/// evicting the oldest entries.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CachedResponse>,
    ttl: Duration,
    stale_retention: Duration,
    max_entries: usize,
}

impl ResponseCache {
    pub const DEFAULT_STALE_RETENTION: Duration = Duration::from_secs(30 * 60);
    pub const DEFAULT_MAX_ENTRIES: usize = 256;

    pub fn new(ttl: Duration) -> Self {
        Self::with_limits(ttl, Self::DEFAULT_STALE_RETENTION, Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_limits(ttl: Duration, stale_retention: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            stale_retention,
            max_entries: max_entries.max(1),
        }
    }

    /// `GET:/products:` for a body-less GET of `/products`.
    pub fn key(method: HttpMethod, endpoint: &str, body: &str) -> String {
        format!("{}:{}:{}", method.as_str(), endpoint, body)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CachedResponse) -> bool {
        entry.age() < self.ttl
    }

    fn is_retired(&self, entry: &CachedResponse) -> bool {
        entry.age() >= self.ttl.saturating_add(self.stale_retention)
    }

    /// Fresh value for `key`; an expired entry is evicted and yields `None`.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let fresh = match self.entries.get(key) {
            Some(entry) => self.is_fresh(entry),
            None => return None,
        };
        if fresh {
            self.entries.get(key).map(|e| e.payload.clone())
        } else {
            debug!(key, "Evicting expired cache entry");
            self.entries.remove(key);
            None
        }
    }

    pub fn lookup(&self, key: &str) -> CacheLookup {
        match self.entries.get(key) {
            Some(entry) if self.is_fresh(entry) => CacheLookup::Fresh(entry.payload.clone()),
            Some(entry) if !self.is_retired(entry) => CacheLookup::Expired(entry.payload.clone()),
            _ => CacheLookup::Miss,
        }
    }

    /// Any value for `key` that is not yet retired, fresh or not.
    pub fn get_stale(&self, key: &str) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|e| !self.is_retired(e))
            .map(|e| e.payload.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, payload: Value) {
        self.entries.insert(
            key.into(),
            CachedResponse {
                payload,
                stored_at: Instant::now(),
            },
        );
        self.purge_retired();
        self.enforce_capacity();
    }

    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "Clearing response cache");
        self.entries.clear();
    }

    /// Drop every entry past the stale-retention window, returning how many
    /// were removed.
    pub fn purge_retired(&mut self) -> usize {
        let limit = self.ttl.saturating_add(self.stale_retention);
        let before = self.entries.len();
        self.entries.retain(|_, e| e.age() < limit);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "Purged retired cache entries");
        }
        removed
    }

    fn enforce_capacity(&mut self) {
        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    debug!(key, "Cache full, evicting oldest entry");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_key_format() {
        assert_eq!(ResponseCache::key(HttpMethod::Get, "/products", ""), "GET:/products:");
        assert_eq!(
            ResponseCache::key(HttpMethod::Post, "/appointments", r#"{"a":1}"#),
            r#"POST:/appointments:{"a":1}"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_returned() {
        let mut cache = ResponseCache::new(TTL);
        cache.set("GET:/products:", json!({"success": true}));
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("GET:/products:"), Some(json!({"success": true})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_by_get() {
        let mut cache = ResponseCache::new(TTL);
        cache.set("k", json!(1));
        tokio::time::advance(TTL).await;
        assert_eq!(cache.lookup("k"), CacheLookup::Expired(json!(1)));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
        assert_eq!(cache.get_stale("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_keeps_expired_entries_for_fallback() {
        let mut cache = ResponseCache::new(TTL);
        cache.set("k", json!("old"));
        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(cache.lookup("k"), CacheLookup::Expired(json!("old")));
        assert_eq!(cache.get_stale("k"), Some(json!("old")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_and_clear() {
        let mut cache = ResponseCache::with_limits(TTL, Duration::from_secs(600), 16);
        cache.set("old", json!(1));
        tokio::time::advance(Duration::from_secs(400)).await;
        cache.set("new", json!(2));
        // Expired but still inside the retention window
        assert_eq!(cache.purge_retired(), 0);
        assert_eq!(cache.get_stale("old"), Some(json!(1)));

        tokio::time::advance(Duration::from_secs(500)).await;
        assert_eq!(cache.purge_retired(), 1);
        assert_eq!(cache.lookup("new"), CacheLookup::Expired(json!(2)));

        cache.clear();
        assert_eq!(cache.lookup("new"), CacheLookup::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retired_entries_are_not_served_and_dropped_on_set() {
        let mut cache = ResponseCache::with_limits(TTL, Duration::from_secs(600), 16);
        cache.set("q0", json!("old"));
        tokio::time::advance(TTL + Duration::from_secs(600)).await;

        assert_eq!(cache.lookup("q0"), CacheLookup::Miss);
        assert_eq!(cache.get_stale("q0"), None);
        assert_eq!(cache.len(), 1);

        cache.set("q1", json!("new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_stale("q1"), Some(json!("new")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest_entries() {
        let mut cache = ResponseCache::with_limits(TTL, Duration::from_secs(600), 3);
        for i in 0..5 {
            cache.set(format!("q{}", i), json!(i));
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.lookup("q0"), CacheLookup::Miss);
        assert_eq!(cache.lookup("q1"), CacheLookup::Miss);
        assert_eq!(cache.lookup("q4"), CacheLookup::Fresh(json!(4)));
    }
}
