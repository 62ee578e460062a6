//! # Keyed Query Cache
//!
//! An explicit read-through cache for list queries. Keys name the
//! entity and the query (`"signatures?search=ana"`), values are the
//! serialized response envelope. Every mutation handler calls
//! [`QueryCache::invalidate_prefix`] with its entity name, so a write
//! to one entity never evicts another entity's cached lists.
//!
//! Entries also expire by TTL, which bounds staleness if an
//! invalidation is ever missed (e.g., a write applied directly to the
//! database).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Default entry lifetime. Matches the refetch window the web client
/// used for list queries.
const DEFAULT_TTL: Duration = Duration::from_secs(30);

struct CacheEntry {
    value: serde_json::Value,
    cached_at: Instant,
}

/// Shared query cache handle.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

struct Inner {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                ttl,
            }),
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Look up a live entry. Expired entries read as absent and are
    /// evicted on the spot.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        {
            let entries = self.inner.entries.read();
            match entries.get(key) {
                Some(entry) if entry.cached_at.elapsed() < self.inner.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.inner.entries.write().remove(key);
        None
    }

    /// Store a value under a query key.
    pub fn put(&self, key: impl Into<String>, value: serde_json::Value) {
        self.inner.entries.write().insert(
            key.into(),
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`. Called by
    /// mutation handlers with the entity name.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.inner
            .entries
            .write()
            .retain(|key, _| !key.starts_with(prefix));
    }

    /// Number of stored entries, including any not yet expired-evicted.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(n: i64) -> serde_json::Value {
        serde_json::json!({ "n": n })
    }

    #[test]
    fn test_get_returns_stored_value() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put("signatures?search=", value(1));
        assert_eq!(cache.get("signatures?search="), Some(value(1)));
        assert_eq!(cache.get("signatures?search=ana"), None);
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = QueryCache::new(Duration::from_millis(10));
        cache.put("items?search=", value(1));
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("items?search="), None);
        // expired entry was evicted by the read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_prefix_scopes_to_entity() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put("signatures?search=", value(1));
        cache.put("signatures?search=ana", value(2));
        cache.put("clients?search=", value(3));

        cache.invalidate_prefix("signatures");

        assert_eq!(cache.get("signatures?search="), None);
        assert_eq!(cache.get("signatures?search=ana"), None);
        assert_eq!(cache.get("clients?search="), Some(value(3)));
    }

    #[test]
    fn test_put_overwrites() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.put("notes?search=", value(1));
        cache.put("notes?search=", value(2));
        assert_eq!(cache.get("notes?search="), Some(value(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clone_shares_entries() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let clone = cache.clone();
        cache.put("clients?search=", value(1));
        assert_eq!(clone.get("clients?search="), Some(value(1)));
    }
}
