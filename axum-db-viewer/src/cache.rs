//! Metadata cache
//!
//! Introspection results are cached through a [`CacheStore`] injected into the
//! [`SchemaIntrospector`](crate::SchemaIntrospector). Values are stored as
//! JSON so a single store can hold table lists, column lists and primary keys.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::Result;

const KEY_PREFIX: &str = "db_viewer_meta";

/// Key-value store with per-entry expiry
///
/// A missing or expired entry is a miss. Implementations must be safe to share
/// between concurrent requests; concurrent writers to one key may race, the
/// last one wins.
pub trait CacheStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value, ttl: Duration);
}

/// Cache store that never holds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl CacheStore for NoopCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set(&self, _key: &str, _value: Value, _ttl: Duration) {}
}

type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

#[derive(Debug, Clone)]
struct CachedValue {
    value: Value,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CachedValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// In-process cache store backed by a concurrent hash map
#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, CachedValue>>,
    clock: Clock,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Instant::now)
    }

    /// Create a cache that reads the current time from `clock`
    pub fn with_clock(clock: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock: Arc::new(clock),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove expired entries
    pub fn evict_expired(&self) {
        let now = (self.clock)();
        self.entries.retain(|_, entry| entry.is_live(now));
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = (self.clock)();
        let entry = self.entries.get(key)?;
        if entry.is_live(now) {
            return Some(entry.value.clone());
        }
        drop(entry);
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = (self.clock)().checked_add(ttl);
        self.entries
            .insert(key.to_string(), CachedValue { value, expires_at });
    }
}

/// Cache key made of a scope (what was computed) and an optional identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: &'static str,
    identifier: Option<String>,
}

impl CacheKey {
    pub fn tables() -> Self {
        Self {
            scope: "tables",
            identifier: None,
        }
    }

    pub fn columns(table: &str) -> Self {
        Self {
            scope: "columns",
            identifier: Some(table.to_string()),
        }
    }

    pub fn primary_key(table: &str) -> Self {
        Self {
            scope: "pk",
            identifier: Some(table.to_string()),
        }
    }

    pub fn row_counts() -> Self {
        Self {
            scope: "row_counts",
            identifier: None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(identifier) => write!(f, "{}:{}:{}", KEY_PREFIX, self.scope, identifier),
            None => write!(f, "{}:{}", KEY_PREFIX, self.scope),
        }
    }
}

/// Read-through wrapper around a [`CacheStore`] with a fixed TTL
#[derive(Clone)]
pub struct MetadataCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Return the cached value for `key`, or compute and store it
    ///
    /// With a zero TTL the store is never touched. Errors from `compute` are
    /// returned as-is and nothing is stored. An entry that no longer decodes
    /// into `T` counts as a miss.
    pub async fn remember<T, F, Fut>(&self, key: CacheKey, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.is_enabled() {
            return compute().await;
        }

        let key = key.to_string();
        if let Some(cached) = self.store.get(&key) {
            match serde_json::from_value(cached) {
                Ok(value) => {
                    debug!(key = %key, "Metadata cache hit");
                    return Ok(value);
                }
                Err(error) => debug!(key = %key, %error, "Discarding undecodable cache entry"),
            }
        }

        let value = compute().await?;
        self.store.set(&key, serde_json::to_value(&value)?, self.ttl);
        Ok(value)
    }
}

impl fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataCache").field("ttl", &self.ttl).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_cache_key_format() {
        assert_eq!(CacheKey::tables().to_string(), "db_viewer_meta:tables");
        assert_eq!(
            CacheKey::columns("users").to_string(),
            "db_viewer_meta:columns:users"
        );
        assert_eq!(CacheKey::primary_key("orders").to_string(), "db_viewer_meta:pk:orders");
    }

    #[test]
    fn test_memory_cache_expiry() {
        let base = Instant::now();
        let offset = Arc::new(AtomicU64::new(0));
        let clock_offset = offset.clone();
        let cache = MemoryCache::with_clock(move || {
            base + Duration::from_secs(clock_offset.load(Ordering::SeqCst))
        });

        cache.set("key", Value::from(1), Duration::from_secs(10));
        assert_eq!(cache.get("key"), Some(Value::from(1)));

        offset.store(9, Ordering::SeqCst);
        assert_eq!(cache.get("key"), Some(Value::from(1)));

        offset.store(10, Ordering::SeqCst);
        assert_eq!(cache.get("key"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("key", Value::from(1), Duration::from_secs(u64::MAX));
        cache.evict_expired();
        assert_eq!(cache.get("key"), Some(Value::from(1)));
    }

    #[test]
    fn test_evict_expired() {
        let base = Instant::now();
        let offset = Arc::new(AtomicU64::new(0));
        let clock_offset = offset.clone();
        let cache = MemoryCache::with_clock(move || {
            base + Duration::from_secs(clock_offset.load(Ordering::SeqCst))
        });

        cache.set("short", Value::Null, Duration::from_secs(1));
        cache.set("long", Value::Null, Duration::from_secs(100));
        offset.store(5, Ordering::SeqCst);
        cache.evict_expired();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[tokio::test]
    async fn test_remember_computes_once_within_ttl() {
        let cache = MetadataCache::new(Arc::new(MemoryCache::new()), Duration::from_secs(60));
        let calls = AtomicU64::new(0);

        for _ in 0..3 {
            let tables: Vec<String> = cache
                .remember(CacheKey::tables(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["users".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(tables, vec!["users".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remember_with_zero_ttl_bypasses_store() {
        let store = Arc::new(MemoryCache::new());
        let cache = MetadataCache::new(store.clone(), Duration::ZERO);
        let calls = AtomicU64::new(0);

        for _ in 0..2 {
            let _: Option<String> = cache
                .remember(CacheKey::primary_key("users"), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some("id".to_string()))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remember_does_not_store_errors() {
        let store = Arc::new(MemoryCache::new());
        let cache = MetadataCache::new(store.clone(), Duration::from_secs(60));

        let result: Result<Vec<String>> = cache
            .remember(CacheKey::columns("ghost"), || async {
                Err(crate::Error::TableNotFound("ghost".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_noop_cache_never_hits() {
        let cache = NoopCache;
        cache.set("key", Value::from(true), Duration::from_secs(60));
        assert_eq!(cache.get("key"), None);
    }
}
