//! In-memory cache implementation.

use async_trait::async_trait;
use ratings_core::{CACHE_TTL, DetailCache, Result, Symbol};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::entry::CacheEntry;

/// Simple in-memory cache for testing and development.
///
/// Entries are stored in a `RwLock`-protected `HashMap` and are lost when the
/// cache is dropped. Payloads are cloned on get/put operations.
#[derive(Debug)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<Symbol, CacheEntry>>,
    ttl: Duration,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache with the default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// Create a new empty in-memory cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Insert a pre-built entry, keeping its timestamp.
    pub async fn insert_entry(&self, symbol: Symbol, entry: CacheEntry) {
        self.entries.write().await.insert(symbol, entry);
    }

    /// Returns the number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DetailCache for InMemoryCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get(&self, symbol: &Symbol) -> Result<Option<Value>> {
        let cache = self.entries.read().await;
        match cache.get(symbol) {
            Some(entry) if !entry.is_stale(self.ttl) => {
                debug!("Cache hit for detail");
                Ok(Some(entry.payload.clone()))
            }
            _ => {
                debug!("Cache miss for detail");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, payload), fields(symbol = %symbol))]
    async fn put(&self, symbol: &Symbol, payload: &Value) -> Result<()> {
        let mut cache = self.entries.write().await;
        cache.insert(symbol.clone(), CacheEntry::new(payload.clone()));
        debug!("Cached detail");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self) -> Result<usize> {
        let mut cache = self.entries.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(self.ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("ABC");

        // Initially no data
        assert!(cache.get(&symbol).await.unwrap().is_none());

        let payload = json!({"priceInfo": {"lastPrice": 12.5}});
        cache.put(&symbol, &payload).await.unwrap();

        assert_eq!(cache.get(&symbol).await.unwrap(), Some(payload));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_stale_entries() {
        let cache = InMemoryCache::new();
        let old = Symbol::new("OLD");
        cache
            .insert_entry(
                old.clone(),
                CacheEntry::at(json!({}), Utc::now() - TimeDelta::days(3)),
            )
            .await;
        cache.put(&Symbol::new("NEW"), &json!({})).await.unwrap();

        assert!(cache.get(&old).await.unwrap().is_none());
        assert_eq!(cache.invalidate_stale().await.unwrap(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_cache_clear() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("ABC");
        cache.put(&symbol, &json!({"a": 1})).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.get(&symbol).await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }
}
