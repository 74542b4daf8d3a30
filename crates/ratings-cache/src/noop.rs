//! No-op cache implementation.

use async_trait::async_trait;
use ratings_core::{DetailCache, Result, Symbol};
use serde_json::Value;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always returns `Ok(None)` and `put` returns `Ok(())`, so every detail
/// lookup goes to the exchange and counts against the call budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DetailCache for NoopCache {
    async fn get(&self, _symbol: &Symbol) -> Result<Option<Value>> {
        trace!("NoopCache: get called, returning None");
        Ok(None)
    }

    async fn put(&self, _symbol: &Symbol, _payload: &Value) -> Result<()> {
        trace!("NoopCache: put called, doing nothing");
        Ok(())
    }

    async fn invalidate_stale(&self) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_cache_never_hits() {
        let cache = NoopCache::new();
        let symbol = Symbol::new("ABC");
        cache.put(&symbol, &json!({"a": 1})).await.unwrap();
        assert!(cache.get(&symbol).await.unwrap().is_none());
        assert_eq!(cache.invalidate_stale().await.unwrap(), 0);
    }
}
