//! Cache trait for storing fetched quote details.
//!
//! This module defines the [`DetailCache`] trait that provides a unified
//! interface for caching the opaque per-symbol detail payloads returned by an
//! exchange.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

use crate::{error::Result, types::Symbol};

/// Default time-to-live of a cached detail payload (2 days).
pub const CACHE_TTL: Duration = Duration::from_secs(2 * 24 * 60 * 60);

/// Trait for caching fetched quote details.
///
/// Entries older than [`ttl`](DetailCache::ttl) are treated as absent and are
/// never served. Eviction is lazy: a stale entry stays on disk until it is
/// overwritten or [`invalidate_stale`](DetailCache::invalidate_stale) runs.
#[async_trait]
pub trait DetailCache: Send + Sync + Debug {
    /// Retrieves the cached detail for a symbol.
    ///
    /// Returns `Ok(Some(payload))` for a fresh entry, `Ok(None)` if the entry
    /// is missing or stale.
    async fn get(&self, symbol: &Symbol) -> Result<Option<Value>>;

    /// Stores a detail payload stamped with the current time.
    async fn put(&self, symbol: &Symbol, payload: &Value) -> Result<()>;

    /// Removes entries older than the TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;

    /// Returns the time-to-live applied by this cache.
    fn ttl(&self) -> Duration {
        CACHE_TTL
    }
}
