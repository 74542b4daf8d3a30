//! Timestamped cache entry.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Cache entry with timestamp for TTL-based invalidation.
///
/// Serialized as `{"timestamp": "<ISO8601>", "payload": <detail>}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the payload was fetched.
    pub timestamp: DateTime<Utc>,
    /// Opaque detail payload as returned by the exchange.
    pub payload: Value,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(payload: Value) -> Self {
        Self::at(payload, Utc::now())
    }

    /// Creates an entry with an explicit timestamp.
    #[must_use]
    pub const fn at(payload: Value, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, payload }
    }

    /// Returns true if the entry is older than `ttl`.
    #[must_use]
    pub fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.timestamp);
        age > TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_entry() {
        let entry = CacheEntry::new(json!({"a": 1}));
        assert!(!entry.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_stale_entry() {
        let entry = CacheEntry::at(json!({}), Utc::now() - TimeDelta::days(3));
        assert!(entry.is_stale(ratings_core::CACHE_TTL));
        assert!(!entry.is_stale(Duration::from_secs(4 * 24 * 60 * 60)));
    }

    #[test]
    fn test_serialized_shape() {
        let entry = CacheEntry::new(json!({"priceInfo": {"lastPrice": 10}}));
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value["timestamp"].is_string());
        assert_eq!(value["payload"]["priceInfo"]["lastPrice"], 10);
    }
}
