//! JSON-file cache implementation.

use async_trait::async_trait;
use ratings_core::{CACHE_TTL, DataError, DetailCache, Result, Symbol};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::entry::CacheEntry;

type Entries = BTreeMap<String, CacheEntry>;

/// Cache persisted as a single JSON document.
///
/// The document maps each symbol to a [`CacheEntry`]. Every save reads the
/// whole file, updates it and writes it back, so the cache is only safe with a
/// single writer process. Freshness is checked twice: a file whose
/// modification time is older than the TTL is treated as empty, and within a
/// fresh file each entry is checked against its own timestamp.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    ttl: Duration,
    lock: Mutex<()>,
}

impl JsonFileCache {
    /// Create a cache backed by the file at `path` with the default 2-day TTL.
    ///
    /// The file is created lazily on the first save.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ttl: CACHE_TTL,
            lock: Mutex::new(()),
        }
    }

    /// Set a custom time-to-live.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_is_stale(&self, modified: SystemTime) -> bool {
        SystemTime::now()
            .duration_since(modified)
            .map(|age| age > self.ttl)
            .unwrap_or(false)
    }

    /// Load all entries, treating a missing, stale or malformed file as empty.
    fn load(&self) -> Result<Entries> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(DataError::Cache(e.to_string())),
        };

        if let Ok(modified) = metadata.modified() {
            if self.file_is_stale(modified) {
                debug!(path = %self.path.display(), "Cache file older than TTL, ignoring");
                return Ok(Entries::new());
            }
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| DataError::Cache(e.to_string()))?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed cache file, starting empty");
                Ok(Entries::new())
            }
        }
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DataError::Cache(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| DataError::Cache(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| DataError::Cache(e.to_string()))
    }
}

#[async_trait]
impl DetailCache for JsonFileCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get(&self, symbol: &Symbol) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let entries = self.load()?;
        match entries.get(symbol.as_str()) {
            Some(entry) if !entry.is_stale(self.ttl) => {
                debug!("Cache hit for detail");
                Ok(Some(entry.payload.clone()))
            }
            Some(_) => {
                debug!("Cached detail is stale");
                Ok(None)
            }
            None => {
                debug!("Cache miss for detail");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, payload), fields(symbol = %symbol))]
    async fn put(&self, symbol: &Symbol, payload: &Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load()?;
        entries.insert(symbol.to_string(), CacheEntry::new(payload.clone()));
        self.save(&entries)?;
        debug!(entries = entries.len(), "Cached detail");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale(self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            self.save(&entries)?;
            debug!("Invalidated {} stale cache entries", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DataError::Cache(e.to_string())),
        }
        debug!("Cleared cache file");
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

    fn detail(price: f64) -> Value {
        json!({
            "info": {"symbol": "ABC", "companyName": "Abc Ltd"},
            "priceInfo": {"lastPrice": price},
            "securityInfo": {"issuedSize": 1_000_000}
        })
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path().join("stock_cache.json"));
        let symbol = Symbol::new("ABC");

        assert!(cache.get(&symbol).await.unwrap().is_none());

        cache.put(&symbol, &detail(10.0)).await.unwrap();
        let cached = cache.get(&symbol).await.unwrap();
        assert_eq!(cached, Some(detail(10.0)));
    }

    #[tokio::test]
    async fn test_long_decimals_survive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path().join("cache.json"));
        let symbol = Symbol::new("ABC");

        for text in [
            r#"{"v":11.57142857142857117}"#,
            r#"{"priceInfo":{"lastPrice":1250.55,"pChange":-3.3333333333333335,"vwap":987.1234567890123}}"#,
            r#"{"securityInfo":{"issuedSize":123456789012},"ratio":0.30000000000000004}"#,
        ] {
            let fetched: Value = serde_json::from_str(text).unwrap();
            cache.put(&symbol, &fetched).await.unwrap();
            let cached = cache.get(&symbol).await.unwrap().unwrap();
            assert_eq!(
                serde_json::to_vec(&fetched).unwrap(),
                serde_json::to_vec(&cached).unwrap(),
                "{text}"
            );
        }
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = JsonFileCache::new(&path);
        cache.put(&Symbol::new("ABC"), &detail(1.0)).await.unwrap();
        cache.put(&Symbol::new("XYZ"), &detail(2.0)).await.unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["ABC"]["timestamp"].is_string());
        assert_eq!(raw["XYZ"]["payload"]["priceInfo"]["lastPrice"], 2.0);
    }

    #[tokio::test]
    async fn test_stale_entry_not_served() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut entries = Entries::new();
        entries.insert(
            "OLD".to_string(),
            CacheEntry::at(detail(1.0), Utc::now() - TimeDelta::days(3)),
        );
        entries.insert("NEW".to_string(), CacheEntry::new(detail(2.0)));
        fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let cache = JsonFileCache::new(&path);
        assert!(cache.get(&Symbol::new("OLD")).await.unwrap().is_none());
        assert_eq!(
            cache.get(&Symbol::new("NEW")).await.unwrap(),
            Some(detail(2.0))
        );

        assert_eq!(cache.invalidate_stale().await.unwrap(), 1);
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("OLD").is_none());
        assert!(raw.get("NEW").is_some());
    }

    #[tokio::test]
    async fn test_stale_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = JsonFileCache::new(&path);
        cache.put(&Symbol::new("ABC"), &detail(1.0)).await.unwrap();

        let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(3 * 24 * 60 * 60))
            .unwrap();
        drop(file);

        assert!(cache.get(&Symbol::new("ABC")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        let cache = JsonFileCache::new(&path);
        assert!(cache.get(&Symbol::new("ABC")).await.unwrap().is_none());

        cache.put(&Symbol::new("ABC"), &detail(3.0)).await.unwrap();
        assert_eq!(
            cache.get(&Symbol::new("ABC")).await.unwrap(),
            Some(detail(3.0))
        );
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let cache = JsonFileCache::new(&path);
        cache.put(&Symbol::new("ABC"), &detail(1.0)).await.unwrap();
        assert!(path.exists());

        cache.clear().await.unwrap();
        assert!(!path.exists());
        cache.clear().await.unwrap();
    }
}
