//! Idempotent rating collection.

use std::sync::Arc;
use std::time::Duration;

use ratings_core::{DocumentSource, Entity, LinkResolver, Record};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::store::RecordStore;

/// Pause between entities.
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_secs(2);

/// Collection settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Delay after each stored record.
    pub politeness_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            politeness_delay: DEFAULT_POLITENESS_DELAY,
        }
    }
}

impl CollectorConfig {
    /// Set the politeness delay.
    #[must_use]
    pub const fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }
}

/// What happened to each entity of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Records appended.
    pub collected: usize,
    /// Entities already in the store.
    pub skipped_existing: usize,
    /// Entities with no disclosure link.
    pub skipped_no_link: usize,
    /// Entities whose disclosure yielded no content.
    pub skipped_no_content: usize,
    /// Entities whose record could not be written.
    pub failed: usize,
}

/// Walks eligible entities and stores each one's latest disclosure once.
#[derive(Debug)]
pub struct CollectionOrchestrator {
    resolver: Arc<dyn LinkResolver>,
    source: Arc<dyn DocumentSource>,
    store: RecordStore,
    config: CollectorConfig,
}

impl CollectionOrchestrator {
    /// Create an orchestrator writing to `store`.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn LinkResolver>,
        source: Arc<dyn DocumentSource>,
        store: RecordStore,
    ) -> Self {
        Self {
            resolver,
            source,
            store,
            config: CollectorConfig::default(),
        }
    }

    /// Replace the collection settings.
    #[must_use]
    pub fn with_config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the record store.
    #[must_use]
    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Collect ratings for `entities`, in order.
    ///
    /// An entity that fails at any step is logged and skipped; the batch
    /// always runs to the end.
    pub async fn collect(&mut self, entities: &[Entity]) -> CollectionSummary {
        let mut summary = CollectionSummary::default();
        if entities.is_empty() {
            warn!("No eligible stocks provided");
            return summary;
        }
        info!(count = entities.len(), "Starting to collect ratings");

        for entity in entities {
            let symbol = &entity.symbol;
            info!(symbol = %symbol, "Processing");

            if self.store.contains(symbol) {
                info!(symbol = %symbol, "Ratings already exist, skipping");
                summary.skipped_existing += 1;
                continue;
            }

            let link = match self.resolver.resolve(symbol).await {
                Ok(Some(link)) => link,
                Ok(None) => {
                    warn!(symbol = %symbol, "No credit ratings found");
                    summary.skipped_no_link += 1;
                    continue;
                }
                Err(e) => {
                    warn!(symbol = %symbol, resolver = self.resolver.name(), error = %e, "Link lookup failed");
                    summary.skipped_no_link += 1;
                    continue;
                }
            };

            let Some(result) = self.source.retrieve(&link).await else {
                warn!(symbol = %symbol, link = %link, "Could not fetch content");
                summary.skipped_no_content += 1;
                continue;
            };

            let record = Record::new(entity, link, result);
            match self.store.append(&record) {
                Ok(()) => summary.collected += 1,
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "Failed to store record");
                    summary.failed += 1;
                }
            }

            sleep(self.config.politeness_delay).await;
        }

        info!(
            collected = summary.collected,
            skipped_existing = summary.skipped_existing,
            skipped_no_link = summary.skipped_no_link,
            skipped_no_content = summary.skipped_no_content,
            failed = summary.failed,
            "Completed collecting ratings"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ratings_core::{DataError, Exchange, Result, RetrievalResult, Symbol};
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct MockResolver {
        links: HashMap<Symbol, String>,
        calls: AtomicUsize,
    }

    impl MockResolver {
        fn with(links: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                links: links
                    .iter()
                    .map(|(s, l)| (Symbol::new(*s), (*l).to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LinkResolver for MockResolver {
        fn name(&self) -> &str {
            "mock"
        }

        async fn resolve(&self, symbol: &Symbol) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol.as_str() == "BROKEN" {
                return Err(DataError::Network("timeout".to_string()));
            }
            Ok(self.links.get(symbol).cloned())
        }
    }

    /// Serves page text for every link except those containing "empty".
    #[derive(Debug, Default)]
    struct MockSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentSource for MockSource {
        async fn retrieve(&self, url: &str) -> Option<RetrievalResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (!url.contains("empty")).then(|| RetrievalResult::page_only(format!("text of {url}")))
        }
    }

    fn entity(symbol: &str) -> Entity {
        Entity::new(Symbol::new(symbol), format!("{symbol} Ltd"), 250.0, Exchange::Nse)
    }

    fn orchestrator(
        path: &std::path::Path,
        resolver: Arc<MockResolver>,
        source: Arc<MockSource>,
    ) -> CollectionOrchestrator {
        CollectionOrchestrator::new(resolver, source, RecordStore::open(path).unwrap())
            .with_config(CollectorConfig::default().with_politeness_delay(Duration::ZERO))
    }

    #[tokio::test]
    async fn test_collect_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.txt");
        let resolver = MockResolver::with(&[("ABC", "https://r/abc"), ("XYZ", "https://r/xyz")]);
        let source = Arc::new(MockSource::default());
        let entities = vec![entity("ABC"), entity("XYZ")];

        let first = orchestrator(&path, resolver.clone(), source.clone())
            .collect(&entities)
            .await;
        assert_eq!(first.collected, 2);

        let second = orchestrator(&path, resolver.clone(), source.clone())
            .collect(&entities)
            .await;
        assert_eq!(second.collected, 0);
        assert_eq!(second.skipped_existing, 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Stock: ABC\n").count(), 1);
        assert_eq!(content.matches("Stock: XYZ\n").count(), 1);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stored_symbol_makes_no_calls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.txt");
        fs::write(&path, "\nStock: ABC\nTimestamp: 2024-01-01 00:00:00\n").unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let resolver = MockResolver::with(&[("ABC", "https://r/abc")]);
        let source = Arc::new(MockSource::default());
        let summary = orchestrator(&path, resolver.clone(), source.clone())
            .collect(&[entity("ABC")])
            .await;

        assert_eq!(summary.skipped_existing, 1);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.txt");
        let resolver = MockResolver::with(&[("EMPTY", "https://r/empty"), ("OK", "https://r/ok")]);
        let source = Arc::new(MockSource::default());

        let mut collector = orchestrator(&path, resolver, source);
        let summary = collector
            .collect(&[entity("NOLINK"), entity("BROKEN"), entity("EMPTY"), entity("OK")])
            .await;

        assert_eq!(
            summary,
            CollectionSummary {
                collected: 1,
                skipped_existing: 0,
                skipped_no_link: 2,
                skipped_no_content: 1,
                failed: 0,
            }
        );
        assert!(collector.store().contains(&Symbol::new("OK")));
        assert!(!collector.store().contains(&Symbol::new("EMPTY")));

        let sections = collector.store().sections().unwrap();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].body.contains("Rating Link: https://r/ok"));
        assert!(sections[0].body.contains("text of https://r/ok"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dir = TempDir::new().unwrap();
        let summary = orchestrator(
            &dir.path().join("ratings.txt"),
            MockResolver::with(&[]),
            Arc::new(MockSource::default()),
        )
        .collect(&[])
        .await;
        assert_eq!(summary, CollectionSummary::default());
    }
}
