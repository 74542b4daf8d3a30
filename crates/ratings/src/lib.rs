#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ratings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratings::{
//!     ChromiumRenderer, CollectionOrchestrator, DocumentRetriever, ExchangeDiscovery,
//!     JsonFileCache, NseExchange, RecordStore, ScreenerLinkResolver,
//! };
//!
//! #[tokio::main]
//! async fn main() -> ratings::Result<()> {
//!     let discovery = ExchangeDiscovery::new(
//!         Arc::new(NseExchange::new()?),
//!         Arc::new(JsonFileCache::new("nse_cache.json")),
//!     );
//!     let entities = discovery.eligible_entities().await;
//!
//!     let retriever = DocumentRetriever::new(Arc::new(ChromiumRenderer::new()))?;
//!     let mut collector = CollectionOrchestrator::new(
//!         Arc::new(ScreenerLinkResolver::new()?),
//!         Arc::new(retriever),
//!         RecordStore::open("ratings.txt")?,
//!     );
//!     let summary = collector.collect(&entities).await;
//!     println!("{summary:?}");
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use ratings_core::*;

// Cache implementations
pub use ratings_cache::{CacheEntry, InMemoryCache, JsonFileCache, NoopCache};

// Adapters
#[cfg(feature = "chromium")]
pub use ratings_docs::{ChromiumRenderer, RenderConfig};
pub use ratings_docs::{DocumentRetriever, PdfExtract, PdfTextExtractor, RetrieverConfig, ViewerRewriteRule};
pub use ratings_nse::{NseConfig, NseExchange};
pub use ratings_screener::ScreenerLinkResolver;

/// Idempotent collection of rating disclosures.
pub mod collector;
/// Market-cap discovery over an exchange.
pub mod discovery;
/// Append-only record store.
pub mod store;

pub use collector::{CollectionOrchestrator, CollectionSummary, CollectorConfig};
pub use discovery::{
    DiscoveryConfig, ExchangeDiscovery, compute_market_cap, company_name, dedup_by_company_name,
};
pub use store::{RECORD_SEPARATOR, RecordSection, RecordStore, format_record};
