#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ratings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the mid-cap credit-rating collector.
//!
//! This crate provides the foundational abstractions shared by every stage of
//! the pipeline:
//!
//! - [`ExchangeProvider`](provider::ExchangeProvider) - Exchange adapter (symbols and quote detail)
//! - [`LinkResolver`](provider::LinkResolver) - Finds a company's latest rating disclosure
//! - [`DocumentSource`](provider::DocumentSource) - Turns a disclosure link into text
//! - [`PageRenderer`](provider::PageRenderer) - Full-browser page rendering
//! - [`DetailCache`](cache::DetailCache) - Time-bounded cache of quote details
//! - [`RateLimiter`](rate_limit::RateLimiter) - Minimum spacing between requests

/// Cache trait for quote details.
pub mod cache;
/// Error types for collector operations.
pub mod error;
/// Capability traits implemented by exchange, link and document adapters.
pub mod provider;
/// Minimum-interval request limiter.
pub mod rate_limit;
/// Core data types (Symbol, Entity, Record, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::{CACHE_TTL, DetailCache};
pub use error::{DataError, Result};
pub use provider::{DocumentSource, ExchangeProvider, LinkResolver, PageRenderer};
pub use rate_limit::RateLimiter;
pub use types::{Entity, Exchange, Record, RetrievalResult, Symbol};
