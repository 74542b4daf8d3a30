#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ratings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Quote-detail cache implementations.
//!
//! This crate provides implementations of the [`DetailCache`] trait from `ratings-core`:
//!
//! - [`JsonFileCache`] - Persistent JSON-file cache (the default for real runs)
//! - [`InMemoryCache`] - Simple in-memory cache for testing
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// Timestamped cache entry shared by the implementations.
pub mod entry;
/// JSON-file cache implementation.
pub mod json;
/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use ratings_core::{CACHE_TTL, DetailCache};

pub use entry::CacheEntry;
pub use json::JsonFileCache;
pub use memory::InMemoryCache;
pub use noop::NoopCache;
