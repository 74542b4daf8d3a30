#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ratings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "chromium")]
//! # async fn example() -> ratings_core::Result<()> {
//! use std::sync::Arc;
//! use ratings_core::DocumentSource;
//! use ratings_docs::{ChromiumRenderer, DocumentRetriever};
//!
//! let retriever = DocumentRetriever::new(Arc::new(ChromiumRenderer::new()))?;
//! if let Some(result) = retriever.retrieve("https://www.careratings.com/upload/report.pdf").await {
//!     println!("{:?}", result.pdf_text);
//! }
//! # Ok(())
//! # }
//! ```

/// Embedded viewer discovery and URL rewriting.
pub mod embed;
/// PDF text extraction.
pub mod pdf;
/// Headless browser rendering.
#[cfg(feature = "chromium")]
pub mod render;
/// The three-stage retriever.
pub mod retriever;
/// HTML visible-text normalization.
pub mod text;

pub use embed::{ViewerRewriteRule, find_embedded_source, resolve_against_origin, rewrite_viewer_url};
pub use pdf::{PdfExtract, PdfTextExtractor, join_pages};
#[cfg(feature = "chromium")]
pub use render::{ChromiumRenderer, RenderConfig};
pub use retriever::{DocumentRetriever, RetrieverConfig};
pub use text::normalize_page_text;
