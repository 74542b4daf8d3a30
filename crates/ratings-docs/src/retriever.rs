//! Three-stage disclosure retrieval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ratings_core::{DataError, DocumentSource, PageRenderer, Result, RetrievalResult};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::embed::{
    DEFAULT_FRAME_SELECTOR, DEFAULT_HOLDER_SELECTOR, ViewerRewriteRule, find_embedded_source,
    resolve_against_origin, rewrite_viewer_url,
};
use crate::pdf::{PdfExtract, PdfTextExtractor, is_pdf_content_type};
use crate::text::normalize_page_text;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Where embedded documents live on a rendered page and how viewer URLs map
/// to downloads.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// CSS selector of the document holder container.
    pub holder_selector: String,
    /// CSS selector of the frame inside the holder.
    pub frame_selector: String,
    /// Viewer-to-download rewrites, tried in order.
    pub rewrite_rules: Vec<ViewerRewriteRule>,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            holder_selector: DEFAULT_HOLDER_SELECTOR.to_string(),
            frame_selector: DEFAULT_FRAME_SELECTOR.to_string(),
            rewrite_rules: vec![ViewerRewriteRule::rational_report()],
        }
    }
}

/// A fetched HTTP body with its declared content type.
struct Fetched {
    content_type: String,
    body: Vec<u8>,
}

/// Retrieves disclosure text from a link.
///
/// Stages run in order and the first that applies wins:
///
/// 1. A plain GET. If the response is a PDF its text is returned alone and the
///    browser is never started.
/// 2. The page is rendered in a browser and its visible text normalized.
/// 3. If the rendered page embeds a document viewer, the document is
///    downloaded and its text returned alongside the page text.
///
/// Any transport failure aborts the whole retrieval.
#[derive(Debug, Clone)]
pub struct DocumentRetriever {
    client: reqwest::Client,
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<dyn PdfTextExtractor>,
    config: RetrieverConfig,
}

impl DocumentRetriever {
    /// Create a retriever that renders pages with `renderer`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            renderer,
            extractor: Arc::new(PdfExtract::new()),
            config: RetrieverConfig::default(),
        })
    }

    /// Replace the embed configuration.
    #[must_use]
    pub fn with_config(mut self, config: RetrieverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the PDF text extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn PdfTextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Get the embed configuration.
    #[must_use]
    pub const fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Run the retrieval stages, surfacing the first error.
    ///
    /// # Errors
    /// Returns the error of whichever stage failed.
    #[instrument(skip(self))]
    pub async fn try_retrieve(&self, url: &str) -> Result<RetrievalResult> {
        let direct = self.fetch(url).await?;
        if is_pdf_content_type(&direct.content_type) {
            info!("Direct PDF link detected, processing PDF content");
            let pdf_text = self.extractor.extract_text(&direct.body)?;
            return Ok(RetrievalResult::pdf_only(pdf_text));
        }

        info!("Rendering page to get fully loaded content");
        let html = self.renderer.render(url).await?;
        let page_text = normalize_page_text(&html);

        let Some(src) = find_embedded_source(
            &html,
            &self.config.holder_selector,
            &self.config.frame_selector,
        )?
        else {
            return Ok(RetrievalResult::page_only(page_text));
        };

        let rewritten = rewrite_viewer_url(&src, &self.config.rewrite_rules);
        let document_url = resolve_against_origin(&rewritten, url)?;
        info!(document = %document_url, "Fetching embedded document");

        let embedded = self.fetch(document_url.as_str()).await?;
        if !is_pdf_content_type(&embedded.content_type) {
            let mismatch = DataError::ContentTypeMismatch {
                expected: "application/pdf".to_string(),
                actual: embedded.content_type,
            };
            error!("{mismatch}");
            return Ok(RetrievalResult::page_only(page_text));
        }

        let pdf_text = self.extractor.extract_text(&embedded.body)?;
        info!("Successfully fetched page text and PDF content");
        Ok(RetrievalResult::page_with_pdf(page_text, pdf_text))
    }

    async fn fetch(&self, url: &str) -> Result<Fetched> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = response
            .bytes()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?
            .to_vec();

        Ok(Fetched { content_type, body })
    }
}

#[async_trait]
impl DocumentSource for DocumentRetriever {
    async fn retrieve(&self, url: &str) -> Option<RetrievalResult> {
        match self.try_retrieve(url).await {
            Ok(result) => Some(result),
            Err(e) if e.is_transport() => {
                warn!(url = %url, error = %e, "Error fetching content");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Unexpected error while parsing content");
                None
            }
        }
    }
}
