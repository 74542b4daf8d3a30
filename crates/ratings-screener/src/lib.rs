#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ratings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Screener.in link discovery.
//!
//! # Example
//!
//! ```no_run
//! use ratings_screener::ScreenerLinkResolver;
//! use ratings_core::{LinkResolver, Symbol};
//!
//! # async fn example() -> ratings_core::Result<()> {
//! let resolver = ScreenerLinkResolver::new()?;
//! if let Some(link) = resolver.resolve(&Symbol::new("PARKHOTELS")).await? {
//!     println!("Latest rating: {link}");
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use ratings_core::{DataError, LinkResolver, Result, Symbol};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

/// Screener.in base URL.
pub const SCREENER_BASE_URL: &str = "https://www.screener.in";

/// The credit-ratings document list on a company profile.
const CREDIT_RATINGS_LIST: &str =
    "#documents > div.flex-row.flex-gap-small > div.documents.credit-ratings.flex-column > div > ul";

/// Links inside a list entry.
const ENTRY_LINK: &str = "li > a[href]";

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Resolves rating disclosure links from Screener.in company profiles.
#[derive(Debug, Clone)]
pub struct ScreenerLinkResolver {
    client: reqwest::Client,
    base_url: Url,
}

impl ScreenerLinkResolver {
    /// Create a resolver against the public Screener.in site.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_base_url(SCREENER_BASE_URL)
    }

    /// Create a resolver against a different host (a mirror or a test server).
    ///
    /// # Errors
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DataError::InvalidParameter(format!("Invalid base URL {base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Build the company profile URL for a symbol.
    fn profile_url(&self, symbol: &Symbol) -> Result<Url> {
        self.base_url
            .join(&format!("company/{}/", symbol.as_str()))
            .map_err(|e| DataError::InvalidParameter(format!("Invalid symbol {symbol}: {e}")))
    }
}

#[async_trait]
impl LinkResolver for ScreenerLinkResolver {
    fn name(&self) -> &str {
        "Screener.in"
    }

    async fn resolve(&self, symbol: &Symbol) -> Result<Option<String>> {
        let url = self.profile_url(symbol)?;
        info!("Fetching data from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let link = latest_rating_link(&html, &self.base_url)?;
        match &link {
            Some(link) => info!(symbol = %symbol, "Found credit rating link: {}", link),
            None => warn!(symbol = %symbol, "No credit rating links found"),
        }
        Ok(link)
    }
}

/// Extract the newest credit-rating link from a profile page.
///
/// Returns `Ok(None)` when the page has no credit-ratings list or the list is
/// empty. Relative links are resolved against `base`.
pub fn latest_rating_link(html: &str, base: &Url) -> Result<Option<String>> {
    let list_selector = parse_selector(CREDIT_RATINGS_LIST)?;
    let link_selector = parse_selector(ENTRY_LINK)?;

    let document = Html::parse_document(html);
    let Some(list) = document.select(&list_selector).next() else {
        debug!("Credit ratings section not found");
        return Ok(None);
    };

    let Some(href) = list
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
    else {
        return Ok(None);
    };

    let absolute = base
        .join(href)
        .map_err(|e| DataError::Parse(format!("Invalid rating link {href}: {e}")))?;
    Ok(Some(absolute.to_string()))
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| DataError::Parse(format!("Invalid CSS selector {selector}: {e:?}")))
}
