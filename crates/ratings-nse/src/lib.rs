#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ratings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! National Stock Exchange of India adapter.
//!
//! This crate provides an NSE adapter that implements the
//! [`ExchangeProvider`] trait from `ratings-core`.
//!
//! # Features
//!
//! - Cookie session priming through NSE's informational pages
//! - Symbol listing from the pre-open market endpoint
//! - Raw quote detail per symbol (price, issued size, company info)
//! - Built-in rate limiting (1 request per second by default)
//!
//! # Example
//!
//! ```no_run
//! use ratings_nse::NseExchange;
//! use ratings_core::{ExchangeProvider, Symbol};
//!
//! # async fn example() -> ratings_core::Result<()> {
//! let nse = NseExchange::new()?;
//! nse.establish_session().await?;
//!
//! let symbols = nse.list_symbols().await?;
//! println!("{} listed symbols", symbols.len());
//!
//! let detail = nse.fetch_detail(&Symbol::new("PARKHOTELS")).await?;
//! println!("{}", detail["priceInfo"]["lastPrice"]);
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ratings_core::{DataError, Exchange, ExchangeProvider, RateLimiter, Result, Symbol};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// NSE website base URL.
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";

/// Page visited after the home page to collect the market-data cookies.
const MARKET_PAGE_PATH: &str = "/market-data/live-equity-market";

/// Pre-open market listing; returns every listed instrument.
const PRE_OPEN_PATH: &str = "/api/market-data-pre-open";

/// Per-symbol quote endpoint.
const QUOTE_PATH: &str = "/api/quote-equity";

/// Pause after each priming request.
pub const DEFAULT_PRIMING_DELAY: Duration = Duration::from_secs(1);

/// Minimum spacing between any two NSE requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(1);

/// User agent for HTTP requests. NSE rejects non-browser agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Connection settings for [`NseExchange`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NseConfig {
    /// Base URL of the exchange website.
    pub base_url: String,
    /// Pause after each priming request.
    pub priming_delay: Duration,
    /// Minimum spacing between requests.
    pub rate_limit: Duration,
}

impl Default for NseConfig {
    fn default() -> Self {
        Self {
            base_url: NSE_BASE_URL.to_string(),
            priming_delay: DEFAULT_PRIMING_DELAY,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

impl NseConfig {
    /// Point the adapter at a different host (a mirror or a test server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the pause after each priming request.
    #[must_use]
    pub const fn with_priming_delay(mut self, delay: Duration) -> Self {
        self.priming_delay = delay;
        self
    }

    /// Set the minimum spacing between requests.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

/// National Stock Exchange of India adapter.
///
/// Implements [`ExchangeProvider`]. The HTTP client keeps a cookie store, so
/// the cookies collected by [`establish_session`](ExchangeProvider::establish_session)
/// are replayed on the data endpoints.
#[derive(Debug)]
pub struct NseExchange {
    client: reqwest::Client,
    config: NseConfig,
    rate_limiter: RateLimiter,
    session: AtomicBool,
}

impl NseExchange {
    /// Create a new NSE adapter with default settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(NseConfig::default())
    }

    /// Create a new NSE adapter with custom settings.
    ///
    /// # Errors
    /// Returns an error if the base URL produces invalid headers or the HTTP
    /// client cannot be built.
    pub fn with_config(config: NseConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(browser_headers(&config.base_url)?)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.rate_limit),
            config,
            session: AtomicBool::new(false),
        })
    }

    /// Returns true once the priming requests have succeeded.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.load(Ordering::Relaxed)
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &NseConfig {
        &self.config
    }

    /// Issue a rate-limited GET and fail on non-success statuses.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        self.rate_limiter.wait().await;

        let url = format!("{}{}", self.config.base_url, path);
        debug!("NSE request: {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::Http {
                status: response.status().as_u16(),
                url,
            });
        }

        Ok(response)
    }

    async fn prime(&self) -> Result<()> {
        self.get("/", &[]).await?;
        sleep(self.config.priming_delay).await;

        self.get(MARKET_PAGE_PATH, &[]).await?;
        sleep(self.config.priming_delay).await;

        Ok(())
    }
}

#[async_trait]
impl ExchangeProvider for NseExchange {
    fn name(&self) -> &str {
        "NSE India"
    }

    fn exchange(&self) -> Exchange {
        Exchange::Nse
    }

    async fn establish_session(&self) -> Result<()> {
        match self.prime().await {
            Ok(()) => {
                self.session.store(true, Ordering::Relaxed);
                info!("NSE session established");
                Ok(())
            }
            Err(e) => {
                self.session.store(false, Ordering::Relaxed);
                warn!(error = %e, "Failed to establish NSE session");
                Err(e)
            }
        }
    }

    async fn list_symbols(&self) -> Result<Vec<Symbol>> {
        if !self.has_session() {
            return Err(DataError::SessionNotEstablished(self.name().to_string()));
        }

        let listing: PreOpenResponse = self
            .get(PRE_OPEN_PATH, &[("key", "ALL")])
            .await?
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("Failed to parse pre-open listing: {e}")))?;

        let symbols = listing.symbols();
        debug!(count = symbols.len(), "Parsed NSE listing");
        Ok(symbols)
    }

    async fn fetch_detail(&self, symbol: &Symbol) -> Result<Value> {
        if !self.has_session() {
            return Err(DataError::SessionNotEstablished(self.name().to_string()));
        }

        self.get(QUOTE_PATH, &[("symbol", symbol.as_str())])
            .await?
            .json::<Value>()
            .await
            .map_err(|e| DataError::Parse(format!("Failed to parse quote for {symbol}: {e}")))
    }
}

/// Browser-like headers NSE expects on every request.
fn browser_headers(base_url: &str) -> Result<HeaderMap> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| {
        DataError::InvalidParameter(format!("Invalid base URL for headers: {e}"))
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        REFERER,
        HeaderValue::from_str(&format!("{base_url}/")).map_err(invalid)?,
    );
    headers.insert(ORIGIN, HeaderValue::from_str(base_url).map_err(invalid)?);
    Ok(headers)
}

// ============================================================================
// NSE API Response Types
// ============================================================================

/// Pre-open market listing response.
#[derive(Debug, Default, Deserialize)]
struct PreOpenResponse {
    #[serde(default)]
    data: Vec<PreOpenEntry>,
}

#[derive(Debug, Deserialize)]
struct PreOpenEntry {
    #[serde(default)]
    metadata: Option<PreOpenMetadata>,
}

#[derive(Debug, Deserialize)]
struct PreOpenMetadata {
    #[serde(default)]
    symbol: Option<String>,
}

impl PreOpenResponse {
    /// One symbol per listed instrument; entries without a symbol are skipped.
    fn symbols(&self) -> Vec<Symbol> {
        self.data
            .iter()
            .filter_map(|entry| entry.metadata.as_ref()?.symbol.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Symbol::new)
            .collect()
    }
}
