//! Capability traits for the pipeline's external collaborators.
//!
//! This module defines the seams between the collector and the outside world:
//!
//! - [`ExchangeProvider`] - Exchange adapter for symbol listing and quote detail
//! - [`LinkResolver`] - Locates a company's latest rating disclosure
//! - [`DocumentSource`] - Turns a disclosure link into normalized text
//! - [`PageRenderer`] - Renders a page in a full browser context

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{Exchange, RetrievalResult, Symbol},
};

/// Adapter for a single stock exchange.
///
/// The contract is deliberately small so a mock exchange can stand in for the
/// real one in tests.
#[async_trait]
pub trait ExchangeProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "NSE India").
    fn name(&self) -> &str;

    /// Returns the exchange this provider lists.
    fn exchange(&self) -> Exchange;

    /// Performs the priming requests the data endpoints require.
    ///
    /// Exchanges often gate their JSON APIs behind cookies that are only set by
    /// visiting informational pages first. No retry is attempted.
    async fn establish_session(&self) -> Result<()>;

    /// Lists every symbol currently listed on the exchange.
    async fn list_symbols(&self) -> Result<Vec<Symbol>>;

    /// Fetches the raw quote detail for a symbol.
    ///
    /// The payload is kept opaque so it can be cached verbatim. Exchanges
    /// that need a session fail with `SessionNotEstablished` until
    /// [`establish_session`](Self::establish_session) has succeeded.
    async fn fetch_detail(&self, symbol: &Symbol) -> Result<Value>;
}

/// Locates the most recent rating disclosure for a company.
#[async_trait]
pub trait LinkResolver: Send + Sync + Debug {
    /// Returns the name of this resolver.
    fn name(&self) -> &str;

    /// Returns an absolute URL to the latest disclosure, or `None` if the
    /// company has none listed.
    async fn resolve(&self, symbol: &Symbol) -> Result<Option<String>>;
}

/// Turns a disclosure link into extracted text.
#[async_trait]
pub trait DocumentSource: Send + Sync + Debug {
    /// Retrieves the text behind `url`.
    ///
    /// `None` means no content was available; it is distinct from a result
    /// whose texts happen to be empty.
    async fn retrieve(&self, url: &str) -> Option<RetrievalResult>;
}

/// Renders pages whose content is populated by client-side script.
#[async_trait]
pub trait PageRenderer: Send + Sync + Debug {
    /// Loads `url`, waits for its load event plus any configured settle
    /// delay, and returns the final HTML.
    async fn render(&self, url: &str) -> Result<String>;
}
