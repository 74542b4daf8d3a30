//! Core data types for the collector.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Exchange-assigned ticker
//! - [`Exchange`] - Listing venue
//! - [`Entity`] - A listed company that passed the market-cap band
//! - [`RetrievalResult`] - Text extracted from a rating disclosure
//! - [`Record`] - One persisted entry of the record store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Stock exchange an entity is listed on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// National Stock Exchange of India.
    #[default]
    Nse,
    /// BSE (Bombay Stock Exchange).
    Bse,
}

impl Exchange {
    /// Returns the short exchange code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Nse => "NSE",
            Self::Bse => "BSE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A listed company surfaced by exchange discovery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Exchange-assigned symbol.
    pub symbol: Symbol,
    /// Company name as reported by the exchange.
    pub company_name: String,
    /// Market capitalization in crore (10,000,000 home-currency units).
    pub market_cap: f64,
    /// Listing exchange.
    pub exchange: Exchange,
}

impl Entity {
    /// Creates a new entity.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        company_name: impl Into<String>,
        market_cap: f64,
        exchange: Exchange,
    ) -> Self {
        Self {
            symbol,
            company_name: company_name.into(),
            market_cap,
            exchange,
        }
    }
}

/// Text extracted from a rating disclosure.
///
/// A successful retrieval populates at least one of the two fields; total
/// failure is represented by the absence of a result, never by an empty one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Normalized text of the rendered disclosure page.
    pub page_text: Option<String>,
    /// Text extracted from the disclosure PDF.
    pub pdf_text: Option<String>,
}

impl RetrievalResult {
    /// Result of a link that pointed straight at a PDF.
    #[must_use]
    pub fn pdf_only(pdf_text: impl Into<String>) -> Self {
        Self {
            page_text: None,
            pdf_text: Some(pdf_text.into()),
        }
    }

    /// Result of a rendered page with no retrievable embedded document.
    #[must_use]
    pub fn page_only(page_text: impl Into<String>) -> Self {
        Self {
            page_text: Some(page_text.into()),
            pdf_text: None,
        }
    }

    /// Result of a rendered page whose embedded PDF was also extracted.
    #[must_use]
    pub fn page_with_pdf(page_text: impl Into<String>, pdf_text: impl Into<String>) -> Self {
        Self {
            page_text: Some(page_text.into()),
            pdf_text: Some(pdf_text.into()),
        }
    }

    /// Returns true if neither text is populated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.page_text.is_none() && self.pdf_text.is_none()
    }
}

/// One entry of the append-only record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Symbol of the rated company.
    pub symbol: Symbol,
    /// Company name.
    pub company_name: String,
    /// Market capitalization in crore.
    pub market_cap: f64,
    /// Link the disclosure was retrieved from.
    pub source_link: String,
    /// When the record was created.
    pub timestamp: DateTime<Utc>,
    /// Normalized page text, if any.
    pub page_text: Option<String>,
    /// Extracted PDF text, if any.
    pub pdf_text: Option<String>,
}

impl Record {
    /// Builds a record for an entity from a retrieval result, stamped now.
    #[must_use]
    pub fn new(entity: &Entity, source_link: impl Into<String>, result: RetrievalResult) -> Self {
        Self {
            symbol: entity.symbol.clone(),
            company_name: entity.company_name.clone(),
            market_cap: entity.market_cap,
            source_link: source_link.into(),
            timestamp: Utc::now(),
            page_text: result.page_text,
            pdf_text: result.pdf_text,
        }
    }

    /// Overrides the record timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new(" parkhotels ").as_str(), "PARKHOTELS");
        assert_eq!(Symbol::from("abc"), Symbol::new("ABC"));
    }

    #[test]
    fn test_exchange_display() {
        assert_eq!(Exchange::Nse.to_string(), "NSE");
        assert_eq!(Exchange::Bse.to_string(), "BSE");
    }

    #[test]
    fn test_retrieval_result_constructors() {
        let pdf = RetrievalResult::pdf_only("a\n");
        assert!(pdf.page_text.is_none());
        assert_eq!(pdf.pdf_text.as_deref(), Some("a\n"));

        let page = RetrievalResult::page_only("text");
        assert!(!page.is_empty());
        assert!(RetrievalResult::default().is_empty());
    }

    #[test]
    fn test_record_from_entity() {
        let entity = Entity::new(Symbol::new("ABC"), "Abc Ltd", 512.5, Exchange::Nse);
        let record = Record::new(
            &entity,
            "https://example.com/r/1",
            RetrievalResult::page_with_pdf("page", "pdf"),
        );
        assert_eq!(record.symbol, entity.symbol);
        assert_eq!(record.company_name, "Abc Ltd");
        assert_eq!(record.page_text.as_deref(), Some("page"));
        assert_eq!(record.pdf_text.as_deref(), Some("pdf"));
    }
}
