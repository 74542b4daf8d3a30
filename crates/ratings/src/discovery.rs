//! Exchange discovery with a cached, budgeted detail lookup.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use ratings_core::{DetailCache, Entity, ExchangeProvider, Symbol};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Lower bound of the market-cap band, in crore.
pub const DEFAULT_MIN_CAP: f64 = 100.0;

/// Upper bound of the market-cap band, in crore.
pub const DEFAULT_MAX_CAP: f64 = 10_000.0;

/// Detail fetches allowed per discovery instance.
pub const DEFAULT_CALL_BUDGET: u32 = 10;

/// One crore in home-currency units.
const CRORE: f64 = 10_000_000.0;

/// Market-cap band and call budget.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Inclusive lower bound, in crore.
    pub min_cap: f64,
    /// Inclusive upper bound, in crore.
    pub max_cap: f64,
    /// Maximum number of uncached detail fetches.
    pub call_budget: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_cap: DEFAULT_MIN_CAP,
            max_cap: DEFAULT_MAX_CAP,
            call_budget: DEFAULT_CALL_BUDGET,
        }
    }
}

impl DiscoveryConfig {
    /// Set the market-cap band.
    #[must_use]
    pub const fn with_band(mut self, min_cap: f64, max_cap: f64) -> Self {
        self.min_cap = min_cap;
        self.max_cap = max_cap;
        self
    }

    /// Set the call budget.
    #[must_use]
    pub const fn with_call_budget(mut self, call_budget: u32) -> Self {
        self.call_budget = call_budget;
        self
    }

    /// Returns true if `market_cap` lies inside the band.
    #[must_use]
    pub fn in_band(&self, market_cap: f64) -> bool {
        market_cap >= self.min_cap && market_cap <= self.max_cap
    }
}

/// Surfaces the listed companies whose market cap falls inside the band.
///
/// Detail lookups go through the cache first. Uncached lookups draw from a
/// call budget owned by this instance; once it is spent further misses return
/// `None` without touching the exchange.
pub struct ExchangeDiscovery {
    exchange: Arc<dyn ExchangeProvider>,
    cache: Arc<dyn DetailCache>,
    config: DiscoveryConfig,
    calls_made: AtomicU32,
    budget_exhausted: AtomicBool,
}

impl std::fmt::Debug for ExchangeDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeDiscovery")
            .field("exchange", &self.exchange.name())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("calls_made", &self.calls_made())
            .field("budget_exhausted", &self.budget_exhausted())
            .finish()
    }
}

impl ExchangeDiscovery {
    /// Create a discovery with the default band and budget.
    #[must_use]
    pub fn new(exchange: Arc<dyn ExchangeProvider>, cache: Arc<dyn DetailCache>) -> Self {
        Self::with_config(exchange, cache, DiscoveryConfig::default())
    }

    /// Create a discovery with a custom configuration.
    #[must_use]
    pub fn with_config(
        exchange: Arc<dyn ExchangeProvider>,
        cache: Arc<dyn DetailCache>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            exchange,
            cache,
            config,
            calls_made: AtomicU32::new(0),
            budget_exhausted: AtomicBool::new(false),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Number of uncached detail fetches attempted so far.
    #[must_use]
    pub fn calls_made(&self) -> u32 {
        self.calls_made.load(Ordering::SeqCst)
    }

    /// Returns true once a lookup has been refused for lack of budget.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.budget_exhausted.load(Ordering::SeqCst)
    }

    /// Prime the exchange session. Returns false on any failure.
    pub async fn establish_session(&self) -> bool {
        match self.exchange.establish_session().await {
            Ok(()) => true,
            Err(e) => {
                warn!(exchange = self.exchange.name(), error = %e, "Failed to establish session");
                false
            }
        }
    }

    /// List every symbol on the exchange, or nothing if the session or the
    /// listing fails.
    pub async fn list_symbols(&self) -> Vec<Symbol> {
        if !self.establish_session().await {
            return Vec::new();
        }

        match self.exchange.list_symbols().await {
            Ok(symbols) => {
                info!(exchange = self.exchange.name(), count = symbols.len(), "Listed symbols");
                symbols
            }
            Err(e) => {
                warn!(exchange = self.exchange.name(), error = %e, "Failed to list symbols");
                Vec::new()
            }
        }
    }

    /// Fetch the quote detail for a symbol, cache first.
    ///
    /// Returns `None` when the budget is spent or the fetch fails.
    pub async fn get_detail(&self, symbol: &Symbol) -> Option<Value> {
        match self.cache.get(symbol).await {
            Ok(Some(payload)) => {
                debug!(symbol = %symbol, "Cache hit for quote detail");
                return Some(payload);
            }
            Ok(None) => debug!(symbol = %symbol, "Cache miss for quote detail"),
            Err(e) => warn!(symbol = %symbol, error = %e, "Cache read failed"),
        }

        let budget = self.config.call_budget;
        let permitted = self
            .calls_made
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |made| {
                (made < budget).then_some(made + 1)
            })
            .is_ok();
        if !permitted {
            // warn on the first refusal only
            if self.budget_exhausted.swap(true, Ordering::SeqCst) {
                debug!(symbol = %symbol, budget, "API call budget exhausted, skipping detail fetch");
            } else {
                warn!(symbol = %symbol, budget, "API call budget exhausted, further detail fetches skipped");
            }
            return None;
        }

        let payload = match self.exchange.fetch_detail(symbol).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Failed to fetch quote detail");
                return None;
            }
        };

        if let Err(e) = self.cache.put(symbol, &payload).await {
            warn!(symbol = %symbol, error = %e, "Failed to cache quote detail");
        }
        Some(payload)
    }

    /// Keep the symbols whose market cap falls inside the band.
    ///
    /// Symbols without a detail are dropped, not retried.
    pub async fn filter_eligible(&self, symbols: &[Symbol]) -> Vec<Entity> {
        let mut eligible = Vec::new();
        for symbol in symbols {
            let Some(detail) = self.get_detail(symbol).await else {
                continue;
            };
            if is_empty_detail(&detail) {
                debug!(symbol = %symbol, "Empty quote detail, dropping");
                continue;
            }

            let market_cap = compute_market_cap(&detail);
            if !self.config.in_band(market_cap) {
                debug!(symbol = %symbol, market_cap, "Outside market-cap band");
                continue;
            }

            let name = company_name(&detail, symbol);
            eligible.push(Entity::new(
                symbol.clone(),
                name,
                market_cap,
                self.exchange.exchange(),
            ));
        }
        eligible
    }

    /// List, filter and deduplicate in one call.
    pub async fn eligible_entities(&self) -> Vec<Entity> {
        let symbols = self.list_symbols().await;
        let entities = dedup_by_company_name(self.filter_eligible(&symbols).await);
        info!(
            listed = symbols.len(),
            eligible = entities.len(),
            "Found eligible companies"
        );
        entities
    }
}

/// Market cap in crore: `lastPrice × issuedSize / 10^7`.
///
/// Returns 0 if either field is missing or not numeric.
#[must_use]
pub fn compute_market_cap(detail: &Value) -> f64 {
    let price = detail.pointer("/priceInfo/lastPrice").and_then(as_number);
    let issued = detail.pointer("/securityInfo/issuedSize").and_then(as_number);
    match (price, issued) {
        (Some(price), Some(issued)) => price * issued / CRORE,
        _ => 0.0,
    }
}

/// Company name from a quote detail, falling back to the symbol.
#[must_use]
pub fn company_name(detail: &Value, symbol: &Symbol) -> String {
    detail
        .pointer("/info/companyName")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| symbol.to_string(), str::to_string)
}

/// Keep the first entity per company name.
#[must_use]
pub fn dedup_by_company_name(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::new();
    entities
        .into_iter()
        .filter(|entity| seen.insert(entity.company_name.clone()))
        .collect()
}

fn is_empty_detail(detail: &Value) -> bool {
    match detail {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}
