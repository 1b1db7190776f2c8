//! Source adapters and the fetch strategy chain.
//!
//! One adapter exists per marketplace. Internally an adapter owns an
//! ordered list of fetch strategies (preferred access method first);
//! the chain driver runs them until one yields a result. Failures are
//! logged and absorbed: a degraded marketplace degrades one source's
//! contribution, never the whole query.

pub mod ebay;
pub mod mercari;
pub mod rate_limited;
pub mod scrape;

pub use ebay::{EbayApiStrategy, EbayConfig, EbaySource};
pub use mercari::{MercariConfig, MercariSource};
pub use rate_limited::{RateLimitedSource, SourceExt};
pub use scrape::{ScrapeStrategy, ScrapeTarget};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::FetchResult;
use crate::types::listing::{SignedPriceCheck, SourceResult};

/// One price lookup as the adapters see it.
#[derive(Debug, Clone)]
pub struct PriceQuery {
    /// Item name to search for
    pub name: String,

    /// Optional secondary identifier (e.g. a product code)
    pub identifier: Option<String>,

    /// Whether per-listing detail should be kept for display.
    ///
    /// The expensive path: only single-item detail views set this,
    /// never bulk refresh.
    pub include_sales: bool,
}

impl PriceQuery {
    /// Create a query for an item name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            include_sales: false,
        }
    }

    /// Add a secondary identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Keep per-listing detail in the results.
    pub fn with_sales(mut self) -> Self {
        self.include_sales = true;
        self
    }

    /// The free-text search string sent to marketplaces.
    pub fn search_terms(&self) -> String {
        match &self.identifier {
            Some(id) => format!("{} {}", self.name, id),
            None => self.name.clone(),
        }
    }

    /// Stable key identifying this query for trend tracking.
    pub fn query_key(&self) -> String {
        self.search_terms()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A marketplace price source.
///
/// `fetch` returns `None` for anything other than usable prices -
/// auth failures, timeouts, drifted markup, and empty result sets all
/// look the same to the caller, by design.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch recent sold prices for a query.
    async fn fetch(&self, query: &PriceQuery) -> Option<SourceResult>;

    /// Marketplace label (for provenance and logging).
    fn name(&self) -> &str;
}

/// A source that can answer signed-item price checks.
#[async_trait]
pub trait SignedPriceSource: Send + Sync {
    /// Check the sold price of a signed variant.
    ///
    /// Reports not-found rather than substituting a generic hit when
    /// nothing plausibly matches a genuine signed sale.
    async fn fetch_signed(
        &self,
        name: &str,
        catalog_number: &str,
        signer: &str,
        qualifiers: &[String],
    ) -> SignedPriceCheck;
}

/// One access method for a marketplace.
///
/// `Ok(None)` is a clean miss (no credential, no qualifying results);
/// `Err` is a failure worth logging (transport, drifted markup). The
/// chain treats both as "try the next strategy."
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Attempt this access method.
    async fn attempt(&self, query: &PriceQuery) -> FetchResult<Option<SourceResult>>;

    /// Strategy name (for logging).
    fn name(&self) -> &str;
}

/// Ordered strategies, first success wins.
pub struct StrategyChain {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl StrategyChain {
    /// Create a chain from ordered strategies (preferred first).
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run strategies in order until one yields a result.
    pub async fn run(&self, query: &PriceQuery) -> Option<SourceResult> {
        for strategy in &self.strategies {
            match strategy.attempt(query).await {
                Ok(Some(result)) => {
                    debug!(
                        strategy = strategy.name(),
                        samples = result.sample_count,
                        "strategy yielded prices"
                    );
                    return Some(result);
                }
                Ok(None) => {
                    debug!(strategy = strategy.name(), "strategy had no data, trying next");
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "strategy failed, trying next"
                    );
                }
            }
        }
        None
    }

    /// Number of strategies in the chain.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// True when the chain has no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
