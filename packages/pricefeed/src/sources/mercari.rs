//! Mercari source adapter.
//!
//! Mercari exposes no public search API, so this marketplace is
//! scrape-only: a single-strategy chain over the sold-listings search
//! page.

use async_trait::async_trait;

use crate::extract::markup::{MarkupListingExtractor, SelectorProfile};
use crate::sources::scrape::{ScrapeStrategy, ScrapeTarget};
use crate::sources::{PriceQuery, PriceSource, StrategyChain};
use crate::types::config::MarketplaceTuning;
use crate::types::listing::SourceResult;

const SOURCE_NAME: &str = "Mercari";

/// Mercari endpoint and tuning configuration.
#[derive(Debug, Clone)]
pub struct MercariConfig {
    /// Sold-listings search page
    pub search_url: String,

    /// Shared fetch tuning
    pub tuning: MarketplaceTuning,
}

impl Default for MercariConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.mercari.com/search/".to_string(),
            tuning: MarketplaceTuning::default(),
        }
    }
}

/// Selector profiles for the Mercari search grid, newest layout first.
pub fn mercari_sold_profiles() -> Vec<SelectorProfile> {
    vec![
        SelectorProfile::new(
            "mercari-item-cell",
            "div[data-testid=\"ItemCell\"]",
            "[data-testid=\"ItemName\"]",
            "[data-testid=\"ItemPrice\"]",
        )
        .with_link("a[data-testid=\"ItemLink\"]"),
        SelectorProfile::new(
            "mercari-items-box",
            "li.items-box",
            ".items-box-name",
            ".items-box-price",
        )
        .with_link("a"),
    ]
}

/// The Mercari source: scrape only.
pub struct MercariSource {
    chain: StrategyChain,
}

impl MercariSource {
    /// Create the source with its standard (single-strategy) chain.
    pub fn new(config: MercariConfig) -> Self {
        let target = ScrapeTarget::new(config.search_url.as_str(), "keyword")
            .with_param("status", "sold_out");
        let scrape = ScrapeStrategy::new(
            SOURCE_NAME,
            target,
            MarkupListingExtractor::new(SOURCE_NAME, mercari_sold_profiles()),
            config.tuning,
        );

        Self {
            chain: StrategyChain::new(vec![Box::new(scrape)]),
        }
    }

    /// Create the source from an explicit strategy chain.
    pub fn from_chain(chain: StrategyChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl PriceSource for MercariSource {
    async fn fetch(&self, query: &PriceQuery) -> Option<SourceResult> {
        self.chain.run(query).await
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_is_scrape_only() {
        let source = MercariSource::new(MercariConfig::default());
        assert_eq!(source.chain.len(), 1);
    }
}
