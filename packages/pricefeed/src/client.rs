//! The PriceFeed - main entry point for the reconciliation engine.
//!
//! Owns the source adapters, aggregator, and canonicalizer as injected
//! components with constructor-provided configuration; there is no
//! ambient global state. The facade never errors on marketplace
//! flakiness: a query with nothing usable answers `None`, which
//! callers render as "price unavailable."

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aggregate::Aggregator;
use crate::auth::{HttpTokenExchange, TokenAuthenticator};
use crate::catalog::{Canonicalizer, KeywordTable};
use crate::error::{PriceFeedError, Result};
use crate::pipeline::refresh::{refresh_collection, RefreshConfig, RefreshReport, RefreshRequest};
use crate::pipeline::lookup::lookup_price;
use crate::security::ClientCredentials;
use crate::sources::ebay::{EbayConfig, EbaySource};
use crate::sources::mercari::{MercariConfig, MercariSource};
use crate::sources::{PriceQuery, PriceSource, SignedPriceSource};
use crate::types::item::{SearchHit, UniqueItem};
use crate::types::listing::{PriceResult, SignedPriceCheck};

/// The main entry point - reconciles marketplace prices for the caller.
///
/// # Example
///
/// ```rust,ignore
/// use pricefeed::{ClientCredentials, PriceFeed};
///
/// let feed = PriceFeed::with_default_sources(Some(ClientCredentials::new(id, secret)));
///
/// // Single item, cheap path
/// let price = feed.fetch_average_price("Vinyl Figure", Some("57"), false).await;
///
/// // Detail view, attaches recent sales
/// let detail = feed.fetch_average_price("Vinyl Figure", Some("57"), true).await;
/// ```
pub struct PriceFeed {
    sources: Vec<Arc<dyn PriceSource>>,
    signed_source: Option<Arc<dyn SignedPriceSource>>,
    aggregator: Aggregator,
    canonicalizer: Canonicalizer,
    refresh_config: RefreshConfig,
}

impl PriceFeed {
    /// Start building a feed with custom sources.
    pub fn builder() -> PriceFeedBuilder {
        PriceFeedBuilder::default()
    }

    /// Create a feed over the standard marketplaces.
    ///
    /// `credentials: None` runs every API-capable marketplace in
    /// scrape-only mode; nothing errors, the structured method is
    /// simply skipped.
    pub fn with_default_sources(credentials: Option<ClientCredentials>) -> Self {
        let ebay_config = EbayConfig::default();
        let authenticator = Arc::new(TokenAuthenticator::new(
            HttpTokenExchange::new(
                ebay_config.token_url.as_str(),
                ebay_config.oauth_scope.as_str(),
            ),
            credentials,
        ));
        let ebay = Arc::new(EbaySource::new(ebay_config, authenticator));
        let mercari = Arc::new(MercariSource::new(MercariConfig::default()));

        Self::builder()
            .shared_source(ebay.clone())
            .shared_source(mercari)
            .signed_source(ebay)
            .build()
    }

    /// Fetch the aggregated average sold price for an item.
    ///
    /// `include_sales` attaches up to 10 individual recent sales: the
    /// expensive path, meant for single-item detail views only.
    pub async fn fetch_average_price(
        &self,
        name: &str,
        identifier: Option<&str>,
        include_sales: bool,
    ) -> Option<PriceResult> {
        let mut query = PriceQuery::new(name.trim());
        if let Some(identifier) = identifier {
            query = query.with_identifier(identifier);
        }
        if include_sales {
            query = query.with_sales();
        }

        lookup_price(&self.sources, &self.aggregator, &query).await
    }

    /// Fetch an average price with cooperative cancellation.
    pub async fn fetch_average_price_with_cancel(
        &self,
        name: &str,
        identifier: Option<&str>,
        include_sales: bool,
        cancel: CancellationToken,
    ) -> Result<Option<PriceResult>> {
        tokio::select! {
            result = self.fetch_average_price(name, identifier, include_sales) => Ok(result),
            _ = cancel.cancelled() => Err(PriceFeedError::Cancelled),
        }
    }

    /// Check the sold price of a signed variant.
    ///
    /// Answers not-found when no source can vet signed listings or no
    /// qualifying listing exists: never a substituted generic price.
    pub async fn fetch_signed_item_price(
        &self,
        name: &str,
        catalog_number: &str,
        signer: &str,
        qualifiers: &[String],
    ) -> SignedPriceCheck {
        match &self.signed_source {
            Some(source) => {
                source
                    .fetch_signed(name, catalog_number, signer, qualifiers)
                    .await
            }
            None => SignedPriceCheck::not_found("no signed-capable source configured"),
        }
    }

    /// Group search hits into canonical, variant-distinct items.
    pub fn group_search_hits(&self, hits: &[SearchHit]) -> Vec<UniqueItem> {
        self.canonicalizer.group_hits(hits)
    }

    /// Refresh prices for many items with bounded concurrency.
    pub async fn refresh_collection(
        &self,
        requests: &[RefreshRequest],
        cancel: &CancellationToken,
    ) -> RefreshReport {
        refresh_collection(
            &self.sources,
            &self.aggregator,
            requests,
            &self.refresh_config,
            cancel,
        )
        .await
    }

    /// Seed the trend baseline for an item from a persisted last-known
    /// price, so the first refresh after a restart reports a real
    /// trend instead of a flat one.
    pub fn seed_baseline(&self, name: &str, identifier: Option<&str>, price: f64) {
        let mut query = PriceQuery::new(name.trim());
        if let Some(identifier) = identifier {
            query = query.with_identifier(identifier);
        }
        self.aggregator.seed_baseline(query.query_key(), price);
    }

    /// Number of configured sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

/// Builder for a PriceFeed with custom sources and configuration.
#[derive(Default)]
pub struct PriceFeedBuilder {
    sources: Vec<Arc<dyn PriceSource>>,
    signed_source: Option<Arc<dyn SignedPriceSource>>,
    keyword_table: Option<KeywordTable>,
    refresh_config: Option<RefreshConfig>,
}

impl PriceFeedBuilder {
    /// Add a source.
    pub fn source(mut self, source: impl PriceSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Add an already-shared source.
    pub fn shared_source(mut self, source: Arc<dyn PriceSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the source answering signed-item checks.
    pub fn signed_source(mut self, source: Arc<dyn SignedPriceSource>) -> Self {
        self.signed_source = Some(source);
        self
    }

    /// Use a custom keyword table for variant/exclusivity tagging.
    pub fn keyword_table(mut self, table: KeywordTable) -> Self {
        self.keyword_table = Some(table);
        self
    }

    /// Use a custom bulk-refresh configuration.
    pub fn refresh_config(mut self, config: RefreshConfig) -> Self {
        self.refresh_config = Some(config);
        self
    }

    /// Build the feed.
    pub fn build(self) -> PriceFeed {
        let feed = PriceFeed {
            sources: self.sources,
            signed_source: self.signed_source,
            aggregator: Aggregator::new(),
            canonicalizer: Canonicalizer::new(self.keyword_table.unwrap_or_default()),
            refresh_config: self.refresh_config.unwrap_or_default(),
        };
        info!(sources = feed.sources.len(), "price feed ready");
        feed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{listings_at, MockSource};

    #[tokio::test]
    async fn test_facade_aggregates_across_sources() {
        let feed = PriceFeed::builder()
            .source(MockSource::new("eBay").with_listings(
                "figure",
                listings_at("figure", 10.0, 2, "eBay"),
            ))
            .source(MockSource::new("Mercari").with_listings(
                "figure",
                listings_at("figure", 16.0, 1, "Mercari"),
            ))
            .build();

        let result = feed.fetch_average_price("figure", None, false).await.unwrap();
        assert_eq!(result.total_samples, 3);
        assert!((result.average_price - 12.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_facade_none_when_all_sources_miss() {
        let feed = PriceFeed::builder().source(MockSource::new("eBay")).build();
        assert!(feed.fetch_average_price("figure", None, false).await.is_none());
    }

    #[tokio::test]
    async fn test_signed_check_without_capable_source() {
        let feed = PriceFeed::builder().build();
        let check = feed
            .fetch_signed_item_price("figure", "57", "Jane Doe", &[])
            .await;
        assert!(!check.found);
        assert!(check.price.is_none());
    }

    #[tokio::test]
    async fn test_pre_cancelled_lookup_errors() {
        let feed = PriceFeed::builder()
            .source(
                MockSource::new("eBay")
                    .with_delay(std::time::Duration::from_millis(250))
                    .with_listings("figure", listings_at("figure", 10.0, 1, "eBay")),
            )
            .build();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = feed
            .fetch_average_price_with_cancel("figure", None, false, cancel)
            .await;
        assert!(matches!(outcome, Err(PriceFeedError::Cancelled)));
    }

    #[tokio::test]
    async fn test_seeded_baseline_shapes_first_trend() {
        let feed = PriceFeed::builder()
            .source(MockSource::new("eBay").with_listings(
                "figure",
                listings_at("figure", 22.0, 1, "eBay"),
            ))
            .build();

        feed.seed_baseline("figure", None, 20.0);
        let result = feed.fetch_average_price("figure", None, false).await.unwrap();
        assert_eq!(result.trend_percent, 10.0);
    }
}
