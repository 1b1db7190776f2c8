//! End-to-end reconciliation tests over mock sources and strategies.
//!
//! No network: API responses and scrape results are scripted at the
//! strategy seam, so these exercise the real chain driver, aggregator,
//! and facade wiring.

use std::sync::Arc;

use async_trait::async_trait;

use pricefeed::error::FetchResult;
use pricefeed::testing::{listings_at, MockSource, MockTokenExchange};
use pricefeed::sources::EbayApiStrategy;
use pricefeed::{
    ClientCredentials, EbayConfig, EbaySource, FetchStrategy, PriceFeed, PriceQuery, RawListing,
    SignedPriceSource, SourceResult, StrategyChain, TokenAuthenticator,
};

/// A strategy with a fixed outcome, standing in for a live endpoint.
struct ScriptedStrategy {
    name: &'static str,
    listings: Vec<RawListing>,
}

#[async_trait]
impl FetchStrategy for ScriptedStrategy {
    async fn attempt(&self, query: &PriceQuery) -> FetchResult<Option<SourceResult>> {
        let result = SourceResult::from_listings("eBay", self.listings.clone())
            .map(|r| if query.include_sales { r } else { r.without_listings() });
        Ok(result)
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[tokio::test]
async fn end_to_end_weighted_scenario() {
    // Structured API: $10, $10, $14. Scrape: $12 x 3. The aggregate is
    // the sample-weighted mean over all six sales.
    let api_listings = vec![
        RawListing::new("Vinyl Figure #57", 10.0, "eBay"),
        RawListing::new("Vinyl Figure #57", 10.0, "eBay"),
        RawListing::new("Vinyl Figure #57", 14.0, "eBay"),
    ];
    let feed = PriceFeed::builder()
        .source(MockSource::new("eBay").with_listings("Vinyl Figure", api_listings))
        .source(MockSource::new("Mercari").with_listings(
            "Vinyl Figure",
            listings_at("Vinyl Figure #57", 12.0, 3, "Mercari"),
        ))
        .build();

    let result = feed
        .fetch_average_price("Vinyl Figure", None, false)
        .await
        .expect("both sources contributed");

    assert_eq!(result.total_samples, 6);
    let expected = (10.0 * 2.0 + 14.0 + 12.0 * 3.0) / 6.0;
    assert!((result.average_price - expected).abs() < 1e-9);
    assert_eq!(
        result.combined_provenance,
        "eBay (3 sold), Mercari (3 sold)"
    );
    assert_eq!(result.trend_percent, 0.0);
    assert!(result.recent_sales.is_none());
}

#[tokio::test]
async fn detail_path_attaches_recent_sales() {
    let feed = PriceFeed::builder()
        .source(MockSource::new("eBay").with_listings(
            "Vinyl Figure",
            listings_at("Vinyl Figure #57", 24.0, 3, "eBay"),
        ))
        .build();

    let result = feed
        .fetch_average_price("Vinyl Figure", None, true)
        .await
        .unwrap();
    let sales = result.recent_sales.expect("detail path keeps sales");
    assert_eq!(sales.len(), 3);
}

#[tokio::test]
async fn rejected_credentials_fall_back_to_scraping() {
    // The token endpoint rejects the exchange, so the API strategy
    // reports a clean miss and the chain moves on to the scripted
    // scrape strategy: no error surfaces anywhere.
    let exchange = MockTokenExchange::rejecting(401);
    let exchange_calls = exchange.call_counter();
    let authenticator = Arc::new(TokenAuthenticator::new(
        exchange,
        Some(ClientCredentials::new("app-id", "bad-secret")),
    ));

    let api = EbayApiStrategy::new(EbayConfig::default(), authenticator);
    let scrape = ScriptedStrategy {
        name: "scrape",
        listings: listings_at("Vinyl Figure #57", 18.0, 2, "eBay"),
    };
    let source = EbaySource::from_chain(StrategyChain::new(vec![
        Box::new(api),
        Box::new(scrape),
    ]));

    let feed = PriceFeed::builder().source(source).build();
    let result = feed
        .fetch_average_price("Vinyl Figure", None, false)
        .await
        .expect("scrape fallback produced a price");

    assert_eq!(result.total_samples, 2);
    assert!((result.average_price - 18.0).abs() < 1e-9);
    assert_eq!(
        exchange_calls.load(std::sync::atomic::Ordering::SeqCst),
        1,
        "the API method was attempted before falling back"
    );
}

#[tokio::test]
async fn signed_check_vets_listing_titles() {
    let listings = vec![
        RawListing::new("Vinyl Figure #57 signed by Jane Doe, JSA", 120.0, "eBay"),
        RawListing::new("Vinyl Figure #57 autograph Jane Doe", 130.0, "eBay"),
        RawListing::new("Vinyl Figure #57 mint", 25.0, "eBay"),
    ];
    let source = EbaySource::from_chain(StrategyChain::new(vec![Box::new(ScriptedStrategy {
        name: "api",
        listings,
    })]));

    let check = source
        .fetch_signed("Vinyl Figure", "57", "Jane Doe", &["chase".to_string()])
        .await;

    assert!(check.found);
    assert!((check.price.unwrap() - 125.0).abs() < 1e-9);
    assert_eq!(check.provenance, "eBay (2 signed sold)");
}

#[tokio::test]
async fn signed_check_reports_not_found_over_generic_hits() {
    // Plenty of unsigned sales: the check must refuse to price the
    // signed variant off them.
    let source = EbaySource::from_chain(StrategyChain::new(vec![Box::new(ScriptedStrategy {
        name: "api",
        listings: listings_at("Vinyl Figure #57 mint in box", 25.0, 5, "eBay"),
    })]));

    let check = source.fetch_signed("Vinyl Figure", "57", "Jane Doe", &[]).await;

    assert!(!check.found);
    assert!(check.price.is_none());
}

#[tokio::test]
async fn trend_tracks_successive_lookups() {
    let source = MockSource::new("eBay")
        .with_listings("Vinyl Figure", listings_at("Vinyl Figure", 20.0, 1, "eBay"));
    // Fixture state is shared across clones, so the canned listings
    // can change between lookups.
    let fixtures = source.clone();
    let feed = PriceFeed::builder().source(source).build();

    let first = feed
        .fetch_average_price("Vinyl Figure", None, false)
        .await
        .unwrap();
    assert_eq!(first.trend_percent, 0.0);

    // Price moves to $25: +25.0% against the prior aggregate.
    let _ = fixtures.with_listings("Vinyl Figure", listings_at("Vinyl Figure", 25.0, 1, "eBay"));
    let second = feed
        .fetch_average_price("Vinyl Figure", None, false)
        .await
        .unwrap();
    assert_eq!(second.trend_percent, 25.0);
}
