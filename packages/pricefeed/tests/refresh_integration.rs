//! Bulk refresh tests: concurrency bounds, pacing, cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use pricefeed::testing::{listings_at, MockSource};
use pricefeed::{
    PriceFeed, PriceQuery, PriceSource, RefreshConfig, RefreshRequest, SourceResult,
};

fn requests(count: usize) -> Vec<RefreshRequest> {
    (1..=count)
        .map(|i| RefreshRequest::new(format!("item-{}", i), PriceQuery::new("figure")))
        .collect()
}

#[tokio::test]
async fn refresh_bounds_concurrent_lookups() {
    let source = MockSource::new("eBay")
        .with_delay(Duration::from_millis(30))
        .with_listings("figure", listings_at("figure", 10.0, 1, "eBay"));
    let tracker = source.clone();

    let feed = PriceFeed::builder()
        .source(source)
        .refresh_config(
            RefreshConfig::new()
                .with_batch_size(5)
                .with_batch_delay(Duration::from_millis(10)),
        )
        .build();

    let report = feed
        .refresh_collection(&requests(12), &CancellationToken::new())
        .await;

    assert_eq!(report.updated.len(), 12);
    assert_eq!(report.remaining, 0);
    assert!(!report.cancelled);
    assert_eq!(tracker.call_count(), 12);
    assert!(
        tracker.max_in_flight() <= 5,
        "concurrency bound exceeded: {} in flight",
        tracker.max_in_flight()
    );
}

/// A source that fires the cancellation token when the Nth lookup
/// starts, simulating a user cancelling mid-refresh.
struct CancelAtNthCall {
    inner: MockSource,
    cancel: CancellationToken,
    threshold: usize,
    started: Arc<AtomicUsize>,
}

#[async_trait]
impl PriceSource for CancelAtNthCall {
    async fn fetch(&self, query: &PriceQuery) -> Option<SourceResult> {
        let call = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.threshold {
            self.cancel.cancel();
        }
        self.inner.fetch(query).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[tokio::test]
async fn cancellation_leaves_later_items_untouched() {
    let cancel = CancellationToken::new();
    let inner = MockSource::new("eBay")
        .with_listings("figure", listings_at("figure", 10.0, 1, "eBay"));
    let tracker = inner.clone();

    // Cancel fires as the sixth lookup starts; items already in flight
    // finish, everything after stays untouched.
    let source = CancelAtNthCall {
        inner,
        cancel: cancel.clone(),
        threshold: 6,
        started: Arc::new(AtomicUsize::new(0)),
    };

    let feed = PriceFeed::builder()
        .source(source)
        .refresh_config(
            RefreshConfig::new()
                .with_batch_size(3)
                .with_batch_delay(Duration::from_millis(1)),
        )
        .build();

    let report = feed.refresh_collection(&requests(12), &cancel).await;

    assert!(report.cancelled);
    assert_eq!(report.updated.len(), 6);
    assert_eq!(report.remaining, 6);
    assert_eq!(tracker.call_count(), 6, "items 7-12 were never fetched");

    let updated_keys: Vec<&str> = report.updated.iter().map(|u| u.item_key.as_str()).collect();
    assert_eq!(
        updated_keys,
        vec!["item-1", "item-2", "item-3", "item-4", "item-5", "item-6"]
    );
}

#[tokio::test]
async fn pre_cancelled_refresh_attempts_nothing() {
    let source = MockSource::new("eBay")
        .with_listings("figure", listings_at("figure", 10.0, 1, "eBay"));
    let tracker = source.clone();
    let feed = PriceFeed::builder().source(source).build();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = feed.refresh_collection(&requests(4), &cancel).await;

    assert!(report.cancelled);
    assert!(report.updated.is_empty());
    assert_eq!(report.remaining, 4);
    assert_eq!(tracker.call_count(), 0);
}

#[tokio::test]
async fn unavailable_items_are_reported_not_failed() {
    // Only odd items have fixtures; even items come back unavailable,
    // and nothing errors.
    let source = MockSource::new("eBay")
        .with_listings("priced figure", listings_at("priced figure", 10.0, 1, "eBay"));
    let feed = PriceFeed::builder().source(source).build();

    let mixed = vec![
        RefreshRequest::new("item-1", PriceQuery::new("priced figure")),
        RefreshRequest::new("item-2", PriceQuery::new("unknown figure")),
        RefreshRequest::new("item-3", PriceQuery::new("priced figure")),
    ];
    let report = feed
        .refresh_collection(&mixed, &CancellationToken::new())
        .await;

    assert_eq!(report.updated.len(), 2);
    assert_eq!(report.unavailable, vec!["item-2".to_string()]);
    assert_eq!(report.attempted(), 3);
}

#[tokio::test]
async fn bulk_refresh_never_fetches_sales_detail() {
    // Even when the caller's query asks for sales, the bulk path
    // strips the request.
    let source = MockSource::new("eBay")
        .with_listings("figure", listings_at("figure", 10.0, 2, "eBay"));
    let feed = PriceFeed::builder().source(source).build();

    let detail_requests = vec![RefreshRequest::new(
        "item-1",
        PriceQuery::new("figure").with_sales(),
    )];
    let report = feed
        .refresh_collection(&detail_requests, &CancellationToken::new())
        .await;

    assert!(report.updated[0].result.recent_sales.is_none());
}
