//! Bulk refresh - repricing an entire stored collection.
//!
//! Items are processed in fixed-size batches rather than unbounded
//! fan-out, with a pacing delay between batches; marketplace
//! anti-automation defenses key on burst shape. Cancellation is
//! cooperative: already-updated items stay updated and the report
//! carries the progress made so far.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::pipeline::lookup::lookup_price;
use crate::sources::{PriceQuery, PriceSource};
use crate::types::listing::PriceResult;

/// Configuration for bulk refresh operations.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Concurrent lookups per batch
    pub batch_size: usize,

    /// Pacing delay between batches
    pub batch_delay: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_millis(100),
        }
    }
}

impl RefreshConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the inter-batch pacing delay.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }
}

/// One item to refresh: the caller's key plus the query to run.
#[derive(Debug, Clone)]
pub struct RefreshRequest {
    /// Caller-side identifier, echoed back in the report
    pub item_key: String,

    /// Query to look up
    pub query: PriceQuery,
}

impl RefreshRequest {
    /// Create a refresh request.
    pub fn new(item_key: impl Into<String>, query: PriceQuery) -> Self {
        Self {
            item_key: item_key.into(),
            query,
        }
    }
}

/// A refreshed price for one item.
#[derive(Debug, Clone)]
pub struct RefreshedPrice {
    /// Caller-side identifier from the request
    pub item_key: String,

    /// The new aggregate
    pub result: PriceResult,
}

/// Outcome of a bulk refresh run.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Items that received a new price
    pub updated: Vec<RefreshedPrice>,

    /// Items attempted with no price available
    pub unavailable: Vec<String>,

    /// Items never attempted (run was cancelled first)
    pub remaining: usize,

    /// Whether the run stopped on cancellation
    pub cancelled: bool,
}

impl RefreshReport {
    /// Number of items actually attempted.
    pub fn attempted(&self) -> usize {
        self.updated.len() + self.unavailable.len()
    }
}

/// Refresh prices for many items with bounded concurrency.
///
/// The cancellation token is checked before each batch and before each
/// item inside a batch; in-flight lookups are allowed to finish so an
/// item is either fully updated or untouched.
pub async fn refresh_collection(
    sources: &[Arc<dyn PriceSource>],
    aggregator: &Aggregator,
    requests: &[RefreshRequest],
    config: &RefreshConfig,
    cancel: &CancellationToken,
) -> RefreshReport {
    let mut report = RefreshReport::default();
    let total = requests.len();
    let batch_size = config.batch_size.max(1);
    let batches = requests.chunks(batch_size).count();

    info!(items = total, batch_size, "bulk refresh starting");

    for (index, batch) in requests.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let lookups = batch.iter().map(|request| async move {
            if cancel.is_cancelled() {
                return None;
            }
            // Per-listing detail is a single-item-view expense; bulk
            // runs never pay it.
            let mut query = request.query.clone();
            query.include_sales = false;

            let result = lookup_price(sources, aggregator, &query).await;
            Some((request.item_key.clone(), result))
        });

        for outcome in join_all(lookups).await {
            match outcome {
                Some((item_key, Some(result))) => {
                    report.updated.push(RefreshedPrice { item_key, result });
                }
                Some((item_key, None)) => {
                    report.unavailable.push(item_key);
                }
                None => {
                    report.cancelled = true;
                }
            }
        }

        debug!(
            batch = index + 1,
            batches,
            updated = report.updated.len(),
            "batch complete"
        );

        let last_batch = index + 1 == batches;
        if !last_batch && !cancel.is_cancelled() && !config.batch_delay.is_zero() {
            tokio::time::sleep(config.batch_delay).await;
        }
    }

    report.remaining = total - report.attempted();
    info!(
        updated = report.updated.len(),
        unavailable = report.unavailable.len(),
        remaining = report.remaining,
        cancelled = report.cancelled,
        "bulk refresh complete"
    );
    report
}
