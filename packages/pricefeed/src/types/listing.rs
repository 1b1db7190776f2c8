//! Listing and price aggregate types.
//!
//! `RawListing` and `SourceResult` are ephemeral: they exist for the
//! duration of one fetch and are discarded once folded into a
//! `PriceResult` or `UniqueItem`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed sale or offer from one marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    /// Listing title as shown by the marketplace
    pub title: String,

    /// Sale price, always positive (unparsable prices never become listings)
    pub price: f64,

    /// Sale date if the marketplace exposed one we could parse
    pub sale_date: Option<DateTime<Utc>>,

    /// Marketplace label (e.g. "eBay")
    pub source_name: String,

    /// Link back to the listing, when available
    pub url: Option<String>,
}

impl RawListing {
    /// Create a new listing with minimal fields.
    pub fn new(title: impl Into<String>, price: f64, source_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price,
            sale_date: None,
            source_name: source_name.into(),
            url: None,
        }
    }

    /// Set the sale date.
    pub fn with_sale_date(mut self, sale_date: DateTime<Utc>) -> Self {
        self.sale_date = Some(sale_date);
        self
    }

    /// Set the listing URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Output of one source adapter call.
///
/// Never constructed with zero samples: an adapter with nothing usable
/// returns `None` instead.
#[derive(Debug, Clone)]
pub struct SourceResult {
    /// Arithmetic mean of this source's usable prices
    pub average_price: f64,

    /// Number of sales backing the average
    pub sample_count: usize,

    /// Human-readable contribution label (e.g. "eBay (12 sold)")
    pub provenance: String,

    /// Individual listings, empty when the sales-detail fetch was skipped
    pub listings: Vec<RawListing>,
}

impl SourceResult {
    /// Build a result from a non-empty set of listings.
    ///
    /// Returns `None` for an empty set so the `sample_count > 0`
    /// invariant holds by construction.
    pub fn from_listings(source_name: &str, listings: Vec<RawListing>) -> Option<Self> {
        if listings.is_empty() {
            return None;
        }
        let sum: f64 = listings.iter().map(|l| l.price).sum();
        let count = listings.len();
        Some(Self {
            average_price: sum / count as f64,
            sample_count: count,
            provenance: format!("{} ({} sold)", source_name, count),
            listings,
        })
    }

    /// Drop the per-listing detail, keeping only the aggregate.
    pub fn without_listings(mut self) -> Self {
        self.listings.clear();
        self
    }
}

/// The caller-facing price aggregate for one query.
#[derive(Debug, Clone)]
pub struct PriceResult {
    /// Sample-count-weighted mean across all contributing sources
    pub average_price: f64,

    /// Join of each contributing source's provenance string
    pub combined_provenance: String,

    /// Total sales backing the average
    pub total_samples: usize,

    /// Signed percent change vs. the previous average for this query
    /// key, one decimal place; 0 when no baseline exists
    pub trend_percent: f64,

    /// When this aggregate was computed
    pub as_of: DateTime<Utc>,

    /// Up to 10 individual recent sales, newest first.
    ///
    /// Only populated on the explicit detail path, never during bulk
    /// refresh.
    pub recent_sales: Option<Vec<RawListing>>,
}

/// Outcome of a signed-item price check.
///
/// `found` is the honest signal: when no listing plausibly matches a
/// genuine signed sale, the check reports not-found rather than
/// substituting an unrelated price.
#[derive(Debug, Clone)]
pub struct SignedPriceCheck {
    /// Average over qualifying signed sales, absent when none qualified
    pub price: Option<f64>,

    /// Where the price (or the lack of one) came from
    pub provenance: String,

    /// Whether any qualifying signed listing was found
    pub found: bool,
}

impl SignedPriceCheck {
    /// A check that found qualifying signed sales.
    pub fn found(price: f64, provenance: impl Into<String>) -> Self {
        Self {
            price: Some(price),
            provenance: provenance.into(),
            found: true,
        }
    }

    /// A check that found nothing qualifying.
    pub fn not_found(provenance: impl Into<String>) -> Self {
        Self {
            price: None,
            provenance: provenance.into(),
            found: false,
        }
    }
}
