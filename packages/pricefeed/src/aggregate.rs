//! Combining per-source results into one price aggregate.
//!
//! The mean is weighted by sample count, so a source with many
//! corroborating sales outweighs one with a single outlier sale. The
//! trend baseline lives in an injected, lock-protected map: the only
//! process-lifetime state in the engine besides the token cache.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use crate::types::listing::{PriceResult, RawListing, SourceResult};

/// Maximum individual sales attached to a detail-path result.
const RECENT_SALES_CAP: usize = 10;

/// Combines source results and tracks trend baselines per query key.
#[derive(Default)]
pub struct Aggregator {
    previous: Mutex<HashMap<String, f64>>,
}

impl Aggregator {
    /// Create an aggregator with no baselines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the trend baseline for a query key.
    ///
    /// Lets a caller restore baselines from its own persisted records
    /// after a restart; without seeding, the first aggregate for a key
    /// reports a flat trend.
    pub fn seed_baseline(&self, key: impl Into<String>, price: f64) {
        if price > 0.0 {
            self.previous.lock().unwrap().insert(key.into(), price);
        }
    }

    /// Current baseline for a key, if any.
    pub fn baseline(&self, key: &str) -> Option<f64> {
        self.previous.lock().unwrap().get(key).copied()
    }

    /// Combine source results into one aggregate.
    ///
    /// Returns `None` when nothing contributed: the caller renders
    /// that as "price unavailable," never as an error.
    pub fn aggregate(
        &self,
        key: &str,
        results: Vec<SourceResult>,
        include_sales: bool,
    ) -> Option<PriceResult> {
        if results.is_empty() {
            return None;
        }

        let total_samples: usize = results.iter().map(|r| r.sample_count).sum();
        if total_samples == 0 {
            return None;
        }

        let weighted_sum: f64 = results
            .iter()
            .map(|r| r.average_price * r.sample_count as f64)
            .sum();
        let average_price = weighted_sum / total_samples as f64;

        let combined_provenance = results
            .iter()
            .map(|r| r.provenance.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        // Swap the baseline under one short lock: next call computes
        // trend against this aggregate, not against itself.
        let trend_percent = {
            let mut previous = self.previous.lock().unwrap();
            let trend = match previous.get(key) {
                Some(&prior) if prior > 0.0 => {
                    round_one_decimal(((average_price - prior) / prior) * 100.0)
                }
                _ => 0.0,
            };
            previous.insert(key.to_string(), average_price);
            trend
        };

        let recent_sales = include_sales.then(|| {
            let mut sales: Vec<RawListing> = results
                .into_iter()
                .flat_map(|r| r.listings)
                .collect();
            // Newest first; undated sales sort last.
            sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
            sales.truncate(RECENT_SALES_CAP);
            sales
        });

        debug!(
            key = %key,
            average = average_price,
            samples = total_samples,
            trend = trend_percent,
            "aggregated price"
        );

        Some(PriceResult {
            average_price,
            combined_provenance,
            total_samples,
            trend_percent,
            as_of: Utc::now(),
            recent_sales,
        })
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn source(average: f64, count: usize, label: &str) -> SourceResult {
        let listings = (0..count)
            .map(|_| RawListing::new("Figure", average, label))
            .collect();
        SourceResult::from_listings(label, listings).unwrap()
    }

    #[test]
    fn test_weighted_mean_and_total_samples() {
        let aggregator = Aggregator::new();
        let result = aggregator
            .aggregate(
                "figure",
                vec![source(10.0, 2, "eBay"), source(14.0, 1, "Mercari")],
                false,
            )
            .unwrap();

        assert_eq!(result.total_samples, 3);
        assert!((result.average_price - 34.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.combined_provenance, "eBay (2 sold), Mercari (1 sold)");
    }

    #[test]
    fn test_empty_input_is_none() {
        let aggregator = Aggregator::new();
        assert!(aggregator.aggregate("figure", vec![], false).is_none());
    }

    #[test]
    fn test_first_aggregate_has_flat_trend() {
        let aggregator = Aggregator::new();
        let result = aggregator
            .aggregate("figure", vec![source(20.0, 1, "eBay")], false)
            .unwrap();
        assert_eq!(result.trend_percent, 0.0);
    }

    #[test]
    fn test_trend_against_previous_aggregate() {
        let aggregator = Aggregator::new();
        aggregator
            .aggregate("figure", vec![source(20.0, 1, "eBay")], false)
            .unwrap();
        let result = aggregator
            .aggregate("figure", vec![source(25.0, 1, "eBay")], false)
            .unwrap();
        assert_eq!(result.trend_percent, 25.0);
    }

    #[test]
    fn test_trend_is_idempotent_for_stable_price() {
        let aggregator = Aggregator::new();
        aggregator
            .aggregate("figure", vec![source(20.0, 3, "eBay")], false)
            .unwrap();
        let repeat = aggregator
            .aggregate("figure", vec![source(20.0, 3, "eBay")], false)
            .unwrap();
        assert_eq!(repeat.trend_percent, 0.0);
    }

    #[test]
    fn test_trend_rounds_to_one_decimal() {
        let aggregator = Aggregator::new();
        aggregator
            .aggregate("figure", vec![source(30.0, 1, "eBay")], false)
            .unwrap();
        let result = aggregator
            .aggregate("figure", vec![source(31.0, 1, "eBay")], false)
            .unwrap();
        // 1/30 is 3.333…%; stored to one decimal place.
        assert_eq!(result.trend_percent, 3.3);
    }

    #[test]
    fn test_seeded_baseline_feeds_first_trend() {
        let aggregator = Aggregator::new();
        aggregator.seed_baseline("figure", 20.0);
        let result = aggregator
            .aggregate("figure", vec![source(22.0, 1, "eBay")], false)
            .unwrap();
        assert_eq!(result.trend_percent, 10.0);
    }

    #[test]
    fn test_trend_keys_are_independent() {
        let aggregator = Aggregator::new();
        aggregator
            .aggregate("figure a", vec![source(20.0, 1, "eBay")], false)
            .unwrap();
        let other = aggregator
            .aggregate("figure b", vec![source(40.0, 1, "eBay")], false)
            .unwrap();
        assert_eq!(other.trend_percent, 0.0);
    }

    #[test]
    fn test_recent_sales_newest_first_and_capped() {
        let aggregator = Aggregator::new();
        let listings: Vec<RawListing> = (1..=12)
            .map(|day| {
                RawListing::new("Figure", 10.0, "eBay").with_sale_date(
                    Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap(),
                )
            })
            .collect();
        let results = vec![SourceResult::from_listings("eBay", listings).unwrap()];

        let aggregate = aggregator.aggregate("figure", results, true).unwrap();
        let sales = aggregate.recent_sales.unwrap();

        assert_eq!(sales.len(), 10);
        assert_eq!(sales[0].sale_date.unwrap().day(), 12);
        assert!(sales.windows(2).all(|w| w[0].sale_date >= w[1].sale_date));
    }

    #[test]
    fn test_bulk_path_attaches_no_sales() {
        let aggregator = Aggregator::new();
        let result = aggregator
            .aggregate("figure", vec![source(20.0, 1, "eBay")], false)
            .unwrap();
        assert!(result.recent_sales.is_none());
    }
}
