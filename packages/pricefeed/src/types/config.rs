//! Shared fetch tuning for marketplace adapters.

use std::time::Duration;

/// Per-marketplace fetch tuning.
///
/// The defaults are what a production run uses; tests shorten the
/// timeout and tighten the caps.
#[derive(Debug, Clone)]
pub struct MarketplaceTuning {
    /// Time bound for each network call
    pub request_timeout: Duration,

    /// Maximum scraped items collected per page, bounds parse latency
    pub scrape_item_cap: usize,

    /// Lower sanity bound: scraped prices at or below this are parsing
    /// artifacts or non-comparable accessories
    pub sanity_min: f64,

    /// Upper sanity bound: scraped prices at or above this are usually
    /// "lot" sales, not single-item prices
    pub sanity_max: f64,

    /// Currency filter for structured search
    pub currency: String,

    /// Desktop browser user-agent for scrape requests
    pub user_agent: String,

    /// Accept-Language header for scrape requests
    pub accept_language: String,
}

impl Default for MarketplaceTuning {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            scrape_item_cap: 12,
            sanity_min: 5.0,
            sanity_max: 1000.0,
            currency: "USD".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl MarketplaceTuning {
    /// Create tuning with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the scraped-item cap.
    pub fn with_scrape_cap(mut self, cap: usize) -> Self {
        self.scrape_item_cap = cap;
        self
    }

    /// Set the price sanity window (exclusive bounds).
    pub fn with_sanity_window(mut self, min: f64, max: f64) -> Self {
        self.sanity_min = min;
        self.sanity_max = max;
        self
    }

    /// Set the currency filter.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// True when a scraped price falls inside the sanity window.
    pub fn price_is_sane(&self, price: f64) -> bool {
        price > self.sanity_min && price < self.sanity_max
    }
}
