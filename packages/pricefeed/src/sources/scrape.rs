//! Markup-scraping fetch strategy.
//!
//! Used as the fallback for API-capable marketplaces and as the only
//! method for marketplaces without one. Requests carry a realistic
//! desktop browser header set; responses are parsed, never rendered.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::extract::markup::MarkupListingExtractor;
use crate::extract::ListingExtractor;
use crate::sources::{FetchStrategy, PriceQuery};
use crate::types::config::MarketplaceTuning;
use crate::types::listing::SourceResult;

/// Where and how to issue a sold-listings page search.
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    /// Search page URL
    pub search_url: String,

    /// Name of the free-text query parameter
    pub query_param: String,

    /// Fixed parameters (sold/completed filters and the like)
    pub fixed_params: Vec<(String, String)>,

    /// Referer header value
    pub referer: String,
}

impl ScrapeTarget {
    /// Create a target for a search page.
    pub fn new(search_url: impl Into<String>, query_param: impl Into<String>) -> Self {
        let search_url = search_url.into();
        let referer = Url::parse(&search_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| format!("{}://{}/", u.scheme(), h)))
            .unwrap_or_else(|| search_url.clone());
        Self {
            search_url,
            query_param: query_param.into(),
            fixed_params: Vec::new(),
            referer,
        }
    }

    /// Add a fixed query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fixed_params.push((key.into(), value.into()));
        self
    }

    /// Override the referer.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    fn build_url(&self, terms: &str) -> FetchResult<Url> {
        let mut url = Url::parse(&self.search_url).map_err(|_| FetchError::InvalidUrl {
            url: self.search_url.clone(),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.fixed_params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(&self.query_param, terms);
        }
        Ok(url)
    }
}

/// Fetches a sold-listings search page and extracts prices from it.
pub struct ScrapeStrategy {
    source_name: String,
    http: reqwest::Client,
    target: ScrapeTarget,
    extractor: MarkupListingExtractor,
    tuning: MarketplaceTuning,
}

impl ScrapeStrategy {
    /// Create a scrape strategy for one marketplace.
    pub fn new(
        source_name: impl Into<String>,
        target: ScrapeTarget,
        extractor: MarkupListingExtractor,
        tuning: MarketplaceTuning,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            http: reqwest::Client::builder()
                .timeout(tuning.request_timeout)
                .build()
                .expect("failed to create HTTP client"),
            target,
            extractor,
            tuning,
        }
    }
}

#[async_trait]
impl FetchStrategy for ScrapeStrategy {
    async fn attempt(&self, query: &PriceQuery) -> FetchResult<Option<SourceResult>> {
        let terms = query.search_terms();
        let url = self.target.build_url(&terms)?;

        debug!(source = %self.source_name, url = %url, "scrape fetch starting");

        let response = self
            .http
            .get(url.clone())
            .header(USER_AGENT, &self.tuning.user_agent)
            .header(ACCEPT_LANGUAGE, &self.tuning.accept_language)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(REFERER, &self.target.referer)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let mut listings = self.extractor.extract(&body)?;

        // Sanity window rejects parsing artifacts and "lot" prices; the
        // cap bounds downstream work per page.
        listings.retain(|l| self.tuning.price_is_sane(l.price));
        listings.truncate(self.tuning.scrape_item_cap);

        let result = SourceResult::from_listings(&self.source_name, listings)
            .map(|r| if query.include_sales { r } else { r.without_listings() });
        Ok(result)
    }

    fn name(&self) -> &str {
        "scrape"
    }
}
