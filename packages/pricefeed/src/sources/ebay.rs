//! eBay source adapter.
//!
//! Preferred access method is the token-gated structured search API;
//! when no credential is available or the API call fails, the chain
//! falls back to scraping the sold/completed listings page. This is
//! also the marketplace that answers signed-item price checks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::auth::TokenAuthenticator;
use crate::error::{FetchError, FetchResult};
use crate::extract::api::ApiListingExtractor;
use crate::extract::markup::{MarkupListingExtractor, SelectorProfile};
use crate::extract::ListingExtractor;
use crate::sources::scrape::{ScrapeStrategy, ScrapeTarget};
use crate::sources::{FetchStrategy, PriceQuery, PriceSource, SignedPriceSource, StrategyChain};
use crate::types::config::MarketplaceTuning;
use crate::types::listing::{RawListing, SignedPriceCheck, SourceResult};

const SOURCE_NAME: &str = "eBay";

/// eBay endpoint and tuning configuration.
///
/// Endpoints are configuration so tests and region redeployments never
/// touch adapter code.
#[derive(Debug, Clone)]
pub struct EbayConfig {
    /// Structured sold-items search endpoint
    pub api_search_url: String,

    /// OAuth client-credentials token endpoint
    pub token_url: String,

    /// OAuth scope requested with the token
    pub oauth_scope: String,

    /// Marketplace-region header value
    pub marketplace_id: String,

    /// Sold/completed listings search page (scrape fallback)
    pub scrape_search_url: String,

    /// Shared fetch tuning
    pub tuning: MarketplaceTuning,
}

impl Default for EbayConfig {
    fn default() -> Self {
        Self {
            api_search_url: "https://api.ebay.com/buy/browse/v1/item_summary/search".to_string(),
            token_url: "https://api.ebay.com/identity/v1/oauth2/token".to_string(),
            oauth_scope: "https://api.ebay.com/oauth/api_scope".to_string(),
            marketplace_id: "EBAY_US".to_string(),
            scrape_search_url: "https://www.ebay.com/sch/i.html".to_string(),
            tuning: MarketplaceTuning::default(),
        }
    }
}

/// Selector profiles for the eBay sold-listings page, newest layout
/// first.
pub fn ebay_sold_profiles() -> Vec<SelectorProfile> {
    vec![
        SelectorProfile::new("ebay-s-item", "li.s-item", ".s-item__title", ".s-item__price")
            .with_date(".s-item__caption--signal.POSITIVE")
            .with_link("a.s-item__link")
            .skip_title("Shop on eBay"),
        SelectorProfile::new(
            "ebay-srp-river",
            "div.s-item__wrapper",
            ".s-item__title",
            ".s-item__price",
        )
        .with_link("a.s-item__link")
        .skip_title("Shop on eBay"),
        SelectorProfile::new("ebay-legacy-lv", "li.sresult", ".lvtitle", ".lvprice")
            .with_link(".lvtitle a"),
    ]
}

/// Structured-API fetch strategy.
pub struct EbayApiStrategy {
    http: reqwest::Client,
    config: EbayConfig,
    authenticator: Arc<TokenAuthenticator>,
    extractor: ApiListingExtractor,
}

impl EbayApiStrategy {
    /// Create the API strategy.
    pub fn new(config: EbayConfig, authenticator: Arc<TokenAuthenticator>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(config.tuning.request_timeout)
                .build()
                .expect("failed to create HTTP client"),
            config,
            authenticator,
            extractor: ApiListingExtractor::new(SOURCE_NAME),
        }
    }

    fn build_url(&self, terms: &str) -> FetchResult<Url> {
        let mut url =
            Url::parse(&self.config.api_search_url).map_err(|_| FetchError::InvalidUrl {
                url: self.config.api_search_url.clone(),
            })?;
        url.query_pairs_mut()
            .append_pair("q", terms)
            .append_pair(
                "filter",
                &format!(
                    "soldItemsOnly:true,priceCurrency:{}",
                    self.config.tuning.currency
                ),
            )
            .append_pair("limit", "50");
        Ok(url)
    }
}

#[async_trait]
impl FetchStrategy for EbayApiStrategy {
    async fn attempt(&self, query: &PriceQuery) -> FetchResult<Option<SourceResult>> {
        // No credential means the caller tries the next method; it is
        // not an error.
        let Some(credential) = self.authenticator.get_access_token().await else {
            debug!("no API credential, skipping structured search");
            return Ok(None);
        };

        let url = self.build_url(&query.search_terms())?;
        debug!(url = %url, "API fetch starting");

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(credential.access_token.expose())
            .header("X-EBAY-C-MARKETPLACE-ID", &self.config.marketplace_id)
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

        let listings = self.extractor.extract(&body)?;
        let result = SourceResult::from_listings(SOURCE_NAME, listings)
            .map(|r| if query.include_sales { r } else { r.without_listings() });
        Ok(result)
    }

    fn name(&self) -> &str {
        "ebay-api"
    }
}

/// The eBay source: API first, scrape fallback.
pub struct EbaySource {
    chain: StrategyChain,
}

impl EbaySource {
    /// Create the source with its standard strategy chain.
    pub fn new(config: EbayConfig, authenticator: Arc<TokenAuthenticator>) -> Self {
        let scrape_target = ScrapeTarget::new(config.scrape_search_url.as_str(), "_nkw")
            .with_param("LH_Sold", "1")
            .with_param("LH_Complete", "1");
        let scrape = ScrapeStrategy::new(
            SOURCE_NAME,
            scrape_target,
            MarkupListingExtractor::new(SOURCE_NAME, ebay_sold_profiles()),
            config.tuning.clone(),
        );
        let api = EbayApiStrategy::new(config, authenticator);

        Self {
            chain: StrategyChain::new(vec![Box::new(api), Box::new(scrape)]),
        }
    }

    /// Create the source from an explicit strategy chain.
    pub fn from_chain(chain: StrategyChain) -> Self {
        Self { chain }
    }

    fn qualifying_signed<'a>(
        listings: &'a [RawListing],
        signer: &str,
    ) -> Vec<&'a RawListing> {
        let signer = signer.to_lowercase();
        listings
            .iter()
            .filter(|listing| {
                let title = listing.title.to_lowercase();
                let mentions_signing =
                    title.contains("signed") || title.contains("autograph");
                mentions_signing && (signer.is_empty() || title.contains(&signer))
            })
            .collect()
    }
}

#[async_trait]
impl PriceSource for EbaySource {
    async fn fetch(&self, query: &PriceQuery) -> Option<SourceResult> {
        self.chain.run(query).await
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

#[async_trait]
impl SignedPriceSource for EbaySource {
    async fn fetch_signed(
        &self,
        name: &str,
        catalog_number: &str,
        signer: &str,
        qualifiers: &[String],
    ) -> SignedPriceCheck {
        let mut terms: Vec<&str> = [name, catalog_number, "signed", signer]
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        terms.extend(qualifiers.iter().map(String::as_str));

        // Listing titles are needed to vet the matches, so this query
        // always carries detail.
        let query = PriceQuery::new(terms.join(" ")).with_sales();
        let Some(result) = self.chain.run(&query).await else {
            return SignedPriceCheck::not_found(SOURCE_NAME);
        };

        let qualifying = Self::qualifying_signed(&result.listings, signer);
        if qualifying.is_empty() {
            return SignedPriceCheck::not_found(SOURCE_NAME);
        }

        let sum: f64 = qualifying.iter().map(|l| l.price).sum();
        let count = qualifying.len();
        SignedPriceCheck::found(
            sum / count as f64,
            format!("{} ({} signed sold)", SOURCE_NAME, count),
        )
    }
}
