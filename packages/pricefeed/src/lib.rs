//! Marketplace Sold-Price Reconciliation Engine
//!
//! Given an item description, discovers recent sold-price history from
//! multiple independent, unreliable marketplaces: a token-gated
//! structured API and brittle, drifting markup: and merges the
//! results into a single trustworthy average with a trend signal.
//!
//! # Design Philosophy
//!
//! **"Degrade the source, never the query"**
//!
//! - Every access method is one strategy in an explicit chain;
//!   auth expiry or a timeout falls through to the next, silently
//! - Sources combine, they don't race: a lookup waits for all of them
//! - Variants never merge on textual similarity: over-splitting is
//!   cheaper than destroying the variant-level price signal
//! - Markup drift is absorbed by adding a selector profile, not by
//!   touching calling code
//!
//! # Usage
//!
//! ```rust,ignore
//! use pricefeed::{ClientCredentials, PriceFeed};
//!
//! // Standard marketplaces; None runs scrape-only
//! let feed = PriceFeed::with_default_sources(Some(
//!     ClientCredentials::new(client_id, client_secret),
//! ));
//!
//! // One item
//! let price = feed.fetch_average_price("Vinyl Figure", Some("57"), false).await;
//!
//! // Whole collection, bounded and cancellable
//! let report = feed.refresh_collection(&requests, &cancel).await;
//! ```
//!
//! # Modules
//!
//! - [`sources`] - Source adapters and the fetch strategy chain
//! - [`extract`] - Raw-response extractors (structured + selector profiles)
//! - [`auth`] - Bearer-token acquisition and caching
//! - [`aggregate`] - Weighted-mean aggregation and trend tracking
//! - [`catalog`] - Canonicalization and variant grouping
//! - [`pipeline`] - Fan-out, bulk refresh, cancellation
//! - [`testing`] - Mock implementations for testing

pub mod aggregate;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod security;
pub mod sources;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use error::{AuthError, FetchError, PriceFeedError};
pub use types::{
    config::MarketplaceTuning,
    item::{SearchHit, UniqueItem},
    listing::{PriceResult, RawListing, SignedPriceCheck, SourceResult},
};

// Re-export the facade
pub use client::{PriceFeed, PriceFeedBuilder};

// Re-export component seams
pub use aggregate::Aggregator;
pub use auth::{ApiCredential, HttpTokenExchange, TokenAuthenticator, TokenExchange};
pub use catalog::{Canonicalizer, KeywordTable};
pub use extract::{
    ApiListingExtractor, ListingExtractor, MarkupListingExtractor, SelectorProfile,
};
pub use pipeline::{
    lookup_price, refresh_collection, RefreshConfig, RefreshReport, RefreshRequest,
    RefreshedPrice,
};
pub use security::{ClientCredentials, SecretString};
pub use sources::{
    EbayConfig, EbaySource, FetchStrategy, MercariConfig, MercariSource, PriceQuery, PriceSource,
    RateLimitedSource, ScrapeStrategy, ScrapeTarget, SignedPriceSource, SourceExt, StrategyChain,
};

// Re-export testing utilities
pub use testing::{listings_at, MockSource, MockTokenExchange};
