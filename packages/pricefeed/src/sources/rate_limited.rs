//! Rate-limited source wrapper.
//!
//! Wraps any PriceSource implementation with rate limiting using the
//! governor crate. Marketplace anti-automation defenses are triggered
//! by bursts, not volume; this keeps bulk refreshes polite.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::sources::{PriceQuery, PriceSource};
use crate::types::listing::SourceResult;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A source wrapper that enforces rate limits.
pub struct RateLimitedSource<S: PriceSource> {
    inner: S,
    limiter: Arc<DefaultRateLimiter>,
}

impl<S: PriceSource> RateLimitedSource<S> {
    /// Create a new rate-limited source.
    ///
    /// # Arguments
    /// * `source` - The underlying source to wrap
    /// * `requests_per_second` - Maximum fetches per second
    pub fn new(source: S, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        )
        .allow_burst(nonzero!(1u32));
        Self {
            inner: source,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create with a custom quota.
    pub fn with_quota(source: S, quota: Quota) -> Self {
        Self {
            inner: source,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for RateLimitedSource<S> {
    async fn fetch(&self, query: &PriceQuery) -> Option<SourceResult> {
        self.limiter.until_ready().await;
        self.inner.fetch(query).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for easy rate limiting.
pub trait SourceExt: PriceSource + Sized {
    /// Wrap this source with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedSource<Self> {
        RateLimitedSource::new(self, requests_per_second)
    }
}

impl<S: PriceSource + Sized> SourceExt for S {}
