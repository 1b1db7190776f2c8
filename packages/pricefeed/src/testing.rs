//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that embed the engine
//! without making real marketplace or token-endpoint calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::auth::TokenExchange;
use crate::error::{AuthError, AuthResult};
use crate::security::ClientCredentials;
use crate::sources::{PriceQuery, PriceSource};
use crate::types::listing::{RawListing, SourceResult};

/// A mock price source with canned listings per query name.
///
/// Tracks calls and concurrent in-flight fetches so tests can assert
/// on fan-out shape, not just results. Fixture state is shared across
/// clones, so tests keep one clone for assertions and hand another to
/// the pipeline.
#[derive(Clone, Default)]
pub struct MockSource {
    name: String,

    /// Canned listings keyed by query name
    listings: Arc<RwLock<HashMap<String, Vec<RawListing>>>>,

    /// Artificial per-fetch latency
    delay: Option<Duration>,

    /// Every query this source has seen
    calls: Arc<RwLock<Vec<String>>>,

    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockSource {
    /// Create a mock source with the given marketplace label.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add canned listings for a query name.
    pub fn with_listings(self, query_name: impl Into<String>, listings: Vec<RawListing>) -> Self {
        self.listings
            .write()
            .unwrap()
            .insert(query_name.into(), listings);
        self
    }

    /// Add artificial latency to each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All queries this source has seen.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Number of fetches made.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Highest number of fetches observed in flight simultaneously.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockSource {
    async fn fetch(&self, query: &PriceQuery) -> Option<SourceResult> {
        self.calls.write().unwrap().push(query.search_terms());

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight
            .fetch_max(now_in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let listings = self.listings.read().unwrap().get(&query.name).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        SourceResult::from_listings(&self.name, listings?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A mock token exchange with a scripted outcome.
#[derive(Default)]
pub struct MockTokenExchange {
    /// Token handed out on success
    token: Option<(String, i64)>,

    /// Rejection status when no token is scripted
    reject_status: u16,

    calls: Arc<AtomicUsize>,
}

impl MockTokenExchange {
    /// An exchange that always succeeds with the given token.
    pub fn granting(token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            token: Some((token.into(), expires_in)),
            reject_status: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An exchange that always rejects with the given status.
    pub fn rejecting(status: u16) -> Self {
        Self {
            token: None,
            reject_status: status,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of exchanges attempted.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Handle for asserting call counts after the exchange is moved
    /// into an authenticator.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl TokenExchange for MockTokenExchange {
    async fn exchange(&self, _credentials: &ClientCredentials) -> AuthResult<(String, i64)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.token {
            Some((token, expires_in)) => Ok((token.clone(), *expires_in)),
            None => Err(AuthError::Rejected {
                status: self.reject_status,
            }),
        }
    }
}

/// Canned listings helper: `n` sales of `title` at `price` from
/// `source`.
pub fn listings_at(title: &str, price: f64, count: usize, source: &str) -> Vec<RawListing> {
    (0..count)
        .map(|_| RawListing::new(title, price, source))
        .collect()
}
