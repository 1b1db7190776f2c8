//! Raw-response extractors.
//!
//! One extractor exists per (marketplace × access method) pair. A
//! structured response is a direct serde field mapping; a markup
//! response walks ordered selector profiles until one yields, which
//! absorbs layout drift without touching calling code.

pub mod api;
pub mod markup;
pub mod text;

pub use api::ApiListingExtractor;
pub use markup::{MarkupListingExtractor, SelectorProfile};
pub use text::{parse_price_text, parse_sale_date};

use crate::error::FetchResult;
use crate::types::listing::RawListing;

/// Turns one marketplace's raw response body into normalized listings.
///
/// Extractors are pure: they never fetch, so they are tested with
/// canned response bodies and no network.
pub trait ListingExtractor: Send + Sync {
    /// Extract listings from a raw response body.
    ///
    /// An empty vector means the response was understood but carried
    /// no usable listings. An error means the shape itself was not
    /// recognized: for markup, that is the drift signal that a
    /// selector profile needs updating.
    fn extract(&self, raw: &str) -> FetchResult<Vec<RawListing>>;

    /// Extractor name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
