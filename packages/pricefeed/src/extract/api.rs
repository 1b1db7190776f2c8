//! Structured-API response extraction.
//!
//! The sold-items search endpoint returns JSON item summaries; mapping
//! them to listings is a serde field mapping plus the shared price and
//! date normalization.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::extract::text::{parse_price_text, parse_sale_date};
use crate::extract::ListingExtractor;
use crate::types::listing::RawListing;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    item_summaries: Vec<ItemSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    title: Option<String>,
    price: Option<PriceField>,
    item_end_date: Option<String>,
    item_web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceField {
    value: Option<String>,
}

/// Extractor for the structured sold-items search response.
pub struct ApiListingExtractor {
    source_name: String,
}

impl ApiListingExtractor {
    /// Create an extractor labeling listings with the given source.
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
        }
    }

    fn to_listing(&self, item: &ItemSummary) -> Option<RawListing> {
        let title = item.title.as_deref()?.trim();
        if title.is_empty() {
            return None;
        }

        // Items whose price does not parse as a positive number are
        // discarded, not defaulted.
        let price = parse_price_text(item.price.as_ref()?.value.as_deref()?)?;

        let mut listing = RawListing::new(title, price, &self.source_name);
        if let Some(date) = item
            .item_end_date
            .as_deref()
            .and_then(parse_sale_date)
        {
            listing = listing.with_sale_date(date);
        }
        if let Some(url) = &item.item_web_url {
            listing = listing.with_url(url);
        }
        Some(listing)
    }
}

impl ListingExtractor for ApiListingExtractor {
    fn extract(&self, raw: &str) -> FetchResult<Vec<RawListing>> {
        let response: SearchResponse = serde_json::from_str(raw).map_err(|e| {
            warn!(source = %self.source_name, error = %e, "unparsable API response");
            FetchError::UnrecognizedShape {
                src: self.source_name.clone(),
            }
        })?;

        let listings: Vec<RawListing> = response
            .item_summaries
            .iter()
            .filter_map(|item| self.to_listing(item))
            .collect();

        debug!(
            source = %self.source_name,
            returned = response.item_summaries.len(),
            usable = listings.len(),
            "API extraction complete"
        );
        Ok(listings)
    }

    fn name(&self) -> &str {
        "api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "itemSummaries": [
            {
                "title": "Vinyl Figure #57",
                "price": { "value": "24.99", "currency": "USD" },
                "itemEndDate": "2025-07-01T12:00:00.000Z",
                "itemWebUrl": "https://example.com/itm/1"
            },
            {
                "title": "Vinyl Figure #57 (damaged box)",
                "price": { "value": "not a price" }
            },
            {
                "title": "Vinyl Figure #57 lot",
                "price": { "value": "0.00" }
            }
        ]
    }"#;

    #[test]
    fn test_maps_fields_and_drops_unparsable_prices() {
        let extractor = ApiListingExtractor::new("eBay");
        let listings = extractor.extract(SAMPLE).unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Vinyl Figure #57");
        assert_eq!(listings[0].price, 24.99);
        assert!(listings[0].sale_date.is_some());
        assert_eq!(listings[0].url.as_deref(), Some("https://example.com/itm/1"));
    }

    #[test]
    fn test_empty_summaries_is_clean_no_data() {
        let extractor = ApiListingExtractor::new("eBay");
        let listings = extractor.extract(r#"{"itemSummaries": []}"#).unwrap();
        assert!(listings.is_empty());

        // Missing field entirely is also understood as no data.
        let listings = extractor.extract("{}").unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn test_malformed_json_is_shape_error() {
        let extractor = ApiListingExtractor::new("eBay");
        assert!(matches!(
            extractor.extract("<html>rate limited</html>"),
            Err(FetchError::UnrecognizedShape { .. })
        ));
    }
}
