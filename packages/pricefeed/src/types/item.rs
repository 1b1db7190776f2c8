//! Canonical item types and the dedup key.
//!
//! Grouping is deliberately conservative: two hits merge only when
//! their dedup keys are byte-identical. Textual similarity alone never
//! merges, because distinct variants (chase, retailer exclusives,
//! signed) share a base name and would otherwise be collapsed,
//! destroying the variant-level pricing signal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::listing::RawListing;

/// One search hit prior to canonicalization.
///
/// Richer than a `RawListing`: carries the identifiers and imagery the
/// dedup key is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    /// Item name as reported by the source
    pub title: String,

    /// Catalog number printed on the box, when known
    pub catalog_number: Option<String>,

    /// Stable catalog identifier (barcode, catalog id), when known
    pub stable_id: Option<String>,

    /// Primary image URL
    pub image_url: Option<String>,

    /// Source label this hit came from
    pub source_name: String,

    /// Seller-supplied condition/description text
    pub condition_text: Option<String>,

    /// Observed price, when the hit carried one
    pub price: Option<f64>,

    /// Link back to the hit
    pub url: Option<String>,
}

impl SearchHit {
    /// Create a hit with minimal fields.
    pub fn new(title: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_name: source_name.into(),
            ..Default::default()
        }
    }

    /// Set the catalog number.
    pub fn with_catalog_number(mut self, number: impl Into<String>) -> Self {
        self.catalog_number = Some(number.into());
        self
    }

    /// Set the stable identifier.
    pub fn with_stable_id(mut self, id: impl Into<String>) -> Self {
        self.stable_id = Some(id.into());
        self
    }

    /// Set the image URL.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Set the condition text.
    pub fn with_condition_text(mut self, text: impl Into<String>) -> Self {
        self.condition_text = Some(text.into());
        self
    }

    /// Set the observed price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the hit URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The dedup key two hits must share, byte for byte, to merge.
    ///
    /// A stable identifier takes priority; without one the source name
    /// participates so cross-source hits with ambiguous identity stay
    /// apart. Different images always produce different keys.
    pub fn dedup_key(&self) -> String {
        let image = self.image_url.as_deref().unwrap_or("");
        match &self.stable_id {
            Some(id) => format!("{}|{}|{}", id, self.title, image),
            None => format!(
                "{}|{}|{}|{}",
                self.title,
                self.catalog_number.as_deref().unwrap_or(""),
                self.source_name,
                image
            ),
        }
    }

    /// Convert to a listing, when the hit carried a price.
    pub fn to_listing(&self) -> Option<RawListing> {
        let price = self.price?;
        if price <= 0.0 {
            return None;
        }
        let mut listing = RawListing::new(&self.title, price, &self.source_name);
        if let Some(url) = &self.url {
            listing = listing.with_url(url);
        }
        Some(listing)
    }
}

/// A canonical collectible variant with its merged listings.
#[derive(Debug, Clone)]
pub struct UniqueItem {
    /// Canonical display name
    pub name: String,

    /// Catalog number, when known
    pub catalog_number: Option<String>,

    /// Retailer/convention exclusivity tags (e.g. "Hot Topic", "SDCC")
    pub exclusivity_tags: BTreeSet<String>,

    /// Variant feature tags (e.g. "Chase", "Glow-in-the-Dark")
    pub feature_tags: BTreeSet<String>,

    /// All listings judged to be this exact variant
    pub listings: Vec<RawListing>,

    /// Primary image URL
    pub primary_image: Option<String>,
}

impl UniqueItem {
    /// Catalog number as a number, when it parses as one.
    ///
    /// Used for presentation sorting: numbered items sort numerically
    /// and ahead of unnumbered ones.
    pub fn numeric_catalog_number(&self) -> Option<u64> {
        self.catalog_number.as_deref()?.trim().parse().ok()
    }
}
