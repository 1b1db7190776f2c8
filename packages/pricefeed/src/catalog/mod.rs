//! Canonicalization of search hits into variant-distinct items.
//!
//! The grouping rule is exact-key equality, nothing fuzzier. Chase,
//! retailer-exclusive, and signed variants share base names; merging
//! on textual similarity would collapse them and destroy the
//! variant-level pricing signal. Over-splitting is the accepted cost.

pub mod tags;

pub use tags::KeywordTable;

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::types::item::{SearchHit, UniqueItem};

/// Groups heterogeneous search hits into canonical items.
pub struct Canonicalizer {
    table: KeywordTable,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(KeywordTable::default())
    }
}

impl Canonicalizer {
    /// Create a canonicalizer over the given keyword table.
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    /// Group hits into canonical items, one per distinct dedup key.
    ///
    /// Hits carrying a price contribute a listing to their item; tag
    /// sets are the union over all merged hits, since any one seller
    /// may mention the variant keywords the others omit.
    pub fn group_hits(&self, hits: &[SearchHit]) -> Vec<UniqueItem> {
        let mut by_key: HashMap<String, UniqueItem> = HashMap::new();

        for hit in hits {
            let key = hit.dedup_key();
            let scan_text = match &hit.condition_text {
                Some(condition) => format!("{} {}", hit.title, condition),
                None => hit.title.clone(),
            };

            let item = by_key.entry(key).or_insert_with(|| UniqueItem {
                name: hit.title.clone(),
                catalog_number: hit.catalog_number.clone(),
                exclusivity_tags: Default::default(),
                feature_tags: Default::default(),
                listings: Vec::new(),
                primary_image: hit.image_url.clone(),
            });

            item.feature_tags.extend(self.table.feature_tags(&scan_text));
            item.exclusivity_tags
                .extend(self.table.exclusivity_tags(&hit.title));
            if let Some(listing) = hit.to_listing() {
                item.listings.push(listing);
            }
        }

        let mut items: Vec<UniqueItem> = by_key.into_values().collect();
        sort_for_presentation(&mut items);

        debug!(hits = hits.len(), items = items.len(), "grouped search hits");
        items
    }
}

/// Presentation order: ascending catalog number when both sides have a
/// numeric one, numbered items before unnumbered, then ascending name.
fn sort_for_presentation(items: &mut [UniqueItem]) {
    items.sort_by(|a, b| {
        match (a.numeric_catalog_number(), b.numeric_catalog_number()) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    });
}
