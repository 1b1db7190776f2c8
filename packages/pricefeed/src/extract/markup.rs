//! Markup extraction via ordered selector profiles.
//!
//! Marketplace search pages change layout without notice. Each profile
//! describes one known layout as CSS selectors; profiles are walked
//! most-specific-first and the first one that yields at least one
//! listing wins. A layout change means adding a profile, not touching
//! calling code.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::extract::text::{parse_price_text, parse_sale_date};
use crate::extract::ListingExtractor;
use crate::types::listing::RawListing;

/// One known page layout, described as CSS selectors.
///
/// `item` selects each result card; the remaining selectors run inside
/// a card. Selectors are compiled at construction and are part of the
/// profile's definition, so an invalid selector is a programmer error.
pub struct SelectorProfile {
    name: String,
    item: Selector,
    title: Selector,
    price: Selector,
    date: Option<Selector>,
    link: Option<Selector>,
    /// Card titles to skip (marketplace ad/placeholder cards)
    skip_titles: Vec<String>,
}

impl SelectorProfile {
    /// Create a profile from its required selectors.
    pub fn new(name: impl Into<String>, item: &str, title: &str, price: &str) -> Self {
        Self {
            name: name.into(),
            item: compile(item),
            title: compile(title),
            price: compile(price),
            date: None,
            link: None,
            skip_titles: Vec::new(),
        }
    }

    /// Selector for the sold-date text inside a card.
    pub fn with_date(mut self, selector: &str) -> Self {
        self.date = Some(compile(selector));
        self
    }

    /// Selector for the listing link inside a card.
    pub fn with_link(mut self, selector: &str) -> Self {
        self.link = Some(compile(selector));
        self
    }

    /// Skip cards whose title equals the given placeholder text.
    pub fn skip_title(mut self, title: impl Into<String>) -> Self {
        self.skip_titles.push(title.into());
        self
    }

    /// Profile name (for logging).
    pub fn name(&self) -> &str {
        &self.name
    }

    fn extract_from(&self, document: &Html, source_name: &str) -> Vec<RawListing> {
        let mut listings = Vec::new();

        for card in document.select(&self.item) {
            let Some(title) = select_text(card, &self.title) else {
                continue;
            };
            if self.skip_titles.iter().any(|skip| skip == &title) {
                continue;
            }

            // No parsable positive price, no listing.
            let Some(price) = select_text(card, &self.price).and_then(|t| parse_price_text(&t))
            else {
                continue;
            };

            let mut listing = RawListing::new(title, price, source_name);

            if let Some(date_selector) = &self.date {
                if let Some(date) = select_text(card, date_selector).and_then(|t| parse_sale_date(&t))
                {
                    listing = listing.with_sale_date(date);
                }
            }

            if let Some(link_selector) = &self.link {
                if let Some(href) = card
                    .select(link_selector)
                    .next()
                    .and_then(|el| el.value().attr("href"))
                {
                    listing = listing.with_url(href);
                }
            }

            listings.push(listing);
        }

        listings
    }
}

fn compile(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid CSS selector")
}

fn select_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text: String = card
        .select(selector)
        .next()?
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extractor that walks selector profiles over a search-results page.
pub struct MarkupListingExtractor {
    source_name: String,
    profiles: Vec<SelectorProfile>,
}

impl MarkupListingExtractor {
    /// Create an extractor from ordered profiles (most specific first).
    pub fn new(source_name: impl Into<String>, profiles: Vec<SelectorProfile>) -> Self {
        Self {
            source_name: source_name.into(),
            profiles,
        }
    }
}

impl ListingExtractor for MarkupListingExtractor {
    fn extract(&self, raw: &str) -> FetchResult<Vec<RawListing>> {
        let document = Html::parse_document(raw);

        for profile in &self.profiles {
            let listings = profile.extract_from(&document, &self.source_name);
            if !listings.is_empty() {
                debug!(
                    source = %self.source_name,
                    profile = %profile.name,
                    count = listings.len(),
                    "selector profile matched"
                );
                return Ok(listings);
            }
        }

        // Every profile missed: either a genuinely empty result page or
        // drifted markup. Logged either way so drift gets noticed.
        warn!(
            source = %self.source_name,
            profiles = self.profiles.len(),
            "no selector profile yielded listings"
        );
        Err(FetchError::UnrecognizedShape {
            src: self.source_name.clone(),
        })
    }

    fn name(&self) -> &str {
        "markup"
    }
}
