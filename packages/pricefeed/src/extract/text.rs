//! Price-text and date-text normalization.
//!
//! Marketplaces render prices and dates for humans, not parsers:
//! currency symbols, thousands separators, locale prefixes ("US $"),
//! and half a dozen date layouts. Normalization happens here, once,
//! so every extractor shares the same rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Human-readable date layouts tried after the ISO forms, in order.
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%m/%d/%Y", "%Y-%m-%d", "%d %b %Y"];

fn price_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid price pattern"))
}

/// Parse a displayed price into a positive number.
///
/// Strips currency symbols, thousands separators, and surrounding
/// noise before numeric parsing. `"$1,234.56"` parses to `1234.56`;
/// `"US $12.99"` parses to `12.99`. Text with no usable number returns
/// `None`: a listing whose price cannot be parsed is dropped, never
/// defaulted to zero.
pub fn parse_price_text(raw: &str) -> Option<f64> {
    let matched = price_pattern().find(raw)?;
    let cleaned = matched.as_str().replace(',', "");
    let price: f64 = cleaned.parse().ok()?;
    if price > 0.0 {
        Some(price)
    } else {
        None
    }
}

/// Parse a displayed sale date.
///
/// Tries, in order: RFC 3339 (with or without fractional seconds), a
/// bare ISO datetime, then the common human-readable layouts. Returns
/// `None` when nothing matches: the listing is still kept, just with
/// no reliable date for recency ordering.
pub fn parse_sale_date(raw: &str) -> Option<DateTime<Utc>> {
    let text = normalize_date_text(raw);
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed.and_utc());
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(text, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// Strip marketplace labels ("Sold", "Sold Item") that prefix the date.
fn normalize_date_text(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("Sold Item")
        .or_else(|| trimmed.strip_prefix("Sold"))
        .unwrap_or(trimmed)
        .trim_start_matches([' ', ':'])
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_price_with_thousands_separator() {
        assert_eq!(parse_price_text("$1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_parse_price_with_locale_prefix() {
        assert_eq!(parse_price_text("US $12.99"), Some(12.99));
    }

    #[test]
    fn test_parse_price_plain() {
        assert_eq!(parse_price_text("49.99"), Some(49.99));
        assert_eq!(parse_price_text("£20"), Some(20.0));
    }

    #[test]
    fn test_unparsable_price_is_dropped_not_zeroed() {
        assert_eq!(parse_price_text("Best Offer"), None);
        assert_eq!(parse_price_text(""), None);
        assert_eq!(parse_price_text("$0.00"), None);
    }

    #[test]
    fn test_parse_date_rfc3339_with_fraction() {
        let parsed = parse_sale_date("2025-07-14T18:03:21.512Z").unwrap();
        assert_eq!(parsed.year(), 2025);
        assert_eq!(parsed.minute(), 3);
    }

    #[test]
    fn test_parse_date_rfc3339_without_fraction() {
        let parsed = parse_sale_date("2025-07-14T18:03:21Z").unwrap();
        assert_eq!(parsed.day(), 14);
    }

    #[test]
    fn test_parse_date_human_formats() {
        assert_eq!(parse_sale_date("Oct 12, 2025").unwrap().month(), 10);
        assert_eq!(parse_sale_date("10/12/2025").unwrap().day(), 12);
        assert_eq!(parse_sale_date("2025-10-12").unwrap().year(), 2025);
        assert_eq!(parse_sale_date("12 Oct 2025").unwrap().month(), 10);
    }

    #[test]
    fn test_parse_date_with_sold_prefix() {
        let parsed = parse_sale_date("Sold  Oct 12, 2025").unwrap();
        assert_eq!(parsed.month(), 10);
    }

    #[test]
    fn test_unmatched_date_is_none() {
        assert_eq!(parse_sale_date("yesterday"), None);
        assert_eq!(parse_sale_date(""), None);
    }
}
