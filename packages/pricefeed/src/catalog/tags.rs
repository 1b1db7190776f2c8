//! Keyword tables for variant and exclusivity tagging.
//!
//! The tables are data, not code: a JSON mapping of lowercase keyword
//! to tag, shipped with a built-in default and reloadable from disk.
//! New retailers and conventions are additive edits to the mapping.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{PriceFeedError, Result};

const DEFAULT_TABLE: &str = include_str!("../../data/keyword_tags.json");

fn bracketed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([^)]*)\)|\[([^\]]*)\]").expect("valid bracket pattern"))
}

/// Keyword→tag mappings for feature and exclusivity tagging.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordTable {
    /// Variant feature keywords (chase, glow, metallic, ...)
    #[serde(default)]
    features: HashMap<String, String>,

    /// Retailer/convention exclusivity keywords
    #[serde(default)]
    exclusivity: HashMap<String, String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        serde_json::from_str(DEFAULT_TABLE).expect("built-in keyword table is valid JSON")
    }
}

impl KeywordTable {
    /// Load a table from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| PriceFeedError::TagTable(Box::new(e)))?;
        Self::from_json_str(&json)
    }

    /// Feature tags found in the given text (case-insensitive).
    ///
    /// Callers pass the item name plus any seller-supplied condition
    /// text; both routinely carry variant keywords.
    pub fn feature_tags(&self, text: &str) -> BTreeSet<String> {
        let haystack = text.to_lowercase();
        self.features
            .iter()
            .filter(|(keyword, _)| haystack.contains(keyword.as_str()))
            .map(|(_, tag)| tag.clone())
            .collect()
    }

    /// Exclusivity tags found in an item name.
    ///
    /// A match inside a parenthetical or bracketed segment beats a bare
    /// substring match elsewhere: sellers put the exclusive sticker in
    /// brackets, while bare mentions ("...fits Target shelves") are
    /// usually noise.
    pub fn exclusivity_tags(&self, name: &str) -> BTreeSet<String> {
        let segments: Vec<String> = bracketed_pattern()
            .captures_iter(name)
            .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
            .map(|m| m.as_str().to_lowercase())
            .collect();

        let bracketed: BTreeSet<String> = self
            .exclusivity
            .iter()
            .filter(|(keyword, _)| segments.iter().any(|s| s.contains(keyword.as_str())))
            .map(|(_, tag)| tag.clone())
            .collect();
        if !bracketed.is_empty() {
            return bracketed;
        }

        let haystack = name.to_lowercase();
        self.exclusivity
            .iter()
            .filter(|(keyword, _)| haystack.contains(keyword.as_str()))
            .map(|(_, tag)| tag.clone())
            .collect()
    }
}
