//! Data types for the price reconciliation pipeline.

pub mod config;
pub mod item;
pub mod listing;

pub use config::MarketplaceTuning;
pub use item::{SearchHit, UniqueItem};
pub use listing::{PriceResult, RawListing, SignedPriceCheck, SourceResult};
