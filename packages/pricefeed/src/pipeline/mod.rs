//! Fetch orchestration.
//!
//! A single lookup fans out to every source in parallel and waits for
//! all of them: sources combine, they don't race. Bulk refresh bounds
//! concurrency, paces batches, and cancels cooperatively.

pub mod lookup;
pub mod refresh;

pub use lookup::lookup_price;
pub use refresh::{
    refresh_collection, RefreshConfig, RefreshReport, RefreshRequest, RefreshedPrice,
};
