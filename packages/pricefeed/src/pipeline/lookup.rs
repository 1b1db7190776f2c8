//! Single-query fan-out across all sources.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::aggregate::Aggregator;
use crate::sources::{PriceQuery, PriceSource};
use crate::types::listing::PriceResult;

/// Look up one query across all sources in parallel and aggregate.
///
/// Every source runs to completion (success or none) before the
/// aggregate is produced; there is no early exit on first success,
/// because sources are combined rather than raced. A source that
/// times out or fails simply contributes nothing.
pub async fn lookup_price(
    sources: &[Arc<dyn PriceSource>],
    aggregator: &Aggregator,
    query: &PriceQuery,
) -> Option<PriceResult> {
    let fetches = sources.iter().map(|source| source.fetch(query));
    let results: Vec<_> = join_all(fetches).await.into_iter().flatten().collect();

    debug!(
        query = %query.search_terms(),
        contributing = results.len(),
        total = sources.len(),
        "source fan-out complete"
    );

    aggregator.aggregate(&query.query_key(), results, query.include_sales)
}
