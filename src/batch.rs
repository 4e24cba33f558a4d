//! Batched query execution across a single engine.
//!
//! Grounded on `original_source/search-server/process_queries.{h,cpp}`,
//! which fans queries out via `std::transform(std::execution::par, …)` — a
//! parallel map with an implicit join, not a hand-rolled thread pool. This
//! module reproduces that shape with one scoped thread per query, joined
//! before the call returns.

use crate::document::Document;
use crate::engine::SearchEngine;
use crate::error::Result;

/// Runs each of `queries` against `engine` (default ACTUAL-status filter)
/// concurrently, returning one result list per query in input order.
/// Waits for every query to finish before returning. If any query fails,
/// the first failure in input order is propagated and no partial results
/// are returned, matching `std::execution::par`'s propagate-on-exception
/// behavior in the original.
pub fn process_queries(engine: &SearchEngine, queries: &[String]) -> Result<Vec<Vec<Document>>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = queries
            .iter()
            .map(|query| scope.spawn(move || engine.find_top_documents_default(query)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("query task panicked"))
            .collect()
    })
}

/// Equivalent to the concatenation of [`process_queries`]'s results, in
/// input-query order, with each query's own ranking order preserved.
pub fn process_queries_joined(
    engine: &SearchEngine,
    queries: &[String],
) -> Result<Vec<Document>> {
    Ok(process_queries(engine, queries)?.into_iter().flatten().collect())
}
