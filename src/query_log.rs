//! A bounded FIFO log of recent query outcomes.
//!
//! Grounded on `original_source/search-server/request_queue.{h,cpp}`:
//! wraps a single engine, forwards every call to `find_top_documents`,
//! records the result count, and evicts from the head once the queue
//! would otherwise exceed capacity (one slot per minute of a day, 1440,
//! in the original).

use std::collections::VecDeque;

use crate::document::{Document, DocumentStatus};
use crate::engine::SearchEngine;
use crate::error::Result;

/// Capacity of the rolling query-outcome log.
pub const CAPACITY: usize = 1440;

struct QueryOutcome {
    result_count: usize,
}

/// Wraps a [`SearchEngine`] and records the outcome of every
/// `find_top_documents` call made through it. Not thread-safe: callers
/// must serialize calls to `add_request`.
pub struct QueryLog<'engine> {
    engine: &'engine SearchEngine,
    outcomes: VecDeque<QueryOutcome>,
}

impl<'engine> QueryLog<'engine> {
    pub fn new(engine: &'engine SearchEngine) -> Self {
        Self {
            engine,
            outcomes: VecDeque::new(),
        }
    }

    fn record(&mut self, result_count: usize) {
        if self.outcomes.len() >= CAPACITY {
            tracing::debug!(capacity = CAPACITY, "evicting oldest query log entry");
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(QueryOutcome { result_count });
    }

    /// Runs `raw_query` with an arbitrary predicate filter and records the
    /// outcome.
    pub fn add_request(
        &mut self,
        raw_query: &str,
        filter: impl Fn(i64, DocumentStatus, i32) -> bool,
    ) -> Result<Vec<Document>> {
        let result = self.engine.find_top_documents(raw_query, filter)?;
        self.record(result.len());
        Ok(result)
    }

    /// Runs `raw_query` filtered to a single status and records the
    /// outcome.
    pub fn add_request_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.add_request(raw_query, move |_, doc_status, _| doc_status == status)
    }

    /// Runs `raw_query` with the default ACTUAL-status filter and records
    /// the outcome.
    pub fn add_request_default(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_request_status(raw_query, DocumentStatus::Actual)
    }

    /// Number of currently queued records whose result count was zero.
    pub fn no_result_requests(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result_count == 0).count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
