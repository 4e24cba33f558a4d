//! In-memory TF-IDF search engine.
//!
//! Callers add short text documents (an integer id, a status tag, and a
//! list of integer ratings), then issue text queries and get back ranked
//! document ids. On top of the core engine this crate provides:
//!
//! - [`dedup`] — duplicate-document elimination by word-set equality.
//! - [`batch`] — running a list of queries concurrently against one engine.
//! - [`query_log`] — a bounded rolling record of recent query outcomes.
//! - [`sharded_map`] — the fixed-shard concurrent accumulator used by the
//!   parallel retrieval path.
//!
//! The engine itself is not internally synchronized: `add_document` and
//! `remove_document` must not run concurrently with each other or with
//! reads. `find_top_documents`, `match_document`, and
//! `get_word_frequencies` are safe to call concurrently from multiple
//! readers while no writer is active.

pub mod batch;
pub mod dedup;
pub mod document;
pub mod engine;
pub mod error;
mod interner;
pub mod query;
pub mod query_log;
pub mod sharded_map;
pub mod tokenizer;

pub use document::{Document, DocumentStatus};
pub use engine::SearchEngine;
pub use error::{Result, SearchError};
pub use query_log::QueryLog;

pub mod prelude {
    //! Common imports for using this crate.
    pub use crate::batch::{process_queries, process_queries_joined};
    pub use crate::dedup::remove_duplicates;
    pub use crate::document::{Document, DocumentStatus};
    pub use crate::engine::SearchEngine;
    pub use crate::error::{Result, SearchError};
    pub use crate::query_log::QueryLog;
}
