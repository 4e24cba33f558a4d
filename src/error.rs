//! Crate-wide error type.
//!
//! Mirrors the error shape used elsewhere in this codebase: a plain enum
//! with a hand-written `Display` impl rather than a derive-macro crate, so
//! callers get stable, human-readable messages without pulling in extra
//! dependencies for what is a handful of variants.

use std::fmt;

/// Errors raised by [`crate::engine::SearchEngine`] and the components
/// built on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A document id was negative.
    InvalidId(i64),
    /// `add_document` was called with an id already present in the engine.
    DuplicateId(i64),
    /// A token (in document text or a query) contained a control character.
    InvalidToken(String),
    /// A stop word failed the word-validity rule.
    InvalidStopWord(String),
    /// A query word was empty or malformed (bare `-`, `--word`, etc).
    InvalidQueryWord(String),
    /// `match_document` was called with an id not present in the engine.
    UnknownDocumentId(i64),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidId(id) => write!(f, "document id must be non-negative, got {id}"),
            SearchError::DuplicateId(id) => write!(f, "document id {id} already exists"),
            SearchError::InvalidToken(word) => {
                write!(f, "token contains a control character: {word:?}")
            }
            SearchError::InvalidStopWord(word) => write!(f, "invalid stop word: {word:?}"),
            SearchError::InvalidQueryWord(word) => write!(f, "malformed query word: {word:?}"),
            SearchError::UnknownDocumentId(id) => write!(f, "no document with id {id}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;
