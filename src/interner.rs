//! Shared word storage for the inverted index and its per-document mirror.
//!
//! The original source shares memory by storing `string_view`s that point
//! into the inverted index's own keys. Rust has no equivalent borrow that
//! could outlive a `HashMap` insert/remove cycle, so this crate follows
//! design-note recommendation (b): an interned-string table handing out
//! cheaply-clonable `Arc<str>` handles. Both the inverted index and the
//! per-document view store the same handle for a given word, so equality
//! and hashing are pointer-cheap and the two views agree word-for-word by
//! construction.

use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct WordInterner {
    words: HashMap<Arc<str>, Arc<str>>,
}

impl WordInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared handle for `word`, interning it if this is the
    /// first time it has been seen.
    pub fn intern(&mut self, word: &str) -> Arc<str> {
        if let Some(existing) = self.words.get(word) {
            return Arc::clone(existing);
        }
        let handle: Arc<str> = Arc::from(word);
        self.words.insert(Arc::clone(&handle), Arc::clone(&handle));
        handle
    }

    /// Drops the interned handle for `word` once no posting list
    /// references it. Safe to call even if other `Arc<str>` clones are
    /// still alive elsewhere (e.g. briefly held by a caller) — the
    /// allocation is freed only when the last clone drops.
    pub fn release(&mut self, word: &str) {
        self.words.remove(word);
    }
}
