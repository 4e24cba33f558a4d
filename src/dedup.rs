//! Duplicate document detection and removal.
//!
//! Grounded on `original_source/search-server/remove_duplicates.cpp`:
//! scans document ids in ascending order, keeps the first document seen
//! for each distinct non-stop word-set, and removes every later document
//! whose word-set repeats one already kept.

use std::collections::HashSet;

use crate::engine::SearchEngine;

/// Removes documents that duplicate an earlier document's word-set
/// (ignoring term frequencies, status, and ratings). Prints
/// `"Found duplicate document id <id>"` for each removed document, in
/// ascending id order, matching the original's stdout behavior.
pub fn remove_duplicates(engine: &mut SearchEngine) {
    let mut seen_word_sets: HashSet<Vec<String>> = HashSet::new();
    let mut duplicates = Vec::new();

    for id in engine.document_ids().collect::<Vec<_>>() {
        let mut words: Vec<String> = engine
            .word_frequencies(id)
            .keys()
            .map(|w| w.to_string())
            .collect();
        words.sort();
        if !seen_word_sets.insert(words) {
            duplicates.push(id);
        }
    }

    for id in duplicates {
        println!("Found duplicate document id {id}");
        tracing::debug!(document_id = id, "removing duplicate document");
        engine.remove_document(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;

    #[test]
    fn duplicate_removal_scenario() {
        let mut e = SearchEngine::new(Vec::<String>::new()).unwrap();
        e.add_document(1, "a b c", DocumentStatus::Actual, &[1]).unwrap();
        e.add_document(2, "c a b", DocumentStatus::Actual, &[1]).unwrap();
        e.add_document(3, "a b", DocumentStatus::Actual, &[1]).unwrap();

        remove_duplicates(&mut e);

        let remaining: Vec<i64> = e.document_ids().collect();
        assert_eq!(remaining, vec![1, 3]);
    }

    #[test]
    fn no_duplicates_leaves_engine_untouched() {
        let mut e = SearchEngine::new(Vec::<String>::new()).unwrap();
        e.add_document(1, "a b", DocumentStatus::Actual, &[1]).unwrap();
        e.add_document(2, "c d", DocumentStatus::Actual, &[1]).unwrap();
        remove_duplicates(&mut e);
        assert_eq!(e.document_ids().collect::<Vec<_>>(), vec![1, 2]);
    }
}
