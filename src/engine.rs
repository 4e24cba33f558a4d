//! The search engine: inverted index, document metadata, and the
//! sequential/parallel retrieval, matching, and removal operations built
//! on top of them.
//!
//! Grounded on `original_source/search-server/search_server.{h,cpp}`. The
//! engine is not internally synchronized for `add_document`/
//! `remove_document`; callers must not run those concurrently with each
//! other or with reads, matching the original's design.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::document::{average_rating, Document, DocumentStatus};
use crate::error::{Result, SearchError};
use crate::interner::WordInterner;
use crate::query::{self, Query};
use crate::sharded_map::ShardedMap;
use crate::tokenizer::{self, is_valid_word, split};

const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
const RELEVANCE_TIE_EPSILON: f64 = 1e-6;
/// Shard count used by the parallel accumulator in `find_top_documents_parallel`.
const RELEVANCE_SHARD_COUNT: usize = 50;

#[derive(Debug, Clone, Copy)]
struct DocMeta {
    rating: i32,
    status: DocumentStatus,
}

/// The TF-IDF search engine.
pub struct SearchEngine {
    stop_words: HashSet<String>,
    interner: WordInterner,
    /// word -> (doc id -> term frequency)
    index: BTreeMap<Arc<str>, BTreeMap<i64, f64>>,
    /// doc id -> (word -> term frequency), word-for-word the same handles as `index`
    per_doc: BTreeMap<i64, BTreeMap<Arc<str>, f64>>,
    metadata: BTreeMap<i64, DocMeta>,
    document_ids: BTreeSet<i64>,
}

impl SearchEngine {
    /// Builds an engine whose stop words come from `words`. Empty strings
    /// are discarded; every remaining word must pass
    /// [`crate::tokenizer::is_valid_word`] or construction fails.
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stop_words = HashSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidStopWord(word.to_string()));
            }
            stop_words.insert(word.to_string());
        }
        Ok(Self {
            stop_words,
            interner: WordInterner::new(),
            index: BTreeMap::new(),
            per_doc: BTreeMap::new(),
            metadata: BTreeMap::new(),
            document_ids: BTreeSet::new(),
        })
    }

    /// Builds an engine whose stop words are the space-separated tokens of
    /// `text` (mirrors the original's single-string constructor).
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(split(text))
    }

    fn is_stop_word(&self, word: &str) -> bool {
        tokenizer::is_stop_word(word, &self.stop_words)
    }

    pub fn document_count(&self) -> usize {
        self.document_ids.len()
    }

    /// Ascending iteration over currently present document ids.
    pub fn document_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.document_ids.iter().copied()
    }

    /// Adds a document. Tokenizes `text`, discards stop words, and records
    /// per-word term frequencies plus the document's average rating and
    /// status.
    ///
    /// A document whose text reduces to zero non-stop tokens is accepted
    /// and recorded with no postings (see DESIGN.md for why this edge,
    /// left open by the source, is resolved this way).
    pub fn add_document(
        &mut self,
        id: i64,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if id < 0 {
            return Err(SearchError::InvalidId(id));
        }
        if self.document_ids.contains(&id) {
            return Err(SearchError::DuplicateId(id));
        }
        let tokens = split(text);
        for token in &tokens {
            if !is_valid_word(token) {
                return Err(SearchError::InvalidToken(token.to_string()));
            }
        }

        let non_stop: Vec<&str> = tokens
            .into_iter()
            .filter(|token| !self.is_stop_word(token))
            .collect();

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for word in &non_stop {
            *counts.entry(word).or_insert(0) += 1;
        }
        let inv = if non_stop.is_empty() {
            0.0
        } else {
            1.0 / non_stop.len() as f64
        };

        let mut postings = BTreeMap::new();
        for (word, count) in counts {
            let tf = count as f64 * inv;
            let handle = self.interner.intern(word);
            self.index
                .entry(Arc::clone(&handle))
                .or_default()
                .insert(id, tf);
            postings.insert(handle, tf);
        }

        self.metadata.insert(
            id,
            DocMeta {
                rating: average_rating(ratings),
                status,
            },
        );
        self.per_doc.insert(id, postings);
        self.document_ids.insert(id);
        Ok(())
    }

    fn idf(&self, word: &str) -> Option<f64> {
        let df = self.index.get(word)?.len();
        if df == 0 {
            return None;
        }
        Some((self.document_count() as f64 / df as f64).ln())
    }

    fn parse_query(&self, raw_query: &str) -> Result<Query> {
        query::parse(raw_query, |w| self.is_stop_word(w))
    }

    fn meta(&self, id: i64) -> DocMeta {
        *self
            .metadata
            .get(&id)
            .expect("document id present in index but missing metadata")
    }

    fn rank_and_truncate(mut docs: Vec<Document>) -> Vec<Document> {
        docs.sort_by(|lhs, rhs| {
            if (lhs.relevance - rhs.relevance).abs() < RELEVANCE_TIE_EPSILON {
                rhs.rating.cmp(&lhs.rating)
            } else {
                rhs.relevance
                    .partial_cmp(&lhs.relevance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }
        });
        docs.truncate(MAX_RESULT_DOCUMENT_COUNT);
        docs
    }

    /// Sequential ranked retrieval. `filter(id, status, rating)` decides
    /// whether a candidate document is kept.
    pub fn find_top_documents(
        &self,
        raw_query: &str,
        filter: impl Fn(i64, DocumentStatus, i32) -> bool,
    ) -> Result<Vec<Document>> {
        let query = self.parse_query(raw_query)?;
        let mut relevance: BTreeMap<i64, f64> = BTreeMap::new();

        for word in &query.plus_words {
            let Some(idf) = self.idf(word) else {
                continue;
            };
            let postings = &self.index[word.as_str()];
            for (&id, &tf) in postings {
                let meta = self.meta(id);
                if filter(id, meta.status, meta.rating) {
                    *relevance.entry(id).or_insert(0.0) += tf * idf;
                }
            }
        }

        for word in &query.minus_words {
            let Some(postings) = self.index.get(word.as_str()) else {
                continue;
            };
            for &id in postings.keys() {
                relevance.remove(&id);
            }
        }

        let docs = relevance
            .into_iter()
            .map(|(id, rel)| Document {
                id,
                relevance: rel,
                rating: self.meta(id).rating,
            })
            .collect();
        Ok(Self::rank_and_truncate(docs))
    }

    /// Convenience overload: keep documents whose status equals `status`.
    pub fn find_top_documents_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents(raw_query, |_, doc_status, _| doc_status == status)
    }

    /// Convenience overload: default filter, status == ACTUAL.
    pub fn find_top_documents_default(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_status(raw_query, DocumentStatus::Actual)
    }

    /// Parallel ranked retrieval. Accumulates relevance across plus-words
    /// using the sharded concurrent map (one scoped thread per plus-word,
    /// joined before minus-word exclusion begins), then removes
    /// minus-word postings, then takes an ordinary-map snapshot. Produces
    /// rankings equal (up to floating-point rounding) to the sequential
    /// variant.
    pub fn find_top_documents_parallel(
        &self,
        raw_query: &str,
        filter: impl Fn(i64, DocumentStatus, i32) -> bool + Sync,
    ) -> Result<Vec<Document>> {
        let query = self.parse_query(raw_query)?;
        let relevance: ShardedMap<i64, f64> = ShardedMap::new(RELEVANCE_SHARD_COUNT);
        let filter = &filter;

        std::thread::scope(|scope| {
            for word in &query.plus_words {
                let relevance = &relevance;
                scope.spawn(move || {
                    let Some(idf) = self.idf(word) else {
                        return;
                    };
                    let postings = &self.index[word.as_str()];
                    for (&id, &tf) in postings {
                        let meta = self.meta(id);
                        if filter(id, meta.status, meta.rating) {
                            relevance.with_mut(id, |acc| *acc += tf * idf);
                        }
                    }
                });
            }
        });
        // join barrier: every plus-word task has completed before minus-word
        // exclusion begins.

        std::thread::scope(|scope| {
            for word in &query.minus_words {
                let relevance = &relevance;
                scope.spawn(move || {
                    let Some(postings) = self.index.get(word.as_str()) else {
                        return;
                    };
                    for &id in postings.keys() {
                        relevance.erase(id);
                    }
                });
            }
        });

        let docs = relevance
            .build_ordinary_map()
            .into_iter()
            .map(|(id, rel)| Document {
                id,
                relevance: rel,
                rating: self.meta(id).rating,
            })
            .collect();
        Ok(Self::rank_and_truncate(docs))
    }

    /// Returns which of `query`'s plus-words occur in document `id`, and
    /// its status. If any minus-word of `query` occurs in the document,
    /// the word list is empty instead.
    pub fn match_document(&self, raw_query: &str, id: i64) -> Result<(Vec<String>, DocumentStatus)> {
        if !self.document_ids.contains(&id) {
            return Err(SearchError::UnknownDocumentId(id));
        }
        let query = self.parse_query(raw_query)?;
        let status = self.meta(id).status;
        let words = &self.per_doc[&id];

        for minus in &query.minus_words {
            if words.contains_key(minus.as_str()) {
                return Ok((Vec::new(), status));
            }
        }

        let matched = query
            .plus_words
            .iter()
            .filter(|plus| words.contains_key(plus.as_str()))
            .cloned()
            .collect();
        Ok((matched, status))
    }

    /// Parallel variant of [`Self::match_document`]. Tokenizes and
    /// classifies the query inline, then checks minus/plus membership
    /// concurrently before sorting and deduplicating the matched
    /// plus-words, matching the sequential variant's output order.
    pub fn match_document_parallel(
        &self,
        raw_query: &str,
        id: i64,
    ) -> Result<(Vec<String>, DocumentStatus)> {
        // Membership checks are cheap reads; the meaningful parallel work in
        // the original is the minus-word short-circuit scan, reproduced here
        // as a join over independent per-word checks.
        if !self.document_ids.contains(&id) {
            return Err(SearchError::UnknownDocumentId(id));
        }
        let query = self.parse_query(raw_query)?;
        let status = self.meta(id).status;
        let words = &self.per_doc[&id];

        let any_minus_present = std::thread::scope(|scope| {
            let handles: Vec<_> = query
                .minus_words
                .iter()
                .map(|minus| scope.spawn(move || words.contains_key(minus.as_str())))
                .collect();
            handles.into_iter().any(|h| h.join().unwrap_or(false))
        });
        if any_minus_present {
            return Ok((Vec::new(), status));
        }

        let mut matched: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = query
                .plus_words
                .iter()
                .map(|plus| {
                    let present = words.contains_key(plus.as_str());
                    scope.spawn(move || present.then(|| plus.clone()))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap_or(None))
                .collect()
        });
        matched.sort();
        matched.dedup();
        Ok((matched, status))
    }

    /// Returns the per-document `(word -> tf)` view for `id`, or an empty
    /// map if absent.
    pub fn word_frequencies(&self, id: i64) -> BTreeMap<Arc<str>, f64> {
        self.per_doc.get(&id).cloned().unwrap_or_default()
    }

    fn remove_document_words(&mut self, id: i64) -> Vec<Arc<str>> {
        self.document_ids.remove(&id);
        self.metadata.remove(&id);
        match self.per_doc.remove(&id) {
            Some(words) => words.into_keys().collect(),
            None => Vec::new(),
        }
    }

    fn prune_word(&mut self, word: &Arc<str>, id: i64) {
        if let Some(postings) = self.index.get_mut(word) {
            postings.remove(&id);
            if postings.is_empty() {
                self.index.remove(word);
                self.interner.release(word);
            }
        }
    }

    /// Removes `id` and every trace of it from the index. No-op if
    /// absent. Leaves the engine indistinguishable from the document
    /// never having been added.
    pub fn remove_document(&mut self, id: i64) {
        if !self.document_ids.contains(&id) {
            return;
        }
        tracing::debug!(document_id = id, "removing document");
        let words = self.remove_document_words(id);
        for word in &words {
            self.prune_word(word, id);
        }
    }

    /// Parallel variant: the per-word posting removal fans out across
    /// scoped threads before a join barrier, after which the (possibly
    /// now-empty) postings are pruned sequentially. Same observable
    /// effect as [`Self::remove_document`].
    pub fn remove_document_parallel(&mut self, id: i64) {
        if !self.document_ids.contains(&id) {
            return;
        }
        tracing::debug!(document_id = id, "removing document (parallel)");
        let words = self.remove_document_words(id);

        let empties: Vec<Arc<str>> = std::thread::scope(|scope| {
            let index = &self.index;
            let handles: Vec<_> = words
                .iter()
                .map(|word| {
                    scope.spawn(move || {
                        index
                            .get(word)
                            .map(|postings| postings.len() <= 1 && postings.contains_key(&id))
                            .unwrap_or(false)
                    })
                })
                .collect();
            words
                .iter()
                .cloned()
                .zip(handles.into_iter().map(|h| h.join().unwrap_or(false)))
                .filter_map(|(word, will_empty)| will_empty.then_some(word))
                .collect()
        });

        for word in &words {
            if let Some(postings) = self.index.get_mut(word) {
                postings.remove(&id);
            }
        }
        for word in &empties {
            self.index.remove(word);
            self.interner.release(word);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(stop_words: &str) -> SearchEngine {
        SearchEngine::from_text(stop_words).unwrap()
    }

    #[test]
    fn stop_word_exclusion_scenario() {
        let mut e = engine("in the");
        e.add_document(42, "cat in the city", DocumentStatus::Actual, &[1, 2, 3])
            .unwrap();
        assert!(e.find_top_documents_default("in").unwrap().is_empty());
        let cats = e.find_top_documents_default("cat").unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].id, 42);
        assert_eq!(cats[0].rating, 2);
        assert!((cats[0].relevance - 0.0).abs() < 1e-6);
    }

    #[test]
    fn minus_word_scenario() {
        let mut e = engine("in the");
        e.add_document(1, "cat in the city", DocumentStatus::Actual, &[1, 2, 3])
            .unwrap();
        e.add_document(2, "cat food is delicious", DocumentStatus::Actual, &[1, 2, 3])
            .unwrap();
        let results = e.find_top_documents_default("cat -city").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 2);
    }

    #[test]
    fn matching_scenario() {
        let mut e = engine("in the");
        e.add_document(
            1,
            "cat in the city eats cat food and does other stuff cat do",
            DocumentStatus::Banned,
            &[1, 2, 3],
        )
        .unwrap();
        let (words, status) = e.match_document("cat food", 1).unwrap();
        assert_eq!(words, vec!["cat", "food"]);
        assert_eq!(status, DocumentStatus::Banned);

        let (words, status) = e.match_document("cat food -city", 1).unwrap();
        assert!(words.is_empty());
        assert_eq!(status, DocumentStatus::Banned);
    }

    #[test]
    fn rating_scenario() {
        assert_eq!(average_rating(&[1, 2, 3]), 2);
        assert_eq!(average_rating(&[-1, -3, -3]), -2);
        assert_eq!(average_rating(&[1, 3, -3]), 0);
    }

    #[test]
    fn predicate_and_status_overloads_scenario() {
        let mut e = engine("");
        e.add_document(0, "cat food", DocumentStatus::Actual, &[1]).unwrap();
        e.add_document(1, "cat food", DocumentStatus::Banned, &[1]).unwrap();
        e.add_document(2, "cat food", DocumentStatus::Irrelevant, &[1]).unwrap();

        let ids: Vec<i64> = e
            .find_top_documents("cat food", |id, _, _| id < 2)
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![1, 0]);

        let banned = e.find_top_documents_status("cat food", DocumentStatus::Banned).unwrap();
        assert_eq!(banned.len(), 1);
        assert_eq!(banned[0].id, 1);

        assert!(e.find_top_documents_default("-city food").unwrap().is_empty());
    }

    #[test]
    fn duplicate_id_fails() {
        let mut e = engine("");
        e.add_document(0, "cat", DocumentStatus::Actual, &[]).unwrap();
        assert_eq!(
            e.add_document(0, "dog", DocumentStatus::Actual, &[]),
            Err(SearchError::DuplicateId(0))
        );
    }

    #[test]
    fn negative_id_fails() {
        let mut e = engine("");
        assert_eq!(
            e.add_document(-1, "cat", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidId(-1))
        );
    }

    #[test]
    fn empty_body_document_is_accepted_with_no_postings() {
        let mut e = engine("in the");
        e.add_document(0, "in the", DocumentStatus::Actual, &[]).unwrap();
        assert_eq!(e.document_count(), 1);
        assert!(e.word_frequencies(0).is_empty());
    }

    #[test]
    fn remove_restores_prior_state() {
        let mut e = engine("in the");
        e.add_document(1, "cat in the city", DocumentStatus::Actual, &[1])
            .unwrap();
        let before = e.find_top_documents_default("dog").unwrap();
        e.add_document(2, "dog park", DocumentStatus::Actual, &[1]).unwrap();
        e.remove_document(2);
        let after = e.find_top_documents_default("dog").unwrap();
        assert_eq!(before, after);
        assert!(e.word_frequencies(2).is_empty());
        assert_eq!(e.document_count(), 1);
    }

    #[test]
    fn remove_twice_is_a_no_op_the_second_time() {
        let mut e = engine("");
        e.add_document(1, "cat", DocumentStatus::Actual, &[]).unwrap();
        e.remove_document(1);
        e.remove_document(1);
        assert_eq!(e.document_count(), 0);
    }

    #[test]
    fn match_unknown_id_is_out_of_range() {
        let e = engine("");
        assert_eq!(
            e.match_document("cat", 7),
            Err(SearchError::UnknownDocumentId(7))
        );
    }

    #[test]
    fn parallel_find_top_matches_sequential() {
        let mut e = engine("in the");
        e.add_document(1, "cat in the city", DocumentStatus::Actual, &[1, 2, 3])
            .unwrap();
        e.add_document(2, "cat food is delicious", DocumentStatus::Actual, &[1, 2, 3])
            .unwrap();
        let seq = e.find_top_documents_default("cat -city").unwrap();
        let par = e
            .find_top_documents_parallel("cat -city", |_, status, _| status == DocumentStatus::Actual)
            .unwrap();
        assert_eq!(seq.len(), par.len());
        for (a, b) in seq.iter().zip(par.iter()) {
            assert_eq!(a.id, b.id);
            assert!((a.relevance - b.relevance).abs() < 1e-6);
        }
    }

    #[test]
    fn parallel_match_matches_sequential() {
        let mut e = engine("in the");
        e.add_document(
            1,
            "cat in the city eats cat food and does other stuff cat do",
            DocumentStatus::Banned,
            &[1, 2, 3],
        )
        .unwrap();
        let seq = e.match_document("cat food", 1).unwrap();
        let par = e.match_document_parallel("cat food", 1).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn parallel_remove_matches_sequential_effect() {
        let mut seq_engine = engine("in the");
        let mut par_engine = engine("in the");
        for e in [&mut seq_engine, &mut par_engine] {
            e.add_document(1, "cat in the city", DocumentStatus::Actual, &[1])
                .unwrap();
            e.add_document(2, "cat food", DocumentStatus::Actual, &[1])
                .unwrap();
        }
        seq_engine.remove_document(1);
        par_engine.remove_document_parallel(1);
        assert_eq!(
            seq_engine.find_top_documents_default("cat").unwrap(),
            par_engine.find_top_documents_default("cat").unwrap()
        );
    }

    #[test]
    fn relevance_and_ordering_scenario() {
        let mut e = engine("и в на");
        e.add_document(0, "белый кот модный ошейник", DocumentStatus::Actual, &[8])
            .unwrap();
        e.add_document(1, "пушистый кот пушистый хвост", DocumentStatus::Actual, &[7])
            .unwrap();
        e.add_document(2, "ухоженный пёс выразительные глаза", DocumentStatus::Actual, &[5])
            .unwrap();
        let results = e.find_top_documents_default("ухоженный кот").unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].relevance >= pair[1].relevance - 1e-6);
        }
    }
}
