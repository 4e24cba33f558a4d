//! Space-splitting tokenizer and word-validity checks.
//!
//! Grounded on the original `SplitIntoWords`/`IsValidWord` helpers: split on
//! ASCII space only, drop empty fragments, reject any byte below 0x20.

/// Splits `text` on ASCII space (0x20), producing non-empty token slices.
///
/// Leading, trailing, and repeated spaces never produce empty tokens.
pub fn split(text: &str) -> Vec<&str> {
    text.split(' ').filter(|token| !token.is_empty()).collect()
}

/// True iff `word` contains no byte in `[0x00, 0x1F]`.
///
/// Validated on the raw byte rather than as a signed `char`, which makes
/// the rule agnostic to whether the source byte is part of a multi-byte
/// UTF-8 sequence (bytes `>= 0x80` are always valid here).
pub fn is_valid_word(word: &str) -> bool {
    word.bytes().all(|b| b >= 0x20)
}

/// True iff `word` is a member of `stop_words`. Shared by document
/// tokenization (`SearchEngine::add_document`) and query parsing
/// (`query::parse`), mirroring how the original's `IsStopWord` is a single
/// private helper reused by both `AddDocument` and `ParseQueryWord`.
pub fn is_stop_word(word: &str, stop_words: &std::collections::HashSet<String>) -> bool {
    stop_words.contains(word)
}
