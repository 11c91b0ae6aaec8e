// src/tokenize.rs
//! Headline tokenizer and token-set overlap.
//!
//! Titles are reduced to a set of lowercase alphabetic tokens (hyphens and
//! apostrophes allowed inside a word) of at least `MIN_TOKEN_LEN` characters.
//! Only set operations consume the result, so order is irrelevant.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Shortest token kept; shorter words ("a", "of", "US") carry no topical signal.
pub const MIN_TOKEN_LEN: usize = 3;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+(?:['-][A-Za-z]+)*").expect("word regex"));

/// Normalize a headline into its comparable token set.
pub fn tokenize(title: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(title)
        .map(|m| m.as_str())
        .filter(|w| w.len() >= MIN_TOKEN_LEN)
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

/// Jaccard similarity of two token sets. Two empty sets are 0.0, not NaN.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

/// Number of tokens present in `vocab`.
pub(crate) fn count_in(tokens: &HashSet<String>, vocab: &HashSet<String>) -> usize {
    tokens.iter().filter(|t| vocab.contains(*t)).count()
}
