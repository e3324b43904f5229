use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "had",
            "has", "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its",
            "not", "of", "on", "or", "she", "that", "the", "their", "them", "they", "this",
            "to", "was", "were", "will", "with", "you",
        ];
        words.iter().copied().collect()
    };
}

/// Normalizes a document body or a query into index terms: NFKD fold with
/// combining marks stripped (so `café` and `cafe` index identically),
/// lowercase, word extraction, stopword removal, Porter stemming. Queries
/// and documents must go through the same pipeline or lookups miss.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    WORD.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|t| !STOPWORDS.contains(t))
        .map(|t| STEMMER.stem(t).to_string())
        .collect()
}
