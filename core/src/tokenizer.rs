use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[a-zA-Z0-9]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Lowercase `text`, split it into maximal alphanumeric runs, and stem each
/// run. Returns the set of distinct stems: the index records term presence,
/// not frequency, so duplicates collapse here.
///
/// Empty or whitespace-only input yields an empty set.
pub fn tokenize_and_stem(text: &str) -> HashSet<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut stems = HashSet::new();
    for mat in TOKEN_RE.find_iter(&normalized) {
        stems.insert(STEMMER.stem(mat.as_str()).to_string());
    }
    stems
}

/// Query-side normalization: same pipeline as [`tokenize_and_stem`]. Build
/// and query must agree on the stem set or lookups silently miss.
pub fn normalize_query(query: &str) -> HashSet<String> {
    tokenize_and_stem(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_and_deduplicates() {
        let stems = tokenize_and_stem("Libraries library LIBRARY!");
        assert_eq!(stems.len(), 1);
        assert!(stems.contains("librari"));
    }

    #[test]
    fn splits_on_non_alphanumeric() {
        let stems = tokenize_and_stem("cap-4, whiteboard/display");
        assert!(stems.contains("cap"));
        assert!(stems.contains("4"));
        assert!(stems.contains("whiteboard"));
        assert!(stems.contains("display"));
    }

    #[test]
    fn empty_input_is_empty_set() {
        assert!(tokenize_and_stem("").is_empty());
        assert!(tokenize_and_stem("   \t\n").is_empty());
        assert!(tokenize_and_stem("!!! --- ???").is_empty());
    }

    #[test]
    fn deterministic() {
        let a = tokenize_and_stem("Quiet group study rooms");
        let b = tokenize_and_stem("Quiet group study rooms");
        assert_eq!(a, b);
    }
}
