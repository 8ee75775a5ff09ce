/// Bucket for terms that do not start with an ASCII lowercase letter
/// (digits, empty strings).
pub const FALLBACK_PARTITION: &str = "other";

/// Map a term to its partition key: the first one to three leading ASCII
/// alphabetic characters of the lowercased term, or [`FALLBACK_PARTITION`].
///
/// The builder and the retrieval engine must route through this exact
/// function; any divergence makes lookups silently miss.
pub fn partition_key(term: &str) -> String {
    let lower = term.to_ascii_lowercase();
    let bytes = lower.as_bytes();

    match bytes.first() {
        Some(b) if b.is_ascii_lowercase() => {}
        _ => return FALLBACK_PARTITION.to_string(),
    }

    let len = bytes
        .iter()
        .take(3)
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    lower[..len].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_letter_prefix() {
        assert_eq!(partition_key("librari"), "lib");
        assert_eq!(partition_key("quiet"), "qui");
    }

    #[test]
    fn short_terms_use_their_own_length() {
        assert_eq!(partition_key("a"), "a");
        assert_eq!(partition_key("ab"), "ab");
        assert_eq!(partition_key("abc"), "abc");
    }

    #[test]
    fn digits_cut_the_prefix() {
        assert_eq!(partition_key("a1"), "a");
        assert_eq!(partition_key("ab2"), "ab");
    }

    #[test]
    fn non_letter_start_falls_back() {
        assert_eq!(partition_key(""), FALLBACK_PARTITION);
        assert_eq!(partition_key("42"), FALLBACK_PARTITION);
        assert_eq!(partition_key("_x"), FALLBACK_PARTITION);
    }

    #[test]
    fn idempotent_across_calls() {
        for term in ["librari", "4", "zz", "capac"] {
            assert_eq!(partition_key(term), partition_key(term));
        }
    }
}
