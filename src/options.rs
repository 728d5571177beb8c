//! Option helpers for tokenized command lines
//!
//! Commands follow a verb-first grammar: word 0 is the verb, word 1 the
//! primary argument, and everything from index 2 onward may carry
//! `option value` pairs or bare flags. The helpers here only ever look at
//! index 2 and beyond, and match option names case-insensitively.

/// Returns true iff `option` appears (case-insensitively) at index >= 2.
pub fn has_option(words: &[String], option: &str) -> bool {
    words
        .iter()
        .skip(2)
        .any(|w| w.eq_ignore_ascii_case(option))
}

/// Returns the token following the first case-insensitive occurrence of
/// `option` at index >= 2. Occurrences in the final position (with nothing
/// after them) are skipped.
pub fn get_option<'a>(words: &'a [String], option: &str) -> Option<&'a str> {
    (2..words.len())
        .filter(|&i| words[i].eq_ignore_ascii_case(option))
        .find(|&i| i + 1 < words.len())
        .map(|i| words[i + 1].as_str())
}

/// Splits a `key=value` token on the first `=`. Later `=` signs stay in the
/// value. Returns `None` when there is no `=` at all.
pub fn split_key_value(token: &str) -> Option<(&str, &str)> {
    token.split_once('=')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_has_option_at_index_two_or_later() {
        let w = words("consume events skipErrors");
        assert!(has_option(&w, "skipErrors"));
        assert!(has_option(&w, "SKIPERRORS"));
        assert!(!has_option(&w, "partition"));
    }

    #[test]
    fn test_has_option_ignores_verb_and_subject() {
        // "consume" and "partition" before index 2 must never match
        let w = words("consume partition offset beginning");
        assert!(!has_option(&w, "consume"));
        assert!(!has_option(&w, "partition"));
        assert!(has_option(&w, "offset"));
    }

    #[test]
    fn test_get_option_returns_following_token() {
        let w = words("consume events partition 3 group readers");
        assert_eq!(get_option(&w, "partition"), Some("3"));
        assert_eq!(get_option(&w, "GROUP"), Some("readers"));
        assert_eq!(get_option(&w, "offset"), None);
    }

    #[test]
    fn test_get_option_skips_trailing_match() {
        // a match in the final position has no value; an earlier valid
        // occurrence would win, a lone trailing one yields nothing
        let w = words("consume events partition");
        assert_eq!(get_option(&w, "partition"), None);

        let w = words("consume events partition 2 partition");
        assert_eq!(get_option(&w, "partition"), Some("2"));
    }

    #[test]
    fn test_get_option_never_matches_before_index_two() {
        let w = words("offset events offset 42");
        assert_eq!(get_option(&w, "offset"), Some("42"));
        let w = words("consume offset 42");
        assert_eq!(get_option(&w, "offset"), None);
        let w = words("consume offset");
        assert_eq!(get_option(&w, "offset"), None);
    }

    #[test]
    fn test_split_key_value() {
        assert_eq!(split_key_value("retention.ms=100"), Some(("retention.ms", "100")));
        assert_eq!(split_key_value("a=b=c"), Some(("a", "b=c")));
        assert_eq!(split_key_value("cleanup.policy"), None);
        assert_eq!(split_key_value("k="), Some(("k", "")));
    }
}
