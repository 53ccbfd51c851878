//! Free-text tokenizer.
//!
//! Lowercases, treats every character that is not alphanumeric as a
//! separator, and drops tokens shorter than [`MIN_TOKEN_CHARS`].
//!
//! Case folding comes from `char::to_lowercase` (Unicode default case
//! mapping, no locale tailoring) and character classes from
//! `char::is_alphanumeric`, checked on the lowercased characters. A capital
//! that lowercases to a letter plus a combining mark (`'İ'` to `"i\u{307}"`)
//! is therefore split at the mark. Token length is counted in `char`s after
//! lowercasing.

/// Shortest token kept, in characters.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Split `text` into normalized tokens, in order of appearance.
///
/// Duplicates are kept; counting is left to the caller.
///
/// ```
/// use page_indexer_pipeline::processor::tokenize;
///
/// assert_eq!(tokenize("The Cat sat, on a mat!!"), vec!["the", "cat", "sat", "mat"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for lower in text.chars().flat_map(char::to_lowercase) {
        if lower.is_alphanumeric() {
            current.push(lower);
            current_chars += 1;
        } else {
            flush(&mut tokens, &mut current, &mut current_chars);
        }
    }
    flush(&mut tokens, &mut current, &mut current_chars);

    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String, current_chars: &mut usize) {
    if *current_chars >= MIN_TOKEN_CHARS {
        tokens.push(std::mem::take(current));
    } else {
        current.clear();
    }
    *current_chars = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_sentence() {
        assert_eq!(
            tokenize("The Cat sat, on a mat!!"),
            vec!["the", "cat", "sat", "mat"]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n ").is_empty());
        assert!(tokenize("!!! ,,, ??").is_empty());
    }

    #[test]
    fn test_short_tokens_are_dropped() {
        let tokens = tokenize("a an and ox box");
        assert_eq!(tokens, vec!["and", "box"]);
        assert!(tokens.iter().all(|t| t.chars().count() >= MIN_TOKEN_CHARS));
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        assert_eq!(
            tokenize("alpha beta alpha"),
            vec!["alpha", "beta", "alpha"]
        );
    }

    #[test]
    fn test_punctuation_splits_words() {
        assert_eq!(
            tokenize("state-of-the-art e-mail snake_case"),
            vec!["state", "the", "art", "mail", "snake", "case"]
        );
    }

    #[test]
    fn test_digits_are_alphanumeric() {
        assert_eq!(tokenize("rust 2021 v1.70"), vec!["rust", "2021"]);
    }

    #[test]
    fn test_unicode_letters_are_lowercased() {
        assert_eq!(tokenize("ÉCOLE Straße ΣΟΦΙΑ"), vec!["école", "straße", "σοφια"]);
    }

    #[test]
    fn test_classes_are_checked_after_lowercasing() {
        // 'İ' lowercases to 'i' followed by U+0307 COMBINING DOT ABOVE.
        assert_eq!(tokenize("İSTANBUL"), vec!["stanbul"]);
        assert!(tokenize("İİİ KİLİM")
            .iter()
            .all(|t| t.chars().all(char::is_alphanumeric)));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // Two characters, four bytes.
        assert!(tokenize("éé").is_empty());
        assert_eq!(tokenize("ééé"), vec!["ééé"]);
    }

    #[test]
    fn test_deterministic() {
        let text = "Repeat after me: determinism, DETERMINISM!";
        assert_eq!(tokenize(text), tokenize(text));
    }
}
