//! Inverted index builder.

use page_indexer_shared::{Document, TokenFrequencies};

use crate::processor::tokenizer::tokenize;

/// Compute the token frequencies of a document.
///
/// Title, description and content are joined with single spaces and
/// tokenized once. Keywords stay out of the free-text index.
pub fn build_frequencies(document: &Document) -> TokenFrequencies {
    tokenize(&document.indexable_text()).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_tokens_across_fields() {
        let document = Document::new("X", "https://example.com")
            .with_title("Rust Search")
            .with_description("search engine")
            .with_content("An inverted index for search");

        let frequencies = build_frequencies(&document);

        assert_eq!(frequencies.get("search"), Some(3));
        assert_eq!(frequencies.get("rust"), Some(1));
        assert_eq!(frequencies.get("inverted"), Some(1));
        assert_eq!(frequencies.get("an"), None);
    }

    #[test]
    fn test_fields_do_not_run_together() {
        let document = Document::new("X", "https://example.com")
            .with_title("abc")
            .with_description("def")
            .with_content("ghi");

        let frequencies = build_frequencies(&document);

        assert_eq!(frequencies.len(), 3);
        assert_eq!(frequencies.get("abcdef"), None);
    }

    #[test]
    fn test_keywords_are_not_indexed() {
        let document = Document::new("X", "https://example.com")
            .with_keywords("hidden keyword")
            .with_content("visible");

        let frequencies = build_frequencies(&document);

        assert_eq!(frequencies.get("hidden"), None);
        assert_eq!(frequencies.get("visible"), Some(1));
    }

    #[test]
    fn test_empty_document_yields_empty_mapping() {
        let document = Document::new("X", "https://example.com");
        assert!(build_frequencies(&document).is_empty());
    }

    #[test]
    fn test_same_document_same_mapping() {
        let document = Document::new("X", "https://example.com").with_content("alpha beta alpha");

        let first = build_frequencies(&document);
        let second = build_frequencies(&document);

        assert_eq!(first, second);
        assert_eq!(first.get("alpha"), Some(2));
        assert_eq!(first.get("beta"), Some(1));
    }
}
