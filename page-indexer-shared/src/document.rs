//! The crawled document as produced by the crawler.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{ContentRecord, MetadataRecord};

/// Source value used when the producer did not report one.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Longest `document_id` the stores key on, in characters.
pub const MAX_DOCUMENT_ID_CHARS: usize = 255;

/// One crawled web page.
///
/// `document_id` is computed by the producer from the canonical URL, so a
/// re-crawl of the same page carries the same id and overwrites every record
/// derived from the previous version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, unique per URL.
    pub document_id: String,
    /// Source URI.
    pub url: String,
    pub title: String,
    pub description: String,
    /// Kept in metadata only, never indexed as free text.
    pub keywords: String,
    /// Extracted page text. No upper bound is assumed.
    pub content: String,
    /// When the page was extracted, if the producer reported it.
    pub crawl_timestamp: Option<DateTime<Utc>>,
    /// Host or authority the page came from.
    pub source: String,
}

impl Document {
    /// Create a document with only the required fields set.
    pub fn new(document_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            url: url.into(),
            title: String::new(),
            description: String::new(),
            keywords: String::new(),
            content: String::new(),
            crawl_timestamp: None,
            source: UNKNOWN_SOURCE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_crawl_timestamp(mut self, crawl_timestamp: DateTime<Utc>) -> Self {
        self.crawl_timestamp = Some(crawl_timestamp);
        self
    }

    /// The free text that feeds the inverted index.
    ///
    /// Title, description and content joined by single spaces, in that order.
    pub fn indexable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.description.len() + self.content.len() + 2,
        );
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.description);
        text.push(' ');
        text.push_str(&self.content);
        text
    }

    /// Project the fields stored in the metadata store.
    pub fn metadata_record(&self) -> MetadataRecord {
        MetadataRecord {
            document_id: self.document_id.clone(),
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            source: self.source.clone(),
            crawl_timestamp: self.crawl_timestamp,
        }
    }

    /// Project the fields stored in the content store.
    pub fn content_record(&self) -> ContentRecord {
        ContentRecord {
            document_id: self.document_id.clone(),
            url: self.url.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            crawl_timestamp: self.crawl_timestamp,
        }
    }
}

/// Parse a crawl timestamp.
///
/// Accepts RFC 3339 with an offset, or a naive ISO-8601 date-time (with or
/// without fractional seconds) which is taken to be UTC.
pub fn parse_crawl_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_new_document_defaults() {
        let doc = Document::new("abc", "https://example.com");

        assert_eq!(doc.document_id, "abc");
        assert_eq!(doc.url, "https://example.com");
        assert_eq!(doc.title, "");
        assert_eq!(doc.keywords, "");
        assert_eq!(doc.source, UNKNOWN_SOURCE);
        assert!(doc.crawl_timestamp.is_none());
    }

    #[test]
    fn test_indexable_text_excludes_keywords() {
        let doc = Document::new("abc", "https://example.com")
            .with_title("Title")
            .with_description("Desc")
            .with_keywords("secret")
            .with_content("Body");

        assert_eq!(doc.indexable_text(), "Title Desc Body");
    }

    #[test]
    fn test_records_share_identity() {
        let doc = Document::new("abc", "https://example.com")
            .with_title("Title")
            .with_content("Body")
            .with_source("example.com");

        let metadata = doc.metadata_record();
        let content = doc.content_record();

        assert_eq!(metadata.document_id, "abc");
        assert_eq!(metadata.source, "example.com");
        assert_eq!(content.document_id, "abc");
        assert_eq!(content.content, "Body");
        assert_eq!(content.title, metadata.title);
    }

    #[test]
    fn test_parse_naive_crawler_timestamp() {
        let ts = parse_crawl_timestamp("2024-03-01T12:30:45.123456").unwrap();

        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 3);
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.second(), 45);
    }

    #[test]
    fn test_parse_rfc3339_timestamp_converts_to_utc() {
        let ts = parse_crawl_timestamp("2024-03-01T12:30:45+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_parse_invalid_timestamp() {
        assert!(parse_crawl_timestamp("").is_none());
        assert!(parse_crawl_timestamp("yesterday").is_none());
    }
}
