//! Document processor implementation.
//!
//! Decodes raw queue payloads into [`Document`]s and derives the metadata,
//! content and index records written by the loader.

use serde::Deserialize;
use tracing::{instrument, warn};

use crate::errors::PipelineError;
use crate::processor::index_builder::build_frequencies;
use page_indexer_shared::{
    parse_crawl_timestamp, ContentRecord, Document, MetadataRecord, TokenFrequencies,
    MAX_DOCUMENT_ID_CHARS, UNKNOWN_SOURCE,
};

/// Wire shape of a crawled page. Absent and `null` fields both decode to `None`.
#[derive(Debug, Deserialize)]
struct DocumentPayload {
    document_id: Option<String>,
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    keywords: Option<String>,
    content: Option<String>,
    crawl_timestamp: Option<String>,
    source: Option<String>,
}

/// Everything the loader writes for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub document_id: String,
    pub url: String,
    pub metadata: MetadataRecord,
    pub content: ContentRecord,
    pub frequencies: TokenFrequencies,
}

/// Processor that turns payloads into documents and documents into records.
///
/// The processor is responsible for:
/// - Validating the payload and rejecting malformed messages
/// - Applying field defaults
/// - Building the token frequencies of the document
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {}

impl DocumentProcessor {
    /// Create a new document processor.
    pub fn new() -> Self {
        Self {}
    }

    /// Decode a message payload.
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The decoded document with defaults applied
    /// * `Err(PipelineError::DecodeError)` - If the payload is absent, not
    ///   UTF-8 JSON, not an object of string fields, lacks a non-empty
    ///   `document_id` or `url`, or has a `document_id` longer than
    ///   [`MAX_DOCUMENT_ID_CHARS`]
    pub fn decode(&self, payload: Option<&[u8]>) -> Result<Document, PipelineError> {
        let payload = payload.ok_or_else(|| PipelineError::decode("empty payload"))?;

        let text = std::str::from_utf8(payload)
            .map_err(|e| PipelineError::decode(format!("payload is not valid UTF-8: {}", e)))?;

        let raw: DocumentPayload = serde_json::from_str(text)
            .map_err(|e| PipelineError::decode(format!("invalid document JSON: {}", e)))?;

        let document_id = required(raw.document_id, "document_id")?;
        let id_chars = document_id.chars().count();
        if id_chars > MAX_DOCUMENT_ID_CHARS {
            return Err(PipelineError::decode(format!(
                "document_id is {} characters, at most {} allowed",
                id_chars, MAX_DOCUMENT_ID_CHARS
            )));
        }
        let url = required(raw.url, "url")?;

        let crawl_timestamp = raw.crawl_timestamp.as_deref().and_then(|ts| {
            let parsed = parse_crawl_timestamp(ts);
            if parsed.is_none() {
                warn!(
                    document_id = %document_id,
                    crawl_timestamp = %ts,
                    "Ignoring unparseable crawl timestamp"
                );
            }
            parsed
        });

        let source = raw
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        Ok(Document {
            document_id,
            url,
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            keywords: raw.keywords.unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
            crawl_timestamp,
            source,
        })
    }

    /// Derive the records of every store from a decoded document.
    #[instrument(skip(self, document), fields(document_id = %document.document_id))]
    pub fn process(&self, document: &Document) -> ProcessedDocument {
        ProcessedDocument {
            document_id: document.document_id.clone(),
            url: document.url.clone(),
            metadata: document.metadata_record(),
            content: document.content_record(),
            frequencies: build_frequencies(document),
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, PipelineError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(PipelineError::decode(format!("field `{}` is empty", field))),
        None => Err(PipelineError::decode(format!(
            "missing required field `{}`",
            field
        ))),
    }
}

/// First `max_bytes` of a payload as lossy UTF-8, for logging.
pub(crate) fn payload_preview(payload: Option<&[u8]>, max_bytes: usize) -> String {
    match payload {
        None => "<none>".to_string(),
        Some(bytes) if bytes.len() <= max_bytes => String::from_utf8_lossy(bytes).into_owned(),
        Some(bytes) => format!("{}...", String::from_utf8_lossy(&bytes[..max_bytes])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn decode(json: &str) -> Result<Document, PipelineError> {
        DocumentProcessor::new().decode(Some(json.as_bytes()))
    }

    #[test]
    fn test_decode_full_document() {
        let document = decode(
            r#"{
                "document_id": "5d41402abc4b2a76b9719d911017c592",
                "url": "https://example.com/page",
                "title": "Example",
                "description": "An example page",
                "keywords": "example, page",
                "content": "Hello world",
                "crawl_timestamp": "2024-05-01T08:15:00.123456",
                "source": "example.com"
            }"#,
        )
        .unwrap();

        assert_eq!(document.document_id, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(document.title, "Example");
        assert_eq!(document.keywords, "example, page");
        assert_eq!(document.source, "example.com");
        assert_eq!(document.crawl_timestamp.unwrap().hour(), 8);
    }

    #[test]
    fn test_decode_applies_defaults() {
        let document = decode(r#"{"document_id": "X", "url": "https://example.com"}"#).unwrap();

        assert_eq!(document.title, "");
        assert_eq!(document.description, "");
        assert_eq!(document.content, "");
        assert_eq!(document.source, "unknown");
        assert!(document.crawl_timestamp.is_none());
    }

    #[test]
    fn test_decode_treats_null_as_absent() {
        let document = decode(
            r#"{"document_id": "X", "url": "https://example.com", "title": null, "source": null}"#,
        )
        .unwrap();

        assert_eq!(document.title, "");
        assert_eq!(document.source, "unknown");
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let document =
            decode(r#"{"document_id": "X", "url": "https://example.com", "lang": "en"}"#).unwrap();
        assert_eq!(document.document_id, "X");
    }

    #[test]
    fn test_decode_keeps_bad_timestamp_out() {
        let document = decode(
            r#"{"document_id": "X", "url": "https://example.com", "crawl_timestamp": "soon"}"#,
        )
        .unwrap();
        assert!(document.crawl_timestamp.is_none());
    }

    #[test]
    fn test_missing_document_id_is_malformed() {
        let err = decode(r#"{"url": "https://example.com"}"#).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("document_id"));
    }

    #[test]
    fn test_overlong_document_id_is_malformed() {
        let exact = format!(
            r#"{{"document_id": "{}", "url": "https://example.com"}}"#,
            "a".repeat(MAX_DOCUMENT_ID_CHARS)
        );
        assert!(decode(&exact).is_ok());

        let long = format!(
            r#"{{"document_id": "{}", "url": "https://example.com"}}"#,
            "a".repeat(MAX_DOCUMENT_ID_CHARS + 1)
        );
        let err = decode(&long).unwrap_err();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("document_id"));
    }

    #[test]
    fn test_long_free_text_fields_are_kept() {
        let title = "t".repeat(70 * 1024);
        let json = format!(
            r#"{{"document_id": "X", "url": "https://example.com", "title": "{}"}}"#,
            title
        );
        assert_eq!(decode(&json).unwrap().title.len(), title.len());
    }

    #[test]
    fn test_empty_url_is_malformed() {
        let err = decode(r#"{"document_id": "X", "url": "  "}"#).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let err = decode(r#"{"document_id": 42, "url": "https://example.com"}"#).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_invalid_encoding_is_malformed() {
        let processor = DocumentProcessor::new();

        assert!(processor.decode(None).unwrap_err().is_malformed_input());
        assert!(processor
            .decode(Some(&[0xff, 0xfe, 0x00]))
            .unwrap_err()
            .is_malformed_input());
        assert!(processor
            .decode(Some(b"not json"))
            .unwrap_err()
            .is_malformed_input());
        assert!(processor
            .decode(Some(b"[1, 2, 3]"))
            .unwrap_err()
            .is_malformed_input());
    }

    #[test]
    fn test_process_derives_all_records() {
        let processor = DocumentProcessor::new();
        let document = Document::new("X", "https://example.com")
            .with_title("Alpha")
            .with_content("alpha beta alpha");

        let processed = processor.process(&document);

        assert_eq!(processed.document_id, "X");
        assert_eq!(processed.metadata.title, "Alpha");
        assert_eq!(processed.content.content, "alpha beta alpha");
        assert_eq!(processed.frequencies.get("alpha"), Some(3));
        assert_eq!(processed.frequencies.get("beta"), Some(1));
    }

    #[test]
    fn test_payload_preview_truncates() {
        assert_eq!(payload_preview(None, 4), "<none>");
        assert_eq!(payload_preview(Some(b"abc"), 4), "abc");
        assert_eq!(payload_preview(Some(b"abcdefgh"), 4), "abcd...");
    }
}
