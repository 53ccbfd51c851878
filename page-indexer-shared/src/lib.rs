//! # Page Indexer Shared
//!
//! Types shared by every crate of the page indexer: the crawled [`Document`]
//! as delivered on the queue, and the three records derived from it.

mod document;
mod records;

pub use document::{parse_crawl_timestamp, Document, MAX_DOCUMENT_ID_CHARS, UNKNOWN_SOURCE};
pub use records::{ContentRecord, IndexEntry, MetadataRecord, TokenFrequencies};
