//! Processor module for the page indexer pipeline.
//!
//! Decodes queue payloads into documents and derives the records written to
//! each store.

mod document_processor;
pub mod index_builder;
pub mod tokenizer;

pub use document_processor::{DocumentProcessor, ProcessedDocument};
pub(crate) use document_processor::payload_preview;
pub use index_builder::build_frequencies;
pub use tokenizer::tokenize;
