//! OpenSearch implementation of the content store.
//!
//! This module provides a concrete implementation of `ContentStore`
//! using OpenSearch as the document store.

mod client;
mod index_config;

pub use client::OpenSearchContentStore;
pub use index_config::{IndexConfig, DEFAULT_INDEX_NAME};
