//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the content index.

use serde_json::{json, Value};

/// Default name of the content index.
pub const DEFAULT_INDEX_NAME: &str = "documents";

/// Name and layout of the index holding document content.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Index name. Documents are stored with `_id` = `document_id`.
    pub name: String,
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

impl IndexConfig {
    /// Create a config for the given index name with single-shard defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }

    /// Get the index settings and mappings for the content index.
    ///
    /// - **keyword** fields for exact lookups by id and URL
    /// - **text** fields for the title and the extracted content
    /// - **date** field for the crawl timestamp
    pub fn index_settings(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.number_of_shards,
                "number_of_replicas": self.number_of_replicas
            },
            "mappings": {
                "dynamic": "strict",
                "properties": {
                    "document_id": {
                        "type": "keyword"
                    },
                    "url": {
                        "type": "keyword"
                    },
                    "title": {
                        "type": "text",
                        "fields": {
                            "raw": {
                                "type": "keyword",
                                "ignore_above": 512
                            }
                        }
                    },
                    "content": {
                        "type": "text"
                    },
                    "crawl_timestamp": {
                        "type": "date"
                    }
                }
            }
        })
    }
}
