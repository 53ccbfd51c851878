//! Records derived from a [`Document`](crate::Document), one per backing store.

use std::collections::btree_map;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of the metadata store, unique on `document_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub document_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub source: String,
    pub crawl_timestamp: Option<DateTime<Utc>>,
}

/// Document of the content store, replaced wholesale on re-ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub document_id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub crawl_timestamp: Option<DateTime<Utc>>,
}

/// "`token` occurs `frequency` times in `document_id`".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    pub token: String,
    pub document_id: String,
    pub frequency: u32,
}

/// Per-token occurrence counts for a single document.
///
/// Backed by an ordered map so iteration (and therefore every write derived
/// from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFrequencies(BTreeMap<String, u32>);

impl TokenFrequencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `token`.
    pub fn record(&mut self, token: String) {
        *self.0.entry(token).or_insert(0) += 1;
    }

    pub fn get(&self, token: &str) -> Option<u32> {
        self.0.get(token).copied()
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, u32> {
        self.0.iter()
    }

    /// Expand into index entries for `document_id`, in token order.
    pub fn entries(&self, document_id: &str) -> Vec<IndexEntry> {
        self.0
            .iter()
            .map(|(token, &frequency)| IndexEntry {
                token: token.clone(),
                document_id: document_id.to_string(),
                frequency,
            })
            .collect()
    }
}

impl FromIterator<String> for TokenFrequencies {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut frequencies = Self::new();
        for token in iter {
            frequencies.record(token);
        }
        frequencies
    }
}

impl<'a> IntoIterator for &'a TokenFrequencies {
    type Item = (&'a String, &'a u32);
    type IntoIter = btree_map::Iter<'a, String, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
