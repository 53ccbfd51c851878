//! In-memory metadata, content and index stores.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::interfaces::{ContentStore, IndexStore, MetadataStore, StoreConnection};
use crate::memory::faults::FaultInjector;
use page_indexer_shared::{ContentRecord, IndexEntry, MetadataRecord, TokenFrequencies};

/// Metadata store keeping rows in a map keyed by `document_id`.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    rows: Mutex<HashMap<String, MetadataRecord>>,
    faults: FaultInjector,
    closed: AtomicBool,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    pub fn get(&self, document_id: &str) -> Option<MetadataRecord> {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(document_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnection for InMemoryMetadataStore {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.is_closed())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn upsert(&self, record: &MetadataRecord) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::connection("store is closed"));
        }
        self.faults.check().await?;

        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.document_id.clone(), record.clone());
        Ok(())
    }
}

/// Content store keeping records in a map keyed by `document_id`.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    records: Mutex<HashMap<String, ContentRecord>>,
    faults: FaultInjector,
    closed: AtomicBool,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    pub fn get(&self, document_id: &str) -> Option<ContentRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(document_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnection for InMemoryContentStore {
    fn name(&self) -> &'static str {
        "content"
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.is_closed())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn upsert(&self, record: &ContentRecord) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::connection("store is closed"));
        }
        self.faults.check().await?;

        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.document_id.clone(), record.clone());
        Ok(())
    }
}

/// Index store keeping entries keyed by `(token, document_id)`.
#[derive(Debug, Default)]
pub struct InMemoryIndexStore {
    entries: Mutex<BTreeMap<(String, String), u32>>,
    faults: FaultInjector,
    closed: AtomicBool,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Every entry stored for `document_id`, as a token → frequency mapping.
    pub fn frequencies_for(&self, document_id: &str) -> BTreeMap<String, u32> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|((_, doc), _)| doc == document_id)
            .map(|((token, _), &frequency)| (token.clone(), frequency))
            .collect()
    }

    /// Every document containing `token`.
    pub fn postings(&self, token: &str) -> Vec<IndexEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|((t, _), _)| t == token)
            .map(|((token, document_id), &frequency)| IndexEntry {
                token: token.clone(),
                document_id: document_id.clone(),
                frequency,
            })
            .collect()
    }

    /// Total number of `(token, document_id)` entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnection for InMemoryIndexStore {
    fn name(&self) -> &'static str {
        "index"
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.is_closed())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn upsert(
        &self,
        document_id: &str,
        frequencies: &TokenFrequencies,
    ) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::connection("store is closed"));
        }
        self.faults.check().await?;

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(_, doc), _| doc != document_id);
        for (token, &frequency) in frequencies {
            entries.insert((token.clone(), document_id.to_string()), frequency);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequencies(tokens: &[&str]) -> TokenFrequencies {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_index_upsert_replaces_previous_entries() {
        let store = InMemoryIndexStore::new();

        store
            .upsert("X", &frequencies(&["alpha", "beta", "alpha"]))
            .await
            .unwrap();
        assert_eq!(store.frequencies_for("X").get("alpha"), Some(&2));

        store.upsert("X", &frequencies(&["gamma"])).await.unwrap();

        let entries = store.frequencies_for("X");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("gamma"), Some(&1));
        assert!(store.postings("alpha").is_empty());
    }

    #[tokio::test]
    async fn test_index_upsert_leaves_other_documents_alone() {
        let store = InMemoryIndexStore::new();

        store.upsert("X", &frequencies(&["shared"])).await.unwrap();
        store.upsert("Y", &frequencies(&["shared", "other"])).await.unwrap();
        store.upsert("X", &frequencies(&[])).await.unwrap();

        assert!(store.frequencies_for("X").is_empty());
        assert_eq!(store.postings("shared").len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_upsert_keeps_previous_state() {
        let store = InMemoryIndexStore::new();
        store.upsert("X", &frequencies(&["alpha"])).await.unwrap();

        store
            .faults()
            .fail_next(1, StoreError::connection("unreachable"));
        let result = store.upsert("X", &frequencies(&["gamma"])).await;

        assert!(result.is_err());
        assert_eq!(store.frequencies_for("X").get("alpha"), Some(&1));
    }

    #[tokio::test]
    async fn test_metadata_upsert_overwrites_row() {
        let store = InMemoryMetadataStore::new();
        let mut record = MetadataRecord {
            document_id: "X".to_string(),
            url: "https://example.com".to_string(),
            title: "Old".to_string(),
            description: String::new(),
            keywords: String::new(),
            source: "example.com".to_string(),
            crawl_timestamp: None,
        };

        store.upsert(&record).await.unwrap();
        record.title = "New".to_string();
        store.upsert(&record).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("X").unwrap().title, "New");
    }

    #[tokio::test]
    async fn test_closed_store_refuses_writes() {
        let store = InMemoryContentStore::new();
        store.close().await;

        let record = ContentRecord {
            document_id: "X".to_string(),
            url: "https://example.com".to_string(),
            title: String::new(),
            content: String::new(),
            crawl_timestamp: None,
        };

        let err = store.upsert(&record).await.unwrap_err();
        assert!(err.is_connection());
        assert!(!store.health_check().await.unwrap());
    }
}
