//! Metadata store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::interfaces::StoreConnection;
use page_indexer_shared::MetadataRecord;

/// Store holding one metadata row per document.
#[async_trait]
pub trait MetadataStore: StoreConnection {
    /// Insert the record, or overwrite every non-key field of the existing
    /// row with the same `document_id`.
    ///
    /// Fields are never merged: the stored row afterwards equals `record`.
    async fn upsert(&self, record: &MetadataRecord) -> Result<(), StoreError>;
}
