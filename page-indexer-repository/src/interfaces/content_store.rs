//! Content store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::interfaces::StoreConnection;
use page_indexer_shared::ContentRecord;

/// Store holding the full extracted text of each document.
#[async_trait]
pub trait ContentStore: StoreConnection {
    /// Replace the stored record keyed by `record.document_id`, or insert it.
    async fn upsert(&self, record: &ContentRecord) -> Result<(), StoreError>;
}
