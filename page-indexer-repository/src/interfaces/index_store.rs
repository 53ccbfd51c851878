//! Inverted index store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::interfaces::StoreConnection;
use page_indexer_shared::TokenFrequencies;

/// Store holding `(token, document_id, frequency)` entries.
#[async_trait]
pub trait IndexStore: StoreConnection {
    /// Replace the entire set of entries for `document_id` with `frequencies`.
    ///
    /// Tokens present in a previous version of the document but absent from
    /// `frequencies` must be gone afterwards. An empty mapping removes every
    /// entry of the document.
    ///
    /// # Arguments
    ///
    /// * `document_id` - The document whose entries are replaced
    /// * `frequencies` - The freshly computed token counts
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the new set is in place
    /// * `Err(StoreError)` - If the replacement failed; the previous set is left intact
    async fn upsert(
        &self,
        document_id: &str,
        frequencies: &TokenFrequencies,
    ) -> Result<(), StoreError>;
}
