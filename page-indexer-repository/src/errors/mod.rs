//! Error types for the page indexer repository.

mod store_error;

pub use store_error::StoreError;
