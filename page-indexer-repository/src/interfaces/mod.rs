//! Interface definitions for the backing stores.
//!
//! One trait per logical store, all sharing the [`StoreConnection`] lifecycle,
//! so the pipeline can be wired against real databases or in-memory doubles.

mod content_store;
mod index_store;
mod metadata_store;
mod store_connection;

pub use content_store::ContentStore;
pub use index_store::IndexStore;
pub use metadata_store::MetadataStore;
pub use store_connection::StoreConnection;
