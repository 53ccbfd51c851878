//! MySQL implementation of the metadata store.

mod metadata_store;
mod schema;

pub use metadata_store::MySqlMetadataStore;
