//! In-memory implementations of every store.
//!
//! They honor the same replace/overwrite semantics as the database-backed
//! adapters and can be told to fail or slow down, which makes them the
//! backing of choice for pipeline tests.

mod faults;
mod stores;

pub use faults::FaultInjector;
pub use stores::{InMemoryContentStore, InMemoryIndexStore, InMemoryMetadataStore};
