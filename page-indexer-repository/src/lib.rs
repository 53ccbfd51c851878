//! # Page Indexer Repository
//!
//! This crate provides the store adapters the ingest pipeline writes to. It
//! includes error definitions, one interface per logical store, and concrete
//! implementations:
//!
//! - **Metadata**: MySQL `documents` table ([`MySqlMetadataStore`])
//! - **Content**: OpenSearch `documents` index ([`OpenSearchContentStore`])
//! - **Index**: PostgreSQL `inverted_index` table ([`PostgresIndexStore`])
//!
//! Every write is an idempotent upsert keyed by `document_id`, so replaying a
//! message is always safe.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod mysql;
pub mod opensearch;
pub mod postgres;

pub use config::{DatabaseConfig, PoolConfig};
pub use errors::StoreError;
pub use interfaces::{ContentStore, IndexStore, MetadataStore, StoreConnection};
pub use mysql::MySqlMetadataStore;
pub use opensearch::OpenSearchContentStore;
pub use postgres::PostgresIndexStore;
