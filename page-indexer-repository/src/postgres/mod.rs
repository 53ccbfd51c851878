//! PostgreSQL implementation of the inverted index store.

mod index_store;
mod schema;

pub use index_store::PostgresIndexStore;
pub use schema::MAX_TOKEN_LENGTH;
