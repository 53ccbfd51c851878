//! PostgreSQL inverted index store.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};

use crate::config::{DatabaseConfig, PoolConfig};
use crate::errors::StoreError;
use crate::interfaces::{IndexStore, StoreConnection};
use crate::postgres::schema::{
    CREATE_DOCUMENT_ID_INDEX, CREATE_INVERTED_INDEX_TABLE, CREATE_TOKEN_INDEX,
    DELETE_DOCUMENT_ENTRIES, INSERT_DOCUMENT_ENTRIES, MAX_TOKEN_LENGTH,
};
use page_indexer_shared::TokenFrequencies;

/// Inverted index store backed by the PostgreSQL `inverted_index` table.
///
/// A document's entries are replaced by deleting every row of the document
/// and inserting the new set inside a single transaction, so readers never
/// observe a mix of old and new tokens and no stale token survives a re-crawl.
pub struct PostgresIndexStore {
    pool: PgPool,
}

impl PostgresIndexStore {
    /// Open a connection pool to the configured server.
    pub async fn connect(config: &DatabaseConfig, pool: &PoolConfig) -> Result<Self, StoreError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(pool.max_connections)
            .acquire_timeout(pool.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected to PostgreSQL index store"
        );

        Ok(Self { pool })
    }
}

/// Split the mapping into the parallel arrays bound to the insert statement.
///
/// Tokens wider than the `token` column are dropped; frequencies beyond
/// `i32::MAX` are saturated.
fn entry_columns(frequencies: &TokenFrequencies) -> (Vec<String>, Vec<i32>) {
    let mut tokens = Vec::with_capacity(frequencies.len());
    let mut counts = Vec::with_capacity(frequencies.len());

    for (token, &frequency) in frequencies {
        if token.chars().count() > MAX_TOKEN_LENGTH {
            debug!(token_len = token.len(), "Skipping token wider than index column");
            continue;
        }
        tokens.push(token.clone());
        counts.push(i32::try_from(frequency).unwrap_or(i32::MAX));
    }

    (tokens, counts)
}

#[async_trait]
impl StoreConnection for PostgresIndexStore {
    fn name(&self) -> &'static str {
        "index"
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in [
            CREATE_INVERTED_INDEX_TABLE,
            CREATE_TOKEN_INDEX,
            CREATE_DOCUMENT_ID_INDEX,
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::schema(e.to_string()))?;
        }

        info!("PostgreSQL schema initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let (one,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(one == 1)
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("PostgreSQL pool closed");
    }
}

#[async_trait]
impl IndexStore for PostgresIndexStore {
    #[instrument(skip(self, frequencies), fields(unique_tokens = frequencies.len()))]
    async fn upsert(
        &self,
        document_id: &str,
        frequencies: &TokenFrequencies,
    ) -> Result<(), StoreError> {
        let (tokens, counts) = entry_columns(frequencies);

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(DELETE_DOCUMENT_ENTRIES)
            .bind(document_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if !tokens.is_empty() {
            sqlx::query(INSERT_DOCUMENT_ENTRIES)
                .bind(&tokens)
                .bind(document_id)
                .bind(&counts)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(
            removed = removed,
            inserted = tokens.len(),
            "Replaced index entries"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_columns_are_parallel() {
        let frequencies: TokenFrequencies = ["beta", "alpha", "alpha"]
            .into_iter()
            .map(String::from)
            .collect();

        let (tokens, counts) = entry_columns(&frequencies);

        assert_eq!(tokens, vec!["alpha".to_string(), "beta".to_string()]);
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn test_entry_columns_drop_oversized_tokens() {
        let long = "x".repeat(MAX_TOKEN_LENGTH + 1);
        let exact = "y".repeat(MAX_TOKEN_LENGTH);
        let frequencies: TokenFrequencies = [long, exact.clone()].into_iter().collect();

        let (tokens, counts) = entry_columns(&frequencies);

        assert_eq!(tokens, vec![exact]);
        assert_eq!(counts, vec![1]);
    }
}
