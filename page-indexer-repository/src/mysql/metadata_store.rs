//! MySQL metadata store.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{debug, info, instrument};

use crate::config::{DatabaseConfig, PoolConfig};
use crate::errors::StoreError;
use crate::interfaces::{MetadataStore, StoreConnection};
use crate::mysql::schema::{CREATE_DOCUMENTS_TABLE, UPSERT_DOCUMENT};
use page_indexer_shared::MetadataRecord;

/// Metadata store backed by the MySQL `documents` table.
///
/// # Example
///
/// ```ignore
/// let config = DatabaseConfig::new("localhost", 3306, "searchuser", "searchpass", "searchdb");
/// let store = MySqlMetadataStore::connect(&config, &PoolConfig::default()).await?;
/// store.ensure_schema().await?;
/// store.upsert(&document.metadata_record()).await?;
/// ```
pub struct MySqlMetadataStore {
    pool: MySqlPool,
}

impl MySqlMetadataStore {
    /// Open a connection pool to the configured server.
    ///
    /// At least one connection is established before returning, so an
    /// unreachable server surfaces here as a connection error.
    pub async fn connect(config: &DatabaseConfig, pool: &PoolConfig) -> Result<Self, StoreError> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .max_connections(pool.max_connections)
            .acquire_timeout(pool.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected to MySQL metadata store"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl StoreConnection for MySqlMetadataStore {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::schema(e.to_string()))?;

        info!("MySQL schema initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(one == 1)
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("MySQL pool closed");
    }
}

#[async_trait]
impl MetadataStore for MySqlMetadataStore {
    #[instrument(skip(self, record), fields(document_id = %record.document_id))]
    async fn upsert(&self, record: &MetadataRecord) -> Result<(), StoreError> {
        sqlx::query(UPSERT_DOCUMENT)
            .bind(&record.document_id)
            .bind(&record.url)
            .bind(&record.title)
            .bind(&record.description)
            .bind(&record.keywords)
            .bind(&record.source)
            .bind(record.crawl_timestamp)
            .execute(&self.pool)
            .await?;

        debug!("Stored metadata");
        Ok(())
    }
}
