//! OpenSearch content store implementation.
//!
//! This module provides the concrete implementation of `ContentStore`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    IndexParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::{ContentStore, StoreConnection};
use crate::opensearch::index_config::IndexConfig;
use page_indexer_shared::ContentRecord;

/// Error types OpenSearch raises for the document itself rather than the
/// cluster. Sending the same document again fails the same way.
const DOCUMENT_ERROR_TYPES: &[&str] = &[
    "mapper_parsing_exception",
    "document_parsing_exception",
    "strict_dynamic_mapping_exception",
];

/// Content store backed by an OpenSearch index.
///
/// Each document is stored under `_id` = `document_id`; indexing the same id
/// again replaces the stored source wholesale.
///
/// # Example
///
/// ```ignore
/// use page_indexer_repository::opensearch::IndexConfig;
/// let client = OpenSearchContentStore::new("http://localhost:9200", IndexConfig::default()).await?;
/// client.ensure_schema().await?;
/// client.upsert(&document.content_record()).await?;
/// ```
pub struct OpenSearchContentStore {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchContentStore {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The content index name and layout
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchContentStore)` - A new client instance
    /// * `Err(StoreError)` - If the URL is invalid or the transport cannot be built
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, StoreError> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Name of the index documents are written to.
    pub fn index_name(&self) -> &str {
        &self.index_config.name
    }

    /// Turn a non-success response into the matching store error.
    async fn error_for_status(response: Response, operation: &str) -> StoreError {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status = status, body = %body, operation = operation, "OpenSearch request failed");

        let msg = format!("{} failed with status {}: {}", operation, status, body);
        classify_failure(status, &body, msg)
    }
}

/// Map a failed response to a store error.
///
/// Only an oversized body or a document the mappings cannot accept is a
/// rejection. Blocks, auth failures and a missing index say nothing about
/// the record and stay retryable.
fn classify_failure(status: u16, body: &str, msg: String) -> StoreError {
    let error_type = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/type")?.as_str().map(str::to_owned));

    let refused_document = error_type
        .as_deref()
        .is_some_and(|t| DOCUMENT_ERROR_TYPES.contains(&t));
    if status == 413 || refused_document {
        return StoreError::rejected(msg);
    }

    match status {
        401 | 403 => StoreError::connection(msg),
        408 | 429 => StoreError::timeout(msg),
        409 => StoreError::constraint(msg),
        _ => StoreError::write(msg),
    }
}

#[async_trait]
impl StoreConnection for OpenSearchContentStore {
    fn name(&self) -> &'static str {
        "content"
    }

    /// Create the content index with its mappings if it doesn't exist.
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let index = self.index_config.name.as_str();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %index, "Content index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(self.index_config.index_settings())
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Another instance may have created it between the two calls.
            if body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            return Err(StoreError::schema(format!(
                "Index creation failed with status {}: {}",
                status, body
            )));
        }

        info!(index = %index, "Created content index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }
}

#[async_trait]
impl ContentStore for OpenSearchContentStore {
    #[instrument(skip(self, record), fields(document_id = %record.document_id))]
    async fn upsert(&self, record: &ContentRecord) -> Result<(), StoreError> {
        let body = serde_json::to_value(record)?;

        let response = self
            .client
            .index(IndexParts::IndexId(
                &self.index_config.name,
                &record.document_id,
            ))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().to_lowercase().contains("timed out") {
                    StoreError::timeout(e.to_string())
                } else {
                    StoreError::connection(e.to_string())
                }
            })?;

        if !response.status_code().is_success() {
            return Err(Self::error_for_status(response, "Index").await);
        }

        debug!("Stored content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_indexer_shared::Document;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Answer the first request on a local port with `status` and `body`.
    async fn respond_once(status: &'static str, body: Value) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;

            let body = body.to_string();
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    async fn upsert_against(status: &'static str, body: Value) -> StoreError {
        let url = respond_once(status, body).await;
        let store = OpenSearchContentStore::new(&url, IndexConfig::default())
            .await
            .unwrap();
        let record = Document::new("X", "https://example.com/x")
            .with_content("alpha")
            .content_record();

        store.upsert(&record).await.unwrap_err()
    }

    #[tokio::test]
    async fn test_read_only_index_is_retryable() {
        let err = upsert_against(
            "403 Forbidden",
            json!({
                "error": {
                    "type": "cluster_block_exception",
                    "reason": "index [documents] blocked by: [FORBIDDEN/12/index read-only / allow delete (api)];"
                },
                "status": 403
            }),
        )
        .await;

        assert!(err.is_retryable(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_mapping_failure_is_rejected() {
        let err = upsert_against(
            "400 Bad Request",
            json!({
                "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [crawl_timestamp] of type [date]"
                },
                "status": 400
            }),
        )
        .await;

        assert_eq!(err.kind(), "rejected");
    }

    #[test]
    fn test_cluster_side_client_errors_stay_retryable() {
        let auth = json!({"error": {"type": "security_exception"}}).to_string();
        assert!(classify_failure(401, &auth, "401".into()).is_retryable());
        assert!(classify_failure(403, &auth, "403".into()).is_retryable());

        let missing = json!({"error": {"type": "index_not_found_exception"}}).to_string();
        assert!(classify_failure(404, &missing, "404".into()).is_retryable());

        let other = json!({"error": {"type": "illegal_argument_exception"}}).to_string();
        assert!(classify_failure(400, &other, "400".into()).is_retryable());

        assert_eq!(classify_failure(429, "", "429".into()).kind(), "timeout");
        assert_eq!(classify_failure(503, "oops", "503".into()).kind(), "write");
    }

    #[test]
    fn test_document_errors_are_rejected() {
        assert_eq!(
            classify_failure(413, "", "too large".into()).kind(),
            "rejected"
        );
        let strict = json!({"error": {"type": "strict_dynamic_mapping_exception"}}).to_string();
        assert_eq!(classify_failure(400, &strict, "400".into()).kind(), "rejected");
    }
}
