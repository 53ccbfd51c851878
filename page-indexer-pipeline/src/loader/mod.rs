//! Loader module for the page indexer pipeline.
//!
//! Fans a processed document out to the metadata, content and index stores.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, instrument, warn};

use crate::metrics::IngestMetrics;
use crate::processor::ProcessedDocument;
use crate::retry::RetryPolicy;
use page_indexer_repository::{ContentStore, IndexStore, MetadataStore, StoreError};

/// Configuration for the store loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Upper bound for a single write attempt against one store.
    pub write_timeout: Duration,
    /// Retry policy applied to each store independently.
    pub retry: RetryPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_millis(10_000),
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of writing one document to one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWrite {
    pub store: &'static str,
    pub attempts: u32,
    pub result: Result<(), StoreError>,
}

impl StoreWrite {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Overall verdict for a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutOutcome {
    /// Every store accepted the document.
    Stored,
    /// At least one store kept failing with a transient error.
    Exhausted,
    /// The only failures were permanent refusals of the record itself.
    Rejected,
}

/// Per-store results of one fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub metadata: StoreWrite,
    pub content: StoreWrite,
    pub index: StoreWrite,
}

impl FanOutReport {
    pub fn writes(&self) -> [&StoreWrite; 3] {
        [&self.metadata, &self.content, &self.index]
    }

    /// Writes that did not succeed.
    pub fn failures(&self) -> impl Iterator<Item = &StoreWrite> {
        self.writes().into_iter().filter(|w| !w.is_ok())
    }

    pub fn outcome(&self) -> FanOutOutcome {
        let mut failed = false;
        for write in self.failures() {
            failed = true;
            if let Err(e) = &write.result {
                if e.is_retryable() {
                    return FanOutOutcome::Exhausted;
                }
            }
        }
        if failed {
            FanOutOutcome::Rejected
        } else {
            FanOutOutcome::Stored
        }
    }
}

/// Loader that writes documents to the three backing stores.
///
/// The loader is responsible for:
/// - Issuing the three writes concurrently
/// - Bounding each attempt with a timeout
/// - Retrying each store on its own under the retry policy
pub struct StoreLoader {
    metadata: Arc<dyn MetadataStore>,
    content: Arc<dyn ContentStore>,
    index: Arc<dyn IndexStore>,
    config: LoaderConfig,
    metrics: Arc<IngestMetrics>,
}

impl StoreLoader {
    /// Create a new store loader.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        content: Arc<dyn ContentStore>,
        index: Arc<dyn IndexStore>,
        config: LoaderConfig,
        metrics: Arc<IngestMetrics>,
    ) -> Self {
        Self {
            metadata,
            content,
            index,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Write a processed document to every store.
    ///
    /// A failing store does not stop the others: each write runs to its own
    /// conclusion and the report carries all three results.
    #[instrument(skip(self, document), fields(document_id = %document.document_id))]
    pub async fn load(&self, document: &ProcessedDocument) -> FanOutReport {
        let document_id = document.document_id.as_str();

        let (metadata, content, index) = tokio::join!(
            self.write_with_retry(self.metadata.name(), document_id, || {
                self.metadata.upsert(&document.metadata)
            }),
            self.write_with_retry(self.content.name(), document_id, || {
                self.content.upsert(&document.content)
            }),
            self.write_with_retry(self.index.name(), document_id, || {
                self.index.upsert(document_id, &document.frequencies)
            }),
        );

        let report = FanOutReport {
            metadata,
            content,
            index,
        };

        for write in report.failures() {
            if let Err(e) = &write.result {
                error!(
                    document_id = %document_id,
                    url = %document.url,
                    store = write.store,
                    attempts = write.attempts,
                    error_kind = e.kind(),
                    error = %e,
                    "Store write failed"
                );
            }
        }
        if report.outcome() == FanOutOutcome::Stored {
            debug!(
                document_id = %document_id,
                tokens = document.frequencies.len(),
                "Document written to all stores"
            );
        }

        report
    }

    /// Close every store.
    pub async fn close(&self) {
        self.metadata.close().await;
        self.content.close().await;
        self.index.close().await;
    }

    async fn write_with_retry<F, Fut>(
        &self,
        store: &'static str,
        document_id: &str,
        mut write: F,
    ) -> StoreWrite
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let timeout = self.config.write_timeout;
        let metrics = &self.metrics;

        let outcome = self
            .config
            .retry
            .run(
                || {
                    let attempt = write();
                    async move {
                        match tokio::time::timeout(timeout, attempt).await {
                            Ok(result) => result,
                            Err(_) => Err(StoreError::timeout(format!(
                                "{} write did not finish within {}ms",
                                store,
                                timeout.as_millis()
                            ))),
                        }
                    }
                },
                StoreError::is_retryable,
                |err, attempt, delay| {
                    metrics.record_retry();
                    warn!(
                        document_id = %document_id,
                        store = store,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying store write"
                    );
                },
            )
            .await;

        StoreWrite {
            store,
            attempts: outcome.attempts,
            result: outcome.result,
        }
    }
}
