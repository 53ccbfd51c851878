//! Store bootstrap: connect with bounded retries, verify, prepare schema.

use std::future::Future;

use tracing::{info, warn};

use crate::IndexingError;
use page_indexer_pipeline::RetryPolicy;
use page_indexer_repository::{StoreConnection, StoreError};

/// Connect to a store, retrying transient failures under `policy`.
///
/// Each attempt runs `connect` and then the store's health check. Once
/// healthy, the store's schema is created if missing.
///
/// # Returns
///
/// * `Ok(S)` - A connected store with its schema in place
/// * `Err(IndexingError::BootstrapError)` - If the store stayed unreachable
///   for the whole retry budget or failed with a non-retryable error
pub async fn connect_with_retry<S, F, Fut>(
    name: &'static str,
    policy: &RetryPolicy,
    mut connect: F,
) -> Result<S, IndexingError>
where
    S: StoreConnection,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, StoreError>>,
{
    let outcome = policy
        .run(
            || {
                let attempt = connect();
                async move {
                    let store = attempt.await?;
                    if store.health_check().await? {
                        Ok(store)
                    } else {
                        Err(StoreError::connection(format!("{} health check failed", name)))
                    }
                }
            },
            StoreError::is_retryable,
            |err, attempt, delay| {
                warn!(
                    store = name,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Store not reachable yet, retrying"
                );
            },
        )
        .await;

    let attempts = outcome.attempts;
    let store = outcome.into_result().map_err(|e| {
        IndexingError::bootstrap(format!(
            "{} store unavailable after {} attempt(s): {}",
            name, attempts, e
        ))
    })?;

    store.ensure_schema().await.map_err(|e| {
        IndexingError::bootstrap(format!("{} schema setup failed: {}", name, e))
    })?;

    info!(store = name, attempts = attempts, "Store connection verified");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_indexer_repository::memory::InMemoryIndexStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(10), Duration::from_millis(50))
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let store = connect_with_retry("index", &policy(5), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::connection("connection refused"))
            } else {
                Ok(InMemoryIndexStore::new())
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(store.health_check().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let calls = AtomicU32::new(0);

        let err = connect_with_retry::<InMemoryIndexStore, _, _>("index", &policy(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::timeout("no route to host"))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, IndexingError::BootstrapError(_)));
        assert!(err.to_string().contains("3 attempt"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_store_is_retried() {
        let calls = AtomicU32::new(0);

        let result = connect_with_retry("index", &policy(2), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            let store = InMemoryIndexStore::new();
            store.close().await;
            Ok(store)
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_fails_fast() {
        let calls = AtomicU32::new(0);

        let result = connect_with_retry::<InMemoryIndexStore, _, _>("index", &policy(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::schema("access denied for user"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
