//! Lifecycle shared by every store adapter.

use async_trait::async_trait;

use crate::errors::StoreError;

/// Connection lifecycle of a store adapter.
///
/// The underlying pool or transport is created once at startup and handed to
/// the adapter; these methods let the bootstrapper verify it and the
/// coordinator release it on shutdown.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so one adapter can be shared by
/// every worker.
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Short name of the store, used in logs (`"metadata"`, `"content"`, `"index"`).
    fn name(&self) -> &'static str;

    /// Create the table, index or collection this adapter writes to, if missing.
    ///
    /// Must be idempotent; called once during startup.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Check that the store is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the store answered
    /// * `Ok(false)` - If the store answered but reported itself unhealthy
    /// * `Err(StoreError)` - If the check could not be executed
    async fn health_check(&self) -> Result<bool, StoreError>;

    /// Release pooled connections. Further calls will fail.
    async fn close(&self) {}
}
