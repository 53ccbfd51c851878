//! Store error types.
//!
//! Connection-level failures (the store could not be reached in time) are kept
//! apart from data-level failures (the store was reached but the write did not
//! apply) so callers can decide whether to retry, skip or give up.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors that can occur while talking to one of the backing stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the connection was lost.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The operation did not complete within its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The store was reached but the write failed.
    #[error("Write error: {0}")]
    WriteError(String),

    /// A uniqueness or integrity constraint was violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The store permanently refused the record (e.g. a mapping conflict).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The record could not be serialized for the store.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Creating or verifying the store schema failed.
    #[error("Schema error: {0}")]
    SchemaError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a constraint violation error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    /// Create a rejection error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Whether the failure happened before the store could act on the request.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }

    /// Whether repeating the same operation may succeed.
    ///
    /// Rejections and serialization failures are deterministic for a given
    /// record; everything else can clear up on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_)
            | Self::Timeout(_)
            | Self::WriteError(_)
            | Self::ConstraintViolation(_) => true,
            Self::Rejected(_) | Self::SerializationError(_) | Self::SchemaError(_) => false,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionError(_) => "connection",
            Self::Timeout(_) => "timeout",
            Self::WriteError(_) => "write",
            Self::ConstraintViolation(_) => "constraint",
            Self::Rejected(_) => "rejected",
            Self::SerializationError(_) => "serialization",
            Self::SchemaError(_) => "schema",
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionError(err.to_string()),
            sqlx::Error::PoolTimedOut => Self::Timeout(err.to_string()),
            sqlx::Error::Database(ref db_err) => {
                // SQLSTATE class 22 covers values the column cannot hold
                // (MySQL 1406 and Postgres 22001 for over-long strings).
                let data_exception = db_err.code().is_some_and(|code| code.starts_with("22"));
                match db_err.kind() {
                    ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                        Self::Rejected(err.to_string())
                    }
                    _ if data_exception => Self::Rejected(err.to_string()),
                    ErrorKind::Other => Self::WriteError(err.to_string()),
                    _ => Self::ConstraintViolation(err.to_string()),
                }
            }
            sqlx::Error::Encode(_) | sqlx::Error::Decode(_) => {
                Self::SerializationError(err.to_string())
            }
            _ => Self::WriteError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
