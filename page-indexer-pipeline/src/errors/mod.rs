//! Error types for the page indexer pipeline.

use page_indexer_repository::StoreError;
use thiserror::Error;

/// Errors that can occur in the page indexer pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// The message payload is not a valid document.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Error from one of the backing stores.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Pipeline was cancelled or interrupted.
    #[error("Pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }

    /// Whether the error is caused by the message itself rather than the system.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::DecodeError(_))
    }
}

impl From<rdkafka::error::KafkaError> for PipelineError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}
