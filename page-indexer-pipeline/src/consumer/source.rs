//! Queue abstraction polled by the orchestrator.

use std::time::Duration;

use async_trait::async_trait;

use crate::consumer::messages::{RawMessage, TopicPartition};
use crate::errors::PipelineError;

/// How a commit is delivered to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Fire and forget; used during steady-state processing.
    Async,
    /// Wait for the broker; used for the final commit on shutdown.
    Sync,
}

/// A partitioned, at-least-once message queue.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the orchestrator polls and commits
/// from a single task but holds the source behind an `Arc`.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait up to `wait` for the next message.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(message))` - A message was received
    /// * `Ok(None)` - Nothing arrived within `wait`
    /// * `Err(PipelineError)` - The client reported an error; polling may continue
    async fn poll(&self, wait: Duration) -> Result<Option<RawMessage>, PipelineError>;

    /// Commit consumed positions.
    ///
    /// Each offset is the next offset to consume, i.e. one past the last
    /// acknowledged message of the partition.
    fn commit(&self, offsets: &[(TopicPartition, i64)], mode: CommitMode)
        -> Result<(), PipelineError>;

    /// Move the read position of a partition back to `offset` so the queue
    /// delivers it (and everything after it) again.
    fn rewind(&self, topic_partition: &TopicPartition, offset: i64) -> Result<(), PipelineError>;
}
