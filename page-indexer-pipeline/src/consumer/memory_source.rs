//! In-memory message source.
//!
//! A single-topic, multi-partition log with Kafka-like commit and seek
//! semantics, used to drive the orchestrator in tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::consumer::messages::{RawMessage, TopicPartition};
use crate::consumer::source::{CommitMode, MessageSource};
use crate::errors::PipelineError;

#[derive(Debug, Default)]
struct SourceState {
    logs: Vec<Vec<RawMessage>>,
    cursors: Vec<i64>,
    committed: HashMap<i32, i64>,
    rewinds: Vec<(TopicPartition, i64)>,
    next_partition: usize,
    delivered: usize,
}

/// Partitioned in-memory log implementing [`MessageSource`].
#[derive(Debug)]
pub struct InMemorySource {
    topic: String,
    state: Mutex<SourceState>,
}

impl InMemorySource {
    /// Create a source for `topic` with `partitions` empty partitions.
    pub fn new(topic: impl Into<String>, partitions: usize) -> Self {
        let partitions = partitions.max(1);
        Self {
            topic: topic.into(),
            state: Mutex::new(SourceState {
                logs: vec![Vec::new(); partitions],
                cursors: vec![0; partitions],
                ..SourceState::default()
            }),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Append a message to `partition` and return its offset.
    ///
    /// # Panics
    ///
    /// If `partition` does not exist.
    pub fn push(&self, partition: i32, key: Option<&str>, payload: impl Into<Vec<u8>>) -> i64 {
        self.push_raw(partition, key, Some(payload.into()))
    }

    /// Append a message with an optional payload and return its offset.
    pub fn push_raw(&self, partition: i32, key: Option<&str>, payload: Option<Vec<u8>>) -> i64 {
        let mut state = self.lock();
        let log = &mut state.logs[partition as usize];
        let offset = log.len() as i64;
        log.push(RawMessage::new(
            self.topic.clone(),
            partition,
            offset,
            key.map(|k| k.as_bytes().to_vec()),
            payload,
        ));
        offset
    }

    /// Last committed offset of `partition` (next offset to consume).
    pub fn committed(&self, partition: i32) -> Option<i64> {
        self.lock().committed.get(&partition).copied()
    }

    /// Every rewind requested so far, in order.
    pub fn rewinds(&self) -> Vec<(TopicPartition, i64)> {
        self.lock().rewinds.clone()
    }

    /// Number of messages handed out by `poll`, redeliveries included.
    pub fn delivered(&self) -> usize {
        self.lock().delivered
    }

    /// Number of messages appended to `partition`.
    pub fn log_len(&self, partition: i32) -> i64 {
        self.lock().logs[partition as usize].len() as i64
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_message(&self) -> Option<RawMessage> {
        let mut state = self.lock();
        let partitions = state.logs.len();

        for step in 0..partitions {
            let partition = (state.next_partition + step) % partitions;
            let cursor = state.cursors[partition];
            if let Some(message) = state.logs[partition].get(cursor as usize).cloned() {
                state.cursors[partition] = cursor + 1;
                state.next_partition = (partition + 1) % partitions;
                state.delivered += 1;
                return Some(message);
            }
        }
        None
    }
}

#[async_trait]
impl MessageSource for InMemorySource {
    async fn poll(&self, wait: Duration) -> Result<Option<RawMessage>, PipelineError> {
        if let Some(message) = self.next_message() {
            return Ok(Some(message));
        }
        tokio::time::sleep(wait).await;
        Ok(self.next_message())
    }

    fn commit(
        &self,
        offsets: &[(TopicPartition, i64)],
        _mode: CommitMode,
    ) -> Result<(), PipelineError> {
        let mut state = self.lock();
        for (tp, offset) in offsets {
            if tp.topic != self.topic {
                return Err(PipelineError::kafka(format!("unknown topic {}", tp.topic)));
            }
            state.committed.insert(tp.partition, *offset);
        }
        Ok(())
    }

    fn rewind(&self, topic_partition: &TopicPartition, offset: i64) -> Result<(), PipelineError> {
        let mut state = self.lock();
        let partition = topic_partition.partition as usize;
        if topic_partition.topic != self.topic || partition >= state.cursors.len() {
            return Err(PipelineError::kafka(format!(
                "unknown partition {}",
                topic_partition
            )));
        }
        state.cursors[partition] = offset;
        state.rewinds.push((topic_partition.clone(), offset));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_poll_delivers_in_partition_order() {
        let source = InMemorySource::new("pages.raw", 1);
        source.push(0, Some("a"), "first");
        source.push(0, Some("b"), "second");

        let first = source.poll(Duration::from_millis(1)).await.unwrap().unwrap();
        let second = source.poll(Duration::from_millis(1)).await.unwrap().unwrap();

        assert_eq!(first.offset, 0);
        assert_eq!(first.payload(), Some(&b"first"[..]));
        assert_eq!(second.offset, 1);
        assert!(source.poll(Duration::from_millis(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rewind_redelivers_from_offset() {
        let source = InMemorySource::new("pages.raw", 1);
        source.push(0, None, "m0");
        source.push(0, None, "m1");
        source.push(0, None, "m2");

        for _ in 0..3 {
            source.poll(Duration::from_millis(1)).await.unwrap();
        }
        source
            .rewind(&TopicPartition::new("pages.raw", 0), 1)
            .unwrap();

        let again = source.poll(Duration::from_millis(1)).await.unwrap().unwrap();
        assert_eq!(again.offset, 1);
        assert_eq!(source.delivered(), 4);
    }

    #[test]
    fn test_commit_records_offsets() {
        let source = InMemorySource::new("pages.raw", 2);

        source
            .commit(
                &[(TopicPartition::new("pages.raw", 1), 7)],
                CommitMode::Async,
            )
            .unwrap();

        assert_eq!(source.committed(1), Some(7));
        assert_eq!(source.committed(0), None);
    }
}
