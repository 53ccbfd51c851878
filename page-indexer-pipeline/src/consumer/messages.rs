//! Message types for the consumer.
//!
//! Defines the owned message and position types that flow through the pipeline.

use std::fmt;

/// A topic and partition pair; offsets are tracked per pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.topic, self.partition)
    }
}

/// Where a message sits in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessagePosition {
    pub topic_partition: TopicPartition,
    pub offset: i64,
}

impl MessagePosition {
    pub fn new(topic_partition: TopicPartition, offset: i64) -> Self {
        Self {
            topic_partition,
            offset,
        }
    }
}

impl fmt::Display for MessagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.topic_partition, self.offset)
    }
}

/// A message pulled from the queue, detached from the client's buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Partitioning key; the producer sets it to the `document_id`.
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

impl RawMessage {
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        key: Option<Vec<u8>>,
        payload: Option<Vec<u8>>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key,
            payload,
        }
    }

    pub fn position(&self) -> MessagePosition {
        MessagePosition::new(
            TopicPartition::new(self.topic.clone(), self.partition),
            self.offset,
        )
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}
