//! Consumer module for the page indexer pipeline.
//!
//! Provides the queue abstraction the orchestrator polls, its Kafka
//! implementation, and an in-memory implementation for tests.

mod kafka_consumer;
mod memory_source;
mod messages;
mod source;

pub use kafka_consumer::{KafkaConsumer, DEFAULT_TOPIC};
pub use memory_source::InMemorySource;
pub use messages::{MessagePosition, RawMessage, TopicPartition};
pub use source::{CommitMode, MessageSource};
