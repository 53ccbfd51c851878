//! Kafka consumer implementation for the page indexer.
//!
//! Consumes crawled documents from a Kafka topic. Offsets are committed
//! manually by the orchestrator once every store has accepted a message.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    error::KafkaError,
    message::Message as KafkaMessage,
    Offset, TopicPartitionList,
};
use tracing::{debug, info, instrument, warn};

use crate::consumer::messages::{RawMessage, TopicPartition};
use crate::consumer::source::{CommitMode, MessageSource};
use crate::errors::PipelineError;

/// Default topic the crawler produces to.
pub const DEFAULT_TOPIC: &str = "pages.raw";

/// How long a partition seek may block.
const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka consumer for crawled documents.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topics: Vec<String>,
}

impl KafkaConsumer {
    /// Create a new Kafka consumer.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    /// * `topic` - Topic carrying crawled documents
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaConsumer)` - A new consumer instance
    /// * `Err(PipelineError)` - If consumer creation fails
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, PipelineError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| PipelineError::kafka(e.to_string()))?;

        info!(brokers = %brokers, group_id = %group_id, "Created Kafka consumer");

        Ok(Self {
            consumer,
            topics: vec![topic.to_string()],
        })
    }

    /// Subscribe to configured topics.
    pub fn subscribe(&self) -> Result<(), PipelineError> {
        let topics: Vec<&str> = self.topics.iter().map(|s| s.as_str()).collect();
        self.consumer
            .subscribe(&topics)
            .map_err(|e| PipelineError::kafka(e.to_string()))?;

        info!(topics = ?self.topics, "Subscribed to Kafka topics");
        Ok(())
    }
}

#[async_trait]
impl MessageSource for KafkaConsumer {
    async fn poll(&self, wait: Duration) -> Result<Option<RawMessage>, PipelineError> {
        let received = match tokio::time::timeout(wait, self.consumer.recv()).await {
            Ok(received) => received,
            Err(_) => return Ok(None),
        };

        match received {
            Ok(msg) => {
                debug!(
                    topic = %msg.topic(),
                    partition = msg.partition(),
                    offset = msg.offset(),
                    "Received message"
                );
                Ok(Some(RawMessage::new(
                    msg.topic(),
                    msg.partition(),
                    msg.offset(),
                    msg.key().map(|k| k.to_vec()),
                    msg.payload().map(|p| p.to_vec()),
                )))
            }
            Err(KafkaError::PartitionEOF(partition)) => {
                debug!(partition = partition, "Reached end of partition");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, offsets), fields(partitions = offsets.len()))]
    fn commit(
        &self,
        offsets: &[(TopicPartition, i64)],
        mode: CommitMode,
    ) -> Result<(), PipelineError> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut tpl = TopicPartitionList::new();
        for (tp, offset) in offsets {
            tpl.add_partition_offset(&tp.topic, tp.partition, Offset::Offset(*offset))
                .map_err(|e| PipelineError::kafka(e.to_string()))?;
        }

        let mode = match mode {
            CommitMode::Async => rdkafka::consumer::CommitMode::Async,
            CommitMode::Sync => rdkafka::consumer::CommitMode::Sync,
        };

        self.consumer
            .commit(&tpl, mode)
            .map_err(|e| PipelineError::kafka(e.to_string()))?;

        debug!("Committed offsets");
        Ok(())
    }

    fn rewind(&self, topic_partition: &TopicPartition, offset: i64) -> Result<(), PipelineError> {
        self.consumer
            .seek(
                &topic_partition.topic,
                topic_partition.partition,
                Offset::Offset(offset),
                SEEK_TIMEOUT,
            )
            .map_err(|e| PipelineError::kafka(e.to_string()))?;

        warn!(
            topic = %topic_partition.topic,
            partition = topic_partition.partition,
            offset = offset,
            "Rewound partition for redelivery"
        );
        Ok(())
    }
}
