//! Dependency initialization and wiring for the page indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::bootstrap::connect_with_retry;
use crate::config::Settings;
use crate::IndexingError;
use page_indexer_pipeline::{
    consumer::KafkaConsumer, processor::DocumentProcessor, IngestMetrics, LoaderConfig,
    Orchestrator, OrchestratorConfig, StoreLoader,
};
use page_indexer_repository::{
    opensearch::IndexConfig, MySqlMetadataStore, OpenSearchContentStore, PoolConfig,
    PostgresIndexStore,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Connect every store and the Kafka consumer and wire the pipeline.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If a store stays unreachable or the consumer
    ///   cannot be created
    pub async fn new(settings: &Settings) -> Result<Self, IndexingError> {
        info!(
            kafka_brokers = %settings.kafka.brokers,
            kafka_topic = %settings.kafka.topic,
            kafka_group_id = %settings.kafka.group_id,
            mysql_host = %settings.mysql.host,
            postgres_host = %settings.postgres.host,
            opensearch_url = %settings.opensearch_url,
            workers = settings.workers,
            "Initializing dependencies"
        );

        let pool = PoolConfig::for_workers(settings.workers)
            .with_max_connections(settings.store_pool_size);

        let metadata = connect_with_retry("metadata", &settings.connect_retry, || {
            MySqlMetadataStore::connect(&settings.mysql, &pool)
        })
        .await?;

        let index = connect_with_retry("index", &settings.connect_retry, || {
            PostgresIndexStore::connect(&settings.postgres, &pool)
        })
        .await?;

        let content = connect_with_retry("content", &settings.connect_retry, || {
            OpenSearchContentStore::new(
                &settings.opensearch_url,
                IndexConfig::new(settings.content_index.clone()),
            )
        })
        .await?;

        let consumer = KafkaConsumer::new(
            &settings.kafka.brokers,
            &settings.kafka.group_id,
            &settings.kafka.topic,
        )?;
        consumer.subscribe()?;

        info!("Kafka consumer created");

        let metrics = Arc::new(IngestMetrics::new());

        let loader = StoreLoader::new(
            Arc::new(metadata),
            Arc::new(content),
            Arc::new(index),
            LoaderConfig {
                write_timeout: settings.write_timeout,
                retry: settings.write_retry.clone(),
            },
            metrics.clone(),
        );

        let orchestrator = Orchestrator::new(
            Arc::new(consumer),
            DocumentProcessor::new(),
            Arc::new(loader),
            OrchestratorConfig {
                workers: settings.workers,
                channel_buffer_size: settings.channel_buffer_size,
                poll_timeout: settings.poll_timeout,
                metrics_log_interval: settings.metrics_log_interval,
            },
            metrics,
        );

        Ok(Self { orchestrator })
    }
}
