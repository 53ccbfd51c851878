//! Orchestrator module for the page indexer pipeline.
//!
//! Coordinates the message source, the processor and the store workers, and
//! owns offset commits.

mod offsets;
mod worker;

pub use offsets::OffsetTracker;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{CommitMode, MessageSource, RawMessage, TopicPartition};
use crate::errors::PipelineError;
use crate::loader::{FanOutOutcome, StoreLoader};
use crate::metrics::IngestMetrics;
use crate::processor::{payload_preview, DocumentProcessor};
use worker::{route, run_worker, Completion, WorkItem};

/// Bytes of a malformed payload included in the skip warning.
const PREVIEW_BYTES: usize = 256;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Number of store workers.
    pub workers: usize,
    /// Capacity of each worker queue.
    pub channel_buffer_size: usize,
    /// How long a single poll waits for a message.
    pub poll_timeout: Duration,
    /// How often the counters are logged.
    pub metrics_log_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            channel_buffer_size: 100,
            poll_timeout: Duration::from_millis(1000),
            metrics_log_interval: Duration::from_secs(60),
        }
    }
}

/// Handle used to stop a running orchestrator.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Ask the orchestrator to stop. Safe to call more than once.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

/// Orchestrator that coordinates the pipeline components.
///
/// The orchestrator:
/// - Polls the source and decodes each message
/// - Routes documents to workers by `document_id`
/// - Commits offsets once every earlier message of the partition is done
/// - Rewinds a partition when a message could not be stored
/// - Drains the workers and closes the stores on shutdown
pub struct Orchestrator {
    source: Arc<dyn MessageSource>,
    processor: DocumentProcessor,
    loader: Arc<StoreLoader>,
    config: OrchestratorConfig,
    metrics: Arc<IngestMetrics>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        source: Arc<dyn MessageSource>,
        processor: DocumentProcessor,
        loader: Arc<StoreLoader>,
        config: OrchestratorConfig,
        metrics: Arc<IngestMetrics>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            source,
            processor,
            loader,
            config,
            metrics,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Handle that stops [`run`](Self::run), even if triggered before it starts.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        self.metrics.clone()
    }

    /// Run the orchestrator.
    ///
    /// Blocks until shutdown is triggered, then lets the workers finish what
    /// they hold, commits the final offsets and closes every store.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<(), PipelineError> {
        let worker_count = self.config.workers.max(1);
        info!(workers = worker_count, "Starting page indexer orchestrator");

        let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<Completion>();
        let mut senders = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for id in 0..worker_count {
            let (tx, rx) = mpsc::channel::<WorkItem>(self.config.channel_buffer_size.max(1));
            senders.push(tx);
            handles.push(tokio::spawn(run_worker(
                id,
                rx,
                self.processor.clone(),
                self.loader.clone(),
                completion_tx.clone(),
            )));
        }
        drop(completion_tx);

        let mut tracker = OffsetTracker::new();
        let mut metrics_tick = tokio::time::interval(
            self.config
                .metrics_log_interval
                .max(Duration::from_secs(1)),
        );
        metrics_tick.tick().await;

        let mut result = Ok(());

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    break;
                }
                Some(completion) = completion_rx.recv() => {
                    self.complete(&mut tracker, completion, true);
                    self.commit(tracker.take_commits(), CommitMode::Async);
                }
                _ = metrics_tick.tick() => {
                    self.metrics.log_snapshot();
                }
                polled = self.source.poll(self.config.poll_timeout) => {
                    match polled {
                        Ok(Some(message)) => {
                            if let Err(e) = self.dispatch(message, &senders, &mut tracker).await {
                                error!(error = %e, "Failed to dispatch message");
                                result = Err(e);
                                break;
                            }
                            // Skipped messages are acknowledged during dispatch.
                            self.commit(tracker.take_commits(), CommitMode::Async);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            error!(error = %e, "Failed to poll message source");
                            tokio::time::sleep(self.config.poll_timeout).await;
                        }
                    }
                }
            }
        }

        // Closing the queues lets each worker finish what it holds and exit.
        drop(senders);
        while let Some(completion) = completion_rx.recv().await {
            self.complete(&mut tracker, completion, false);
        }
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "Worker task failed");
            }
        }

        self.commit(tracker.committable(), CommitMode::Sync);
        self.loader.close().await;
        self.metrics.log_snapshot();

        info!(pending = tracker.pending(), "Orchestrator shutdown complete");
        result
    }

    async fn dispatch(
        &self,
        message: RawMessage,
        senders: &[mpsc::Sender<WorkItem>],
        tracker: &mut OffsetTracker,
    ) -> Result<(), PipelineError> {
        self.metrics.record_received();
        let position = message.position();
        let epoch = tracker.track(&position);

        match self.processor.decode(message.payload()) {
            Ok(document) => {
                let worker = route(&document.document_id, senders.len());
                debug!(
                    document_id = %document.document_id,
                    position = %position,
                    worker = worker,
                    "Dispatching document"
                );
                senders[worker]
                    .send(WorkItem {
                        position,
                        epoch,
                        document,
                    })
                    .await
                    .map_err(|_| PipelineError::channel(format!("worker {} stopped", worker)))
            }
            Err(e) => {
                warn!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    payload = %payload_preview(message.payload(), PREVIEW_BYTES),
                    "Skipping malformed message"
                );
                self.metrics.record_skipped_malformed();
                tracker.ack(&position, epoch);
                Ok(())
            }
        }
    }

    fn complete(&self, tracker: &mut OffsetTracker, completion: Completion, rewind: bool) {
        let position = completion.position;
        let epoch = completion.epoch;

        // Dispatched before a rewind; the redelivered copy settles the offset.
        if !tracker.is_current(&position, epoch) {
            debug!(
                document_id = %completion.document_id,
                position = %position,
                outcome = ?completion.outcome,
                "Ignoring completion from before a rewind"
            );
            return;
        }

        match completion.outcome {
            FanOutOutcome::Stored => {
                self.metrics.record_processed();
                tracker.ack(&position, epoch);
            }
            FanOutOutcome::Rejected => {
                self.metrics.record_failed_rejected();
                warn!(
                    document_id = %completion.document_id,
                    url = %completion.url,
                    position = %position,
                    "Acknowledging document refused by a store"
                );
                tracker.ack(&position, epoch);
            }
            FanOutOutcome::Exhausted => {
                self.metrics.record_failed_exhausted();
                error!(
                    document_id = %completion.document_id,
                    url = %completion.url,
                    position = %position,
                    "Document not stored, leaving offset uncommitted"
                );
                let Some(offset) = tracker.fail(&position, epoch) else {
                    return;
                };
                if rewind {
                    if let Err(e) = self.source.rewind(&position.topic_partition, offset) {
                        error!(
                            position = %position,
                            error = %e,
                            "Failed to rewind partition"
                        );
                    }
                }
            }
        }
    }

    fn commit(&self, offsets: Vec<(TopicPartition, i64)>, mode: CommitMode) {
        if offsets.is_empty() {
            return;
        }
        match self.source.commit(&offsets, mode) {
            Ok(()) => {
                self.metrics.record_commit();
                debug!(partitions = offsets.len(), mode = ?mode, "Committed offsets");
            }
            Err(e) => warn!(error = %e, "Failed to commit offsets"),
        }
    }
}
