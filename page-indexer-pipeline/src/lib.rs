//! # Page Indexer Pipeline
//!
//! This crate provides the pipeline components for consuming crawled pages
//! from Kafka and writing them to the metadata, content and index stores.
//!
//! ## Architecture
//!
//! The pipeline follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Receives raw messages from Kafka
//! 2. **Processor**: Decodes documents and builds their token frequencies
//! 3. **Loader**: Writes each document to all three stores with retries
//! 4. **Orchestrator**: Coordinates the flow, the workers and offset commits
//!
//! A message's offset is committed only after every store accepted its
//! document, so delivery is at-least-once and every write is an idempotent
//! upsert.

pub mod consumer;
pub mod errors;
pub mod loader;
pub mod metrics;
pub mod orchestrator;
pub mod processor;
pub mod retry;

pub use errors::PipelineError;
pub use loader::{FanOutOutcome, FanOutReport, LoaderConfig, StoreLoader, StoreWrite};
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use orchestrator::{Orchestrator, OrchestratorConfig, ShutdownHandle};
pub use retry::{RetryOutcome, RetryPolicy};
