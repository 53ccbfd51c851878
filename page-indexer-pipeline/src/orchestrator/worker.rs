//! Store workers.
//!
//! Each worker owns one queue. Messages are routed by `document_id`, so all
//! versions of a document are written by the same worker in arrival order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::consumer::MessagePosition;
use crate::loader::{FanOutOutcome, StoreLoader};
use crate::processor::DocumentProcessor;
use page_indexer_shared::Document;

/// A decoded document waiting for its store writes.
#[derive(Debug)]
pub(crate) struct WorkItem {
    pub position: MessagePosition,
    /// Partition epoch the item was dispatched in.
    pub epoch: u64,
    pub document: Document,
}

/// What happened to a work item.
#[derive(Debug)]
pub(crate) struct Completion {
    pub position: MessagePosition,
    pub epoch: u64,
    pub document_id: String,
    pub url: String,
    pub outcome: FanOutOutcome,
}

/// Index of the worker responsible for `document_id`.
pub(crate) fn route(document_id: &str, workers: usize) -> usize {
    if workers <= 1 {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    document_id.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}

/// Process and load items until the queue closes.
pub(crate) async fn run_worker(
    id: usize,
    mut jobs: mpsc::Receiver<WorkItem>,
    processor: DocumentProcessor,
    loader: Arc<StoreLoader>,
    completions: mpsc::UnboundedSender<Completion>,
) {
    debug!(worker = id, "Worker started");

    while let Some(item) = jobs.recv().await {
        let processed = processor.process(&item.document);
        let report = loader.load(&processed).await;

        let completion = Completion {
            position: item.position,
            epoch: item.epoch,
            document_id: processed.document_id,
            url: processed.url,
            outcome: report.outcome(),
        };
        if completions.send(completion).is_err() {
            break;
        }
    }

    debug!(worker = id, "Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_is_stable_and_in_range() {
        for id in ["a", "b", "5d41402abc4b2a76b9719d911017c592"] {
            let first = route(id, 4);
            assert!(first < 4);
            assert_eq!(route(id, 4), first);
        }
    }

    #[test]
    fn test_single_worker_takes_everything() {
        assert_eq!(route("anything", 1), 0);
        assert_eq!(route("anything", 0), 0);
    }
}
