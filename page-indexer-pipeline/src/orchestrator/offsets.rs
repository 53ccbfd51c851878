//! Per-partition offset bookkeeping.
//!
//! Messages of one partition may finish out of order when several workers are
//! running. The tracker only lets the commit point move past an offset once
//! every earlier offset of the same partition has been acknowledged.
//!
//! Each partition also carries an epoch that moves forward on every failure.
//! Work dispatched before a rewind belongs to an older epoch, and its
//! completions are ignored so they cannot settle the redelivered copy.

use std::collections::{BTreeMap, HashMap};

use crate::consumer::{MessagePosition, TopicPartition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OffsetState {
    InFlight,
    Acked,
    Failed,
}

#[derive(Debug, Default)]
struct PartitionOffsets {
    pending: BTreeMap<i64, OffsetState>,
    committable: Option<i64>,
    dirty: bool,
    epoch: u64,
}

impl PartitionOffsets {
    fn advance(&mut self) {
        while let Some(entry) = self.pending.first_entry() {
            if *entry.get() != OffsetState::Acked {
                break;
            }
            let offset = *entry.key();
            entry.remove();
            self.committable = Some(offset + 1);
            self.dirty = true;
        }
    }
}

/// Tracks in-flight offsets and computes what may be committed.
#[derive(Debug, Default)]
pub struct OffsetTracker {
    partitions: HashMap<TopicPartition, PartitionOffsets>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message handed to a worker and return the partition's
    /// current epoch, which the completion must carry back.
    ///
    /// A redelivered offset that previously failed becomes in flight again.
    pub fn track(&mut self, position: &MessagePosition) -> u64 {
        let partition = self
            .partitions
            .entry(position.topic_partition.clone())
            .or_default();
        partition
            .pending
            .insert(position.offset, OffsetState::InFlight);
        partition.epoch
    }

    /// Whether work tracked in `epoch` still counts for its partition.
    pub fn is_current(&self, position: &MessagePosition, epoch: u64) -> bool {
        self.partitions
            .get(&position.topic_partition)
            .is_some_and(|p| p.epoch == epoch)
    }

    /// Acknowledge a message. Offsets that are not tracked and completions
    /// from an older epoch are ignored.
    pub fn ack(&mut self, position: &MessagePosition, epoch: u64) {
        if let Some(partition) = self.partitions.get_mut(&position.topic_partition) {
            if partition.epoch != epoch {
                return;
            }
            if let Some(state) = partition.pending.get_mut(&position.offset) {
                *state = OffsetState::Acked;
                partition.advance();
            }
        }
    }

    /// Mark a message as failed and start a new epoch for its partition.
    ///
    /// The failed offset holds the commit point back, and every later
    /// offset of the partition is forgotten since it will be redelivered.
    /// Returns the offset to rewind the partition to, or `None` when the
    /// completion is from an older epoch or the offset is not tracked.
    pub fn fail(&mut self, position: &MessagePosition, epoch: u64) -> Option<i64> {
        let partition = self.partitions.get_mut(&position.topic_partition)?;
        if partition.epoch != epoch {
            return None;
        }
        let state = partition.pending.get_mut(&position.offset)?;
        *state = OffsetState::Failed;
        partition.pending.split_off(&(position.offset + 1));
        partition.epoch += 1;
        Some(position.offset)
    }

    /// Offsets that became committable since the last call, as
    /// `(partition, next offset to consume)` pairs.
    pub fn take_commits(&mut self) -> Vec<(TopicPartition, i64)> {
        let mut commits: Vec<(TopicPartition, i64)> = self
            .partitions
            .iter_mut()
            .filter(|(_, p)| p.dirty)
            .filter_map(|(tp, p)| {
                p.dirty = false;
                p.committable.map(|offset| (tp.clone(), offset))
            })
            .collect();
        commits.sort();
        commits
    }

    /// Current commit point of every partition that has one.
    pub fn committable(&self) -> Vec<(TopicPartition, i64)> {
        let mut commits: Vec<(TopicPartition, i64)> = self
            .partitions
            .iter()
            .filter_map(|(tp, p)| p.committable.map(|offset| (tp.clone(), offset)))
            .collect();
        commits.sort();
        commits
    }

    /// Number of offsets tracked but not yet committable.
    pub fn pending(&self) -> usize {
        self.partitions.values().map(|p| p.pending.len()).sum()
    }
}
