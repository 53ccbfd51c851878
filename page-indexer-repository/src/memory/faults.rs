//! Failure and latency injection for the in-memory stores.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::StoreError;

/// Scripted failures and artificial latency for a store.
#[derive(Debug, Default)]
pub struct FaultInjector {
    failures: Mutex<VecDeque<StoreError>>,
    scheduled: Mutex<HashMap<usize, StoreError>>,
    latency: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` calls fail with `error`.
    pub fn fail_next(&self, times: usize, error: StoreError) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        failures.extend(std::iter::repeat(error).take(times));
    }

    /// Fail the given calls, counted from 1 over the life of the store.
    pub fn fail_calls(&self, calls: impl IntoIterator<Item = usize>, error: StoreError) {
        let mut scheduled = self.scheduled.lock().unwrap_or_else(|e| e.into_inner());
        for call in calls {
            scheduled.insert(call, error.clone());
        }
    }

    /// Drop any scripted failures that have not fired yet.
    pub fn heal(&self) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.scheduled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Delay every call by `latency`, or remove the delay with `None`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Total number of calls observed, failed or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Record a call, wait out the configured latency and fire the next
    /// scripted failure if there is one.
    pub async fn check(&self) -> Result<(), StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let scheduled = self
            .scheduled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&call);
        let next = scheduled.or_else(|| {
            self.failures
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
        });
        match next {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_failures_fire_in_order() {
        let faults = FaultInjector::new();
        faults.fail_next(2, StoreError::connection("down"));

        assert!(faults.check().await.is_err());
        assert!(faults.check().await.is_err());
        assert!(faults.check().await.is_ok());
        assert_eq!(faults.calls(), 3);
    }

    #[tokio::test]
    async fn test_scheduled_failures_hit_given_calls() {
        let faults = FaultInjector::new();
        faults.fail_calls([1, 3], StoreError::write("boom"));

        assert!(faults.check().await.is_err());
        assert!(faults.check().await.is_ok());
        assert!(faults.check().await.is_err());
        assert!(faults.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_heal_clears_pending_failures() {
        let faults = FaultInjector::new();
        faults.fail_next(5, StoreError::write("boom"));
        faults.fail_calls([1], StoreError::write("boom"));
        faults.heal();

        assert!(faults.check().await.is_ok());
    }
}
