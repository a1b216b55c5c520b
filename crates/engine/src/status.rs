//! Externally visible cycle status.

use chrono::{DateTime, Utc};
use pricewatch_core::ObservationSet;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Snapshot of the poll loop's most recent outcome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleStatus {
    /// Completion time of the last successful cycle.
    pub last_check: Option<DateTime<Utc>>,
    /// Error from the most recent cycle; cleared on success.
    pub last_error: Option<String>,
    /// Observations from the last successful cycle.
    pub last_observations: ObservationSet,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Successful cycles since startup.
    pub cycles_completed: u64,
}

/// Shared status cell. The poll loop is the only writer; readers get clones.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<CycleStatus>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    pub async fn snapshot(&self) -> CycleStatus {
        self.inner.read().await.clone()
    }

    pub(crate) async fn record_success(&self, observations: ObservationSet, at: DateTime<Utc>) {
        let mut status = self.inner.write().await;
        status.last_check = Some(at);
        status.last_error = None;
        status.last_observations = observations;
        status.consecutive_failures = 0;
        status.cycles_completed += 1;
    }

    /// Keeps the last good observations and check time.
    pub(crate) async fn record_failure(&self, error: String) {
        let mut status = self.inner.write().await;
        status.last_error = Some(error);
        status.consecutive_failures = status.consecutive_failures.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pricewatch_core::Price;

    #[tokio::test]
    async fn test_success_then_failure() {
        let handle = StatusHandle::new();
        let reader = handle.clone();
        let at = Utc::now();

        handle
            .record_success(ObservationSet::unlabeled([Price::from_f64(99.0)]), at)
            .await;
        handle.record_failure("HTTP 503".to_string()).await;
        handle.record_failure("HTTP 503".to_string()).await;

        let status = reader.snapshot().await;
        assert_eq!(status.last_check, Some(at));
        assert_eq!(status.last_error.as_deref(), Some("HTTP 503"));
        assert_eq!(status.last_observations.prices(), vec![Price::from_f64(99.0)]);
        assert_eq!(status.consecutive_failures, 2);
        assert_eq!(status.cycles_completed, 1);
    }

    #[tokio::test]
    async fn test_success_clears_error() {
        let handle = StatusHandle::new();
        handle.record_failure("no prices".to_string()).await;
        handle.record_success(ObservationSet::new(), Utc::now()).await;

        let status = handle.snapshot().await;
        assert_eq!(status.last_error, None);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_initial_status_is_empty() {
        let status = StatusHandle::new().snapshot().await;
        assert!(status.last_check.is_none());
        assert!(status.last_error.is_none());
        assert!(status.last_observations.is_empty());
    }
}
