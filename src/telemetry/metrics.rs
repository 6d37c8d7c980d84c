//! Metrics
//!
//! Atomic counters for the request layer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::ErrorKind;

/// Point-in-time copy of [`ClientMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Transport calls made, replays and retries included.
    pub attempts: u64,
    /// Retries scheduled by the backoff ladder.
    pub retries: u64,
    /// Requests that completed successfully.
    pub successes: u64,
    /// Requests that surfaced an error.
    pub failures: u64,
    /// Refresh calls issued.
    pub refresh_calls: u64,
    /// Refresh calls that failed.
    pub refresh_failures: u64,
    /// Surfaced errors keyed by kind.
    pub failures_by_kind: BTreeMap<&'static str, u64>,
}

/// In-process counters shared by the executor and refresh coordinator.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    attempts: AtomicU64,
    retries: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    refresh_calls: AtomicU64,
    refresh_failures: AtomicU64,
    failures_by_kind: RwLock<BTreeMap<&'static str, u64>>,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a request that surfaced an error of `kind`.
    pub fn record_failure(&self, kind: ErrorKind) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.as_str()).or_insert(0) += 1;
        }
    }

    pub fn record_refresh(&self) {
        self.refresh_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            refresh_calls: self.refresh_calls.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            failures_by_kind: self
                .failures_by_kind
                .read()
                .map(|m| m.clone())
                .unwrap_or_default(),
        }
    }
}
