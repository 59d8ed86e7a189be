use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Governance operation counters
#[derive(Debug, Default)]
pub struct GovernanceMetrics {
    pub operations: AtomicU64,
    pub archives_completed: AtomicU64,
    pub removals_completed: AtomicU64,
    pub rejections: AtomicU64,
    pub revision_retries: AtomicU64,
    pub revision_failures: AtomicU64,
}

impl GovernanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_archive_completed(&self) {
        self.archives_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal_completed(&self) {
        self.removals_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revision_retry(&self) {
        self.revision_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revision_failure(&self) {
        self.revision_failures.fetch_add(1, Ordering::Relaxed);
        warn!("governance operation exhausted its revision-conflict retries");
    }

    pub fn get_stats(&self) -> GovernanceStats {
        GovernanceStats {
            operations: self.operations.load(Ordering::Relaxed),
            archives_completed: self.archives_completed.load(Ordering::Relaxed),
            removals_completed: self.removals_completed.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            revision_retries: self.revision_retries.load(Ordering::Relaxed),
            revision_failures: self.revision_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "governance metrics: operations={}, archives={}, removals={}, rejections={}, retries={}, retry_failures={}",
            stats.operations,
            stats.archives_completed,
            stats.removals_completed,
            stats.rejections,
            stats.revision_retries,
            stats.revision_failures
        );
    }
}

#[derive(Debug, Clone)]
pub struct GovernanceStats {
    pub operations: u64,
    pub archives_completed: u64,
    pub removals_completed: u64,
    pub rejections: u64,
    pub revision_retries: u64,
    pub revision_failures: u64,
}

/// Global metrics instance
static GOVERNANCE_METRICS: std::sync::LazyLock<GovernanceMetrics> =
    std::sync::LazyLock::new(GovernanceMetrics::new);

pub fn governance_metrics() -> &'static GovernanceMetrics {
    &GOVERNANCE_METRICS
}

/// Time an operation and record metrics
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "operation completed"
        );
    }
}

#[macro_export]
macro_rules! time_operation {
    ($operation:expr) => {
        let _timer = $crate::observability::OperationTimer::new($operation);
    };
}
