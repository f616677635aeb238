use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Counters for the plan service.
/// All metrics are atomic counters for thread-safety
#[derive(Clone, Default)]
pub struct PlanMetrics {
    pub plans_generated: Arc<AtomicU64>,
    pub reconciliations: Arc<AtomicU64>,
    pub tasks_completed: Arc<AtomicU64>,
    /// Writes refused because the stored version moved on
    pub version_conflicts: Arc<AtomicU64>,
    /// Reads or writes that failed inside the store
    pub store_failures: Arc<AtomicU64>,
    pub cache_hit_count: Arc<AtomicU64>,
    pub cache_miss_count: Arc<AtomicU64>,
}

/// Point-in-time copy of [`PlanMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub plans_generated: u64,
    pub reconciliations: u64,
    pub tasks_completed: u64,
    pub version_conflicts: u64,
    pub store_failures: u64,
    pub cache_hit_count: u64,
    pub cache_miss_count: u64,
}

impl PlanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_plan_generated(&self) {
        self.plans_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconciliation(&self) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_version_conflict(&self) {
        self.version_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hit_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_miss_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            plans_generated: self.plans_generated.load(Ordering::Relaxed),
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            version_conflicts: self.version_conflicts.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            cache_hit_count: self.cache_hit_count.load(Ordering::Relaxed),
            cache_miss_count: self.cache_miss_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = PlanMetrics::new();
        let clone = metrics.clone();
        clone.record_task_completed();
        clone.record_task_completed();
        metrics.record_version_conflict();
        let snap = metrics.snapshot();
        assert_eq!(snap.tasks_completed, 2);
        assert_eq!(snap.version_conflicts, 1);
        assert_eq!(snap.plans_generated, 0);
    }
}
