//! Per-output counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters of one host output worker
#[derive(Debug, Default)]
pub struct HostMetrics {
    queue_len: AtomicUsize,
    emit_count: AtomicU64,
    failure_count: AtomicU64,
}

impl HostMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }

    pub fn inc_emit_count(&self) {
        self.emit_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            emit_count: self.emit_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of output counters (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub emit_count: u64,
    pub failure_count: u64,
}
