//! HostHandle - one host output behind its own queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use contracts::{HostRuntime, OutboundEvent};

use crate::metrics::HostMetrics;

/// Handle to a running host output worker
pub struct HostHandle {
    name: String,
    tx: mpsc::Sender<OutboundEvent>,
    metrics: Arc<HostMetrics>,
    worker_handle: JoinHandle<()>,
}

impl HostHandle {
    /// Spawn the worker task that owns `host`
    pub fn spawn<H: HostRuntime + 'static>(host: H, queue_capacity: usize) -> Self {
        let name = host.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(HostMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            host_worker(host, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<HostMetrics> {
        &self.metrics
    }

    /// Queue an event, waiting while the queue is full
    ///
    /// Outbound events are never dropped: returns false only when the worker
    /// is gone.
    pub async fn send(&self, event: OutboundEvent) -> bool {
        match self.tx.send(event).await {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(_) => {
                error!(host = %self.name, "host worker closed unexpectedly");
                false
            }
        }
    }

    /// Drain the queue, close the output and wait for the worker
    #[instrument(name = "host_handle_shutdown", skip(self), fields(host = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(host = %self.name, error = ?e, "host worker panicked");
        }
        debug!(host = %self.name, "HostHandle shutdown complete");
    }
}

#[instrument(name = "host_worker_loop", skip(host, rx, metrics), fields(host = %name))]
async fn host_worker<H: HostRuntime>(
    mut host: H,
    mut rx: mpsc::Receiver<OutboundEvent>,
    metrics: Arc<HostMetrics>,
    name: String,
) {
    debug!(host = %name, "host worker started");

    while let Some(event) = rx.recv().await {
        metrics.set_queue_len(rx.len());
        let time = event.time;
        let kind = event.kind.name();

        match host.emit(event).await {
            Ok(()) => {
                metrics.inc_emit_count();
                observability::record_host_emit(&name, true);
            }
            Err(e) => {
                // a failing output does not affect the others
                metrics.inc_failure_count();
                observability::record_host_emit(&name, false);
                error!(host = %name, time, kind, error = %e, "emit failed");
            }
        }
    }

    if let Err(e) = host.close().await {
        error!(host = %name, error = %e, "close failed on shutdown");
    }
    debug!(host = %name, "host worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, OutboundKind};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    struct MockHost {
        name: String,
        emit_count: Arc<AtomicU64>,
        closed: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockHost {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                emit_count: Arc::new(AtomicU64::new(0)),
                closed: Arc::new(AtomicU64::new(0)),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl HostRuntime for MockHost {
        fn name(&self) -> &str {
            &self.name
        }

        async fn emit(&mut self, _event: OutboundEvent) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::host_emit(&self.name, "mock failure"));
            }
            self.emit_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn advance(t: u64) -> OutboundEvent {
        OutboundEvent::new(t, OutboundKind::TimeAdvanceRequest { requested: t })
    }

    #[tokio::test]
    async fn test_host_handle_basic() {
        let host = MockHost::new("test");
        let emit_count = Arc::clone(&host.emit_count);
        let closed = Arc::clone(&host.closed);

        let handle = HostHandle::spawn(host, 10);
        for i in 0..5 {
            assert!(handle.send(advance(i)).await);
        }

        handle.shutdown().await;
        assert_eq!(emit_count.load(Ordering::Relaxed), 5);
        assert_eq!(closed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_slow_host_applies_backpressure_without_dropping() {
        let mut host = MockHost::new("slow");
        host.delay_ms = 10;
        let emit_count = Arc::clone(&host.emit_count);

        let handle = HostHandle::spawn(host, 1);
        for i in 0..5 {
            assert!(handle.send(advance(i)).await);
        }

        handle.shutdown().await;
        assert_eq!(emit_count.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let mut host = MockHost::new("failing");
        host.should_fail = true;

        let handle = HostHandle::spawn(host, 10);
        for i in 0..3 {
            handle.send(advance(i)).await;
        }
        sleep(Duration::from_millis(50)).await;

        assert_eq!(handle.metrics().failure_count(), 3);
        assert_eq!(handle.metrics().emit_count(), 0);
        handle.shutdown().await;
    }
}
