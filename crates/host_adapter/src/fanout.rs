//! FanoutHost - one HostRuntime that publishes to several outputs

use tracing::{info, instrument};

use contracts::{ContractError, HostRuntime, OutboundEvent};

use crate::handle::HostHandle;
use crate::metrics::MetricsSnapshot;

/// Publishes every outbound event to each of its outputs, in order
///
/// Each output runs behind its own [`HostHandle`], so a slow output only
/// delays the others once its queue is full. Output write failures are
/// counted and logged by the worker; `emit` fails only when a worker has gone
/// away.
pub struct FanoutHost {
    name: String,
    handles: Vec<HostHandle>,
}

impl FanoutHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handles: Vec::new(),
        }
    }

    /// Create a fan-out over already running handles
    pub fn with_handles(name: impl Into<String>, handles: Vec<HostHandle>) -> Self {
        Self {
            name: name.into(),
            handles,
        }
    }

    /// Spawn a worker for `host` and add it as an output
    pub fn add<H: HostRuntime + 'static>(mut self, host: H, queue_capacity: usize) -> Self {
        self.handles.push(HostHandle::spawn(host, queue_capacity));
        self
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Counters of every output
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }
}

impl HostRuntime for FanoutHost {
    fn name(&self) -> &str {
        &self.name
    }

    async fn emit(&mut self, event: OutboundEvent) -> Result<(), ContractError> {
        for handle in &self.handles {
            if !handle.send(event.clone()).await {
                return Err(ContractError::host_emit(
                    &self.name,
                    format!("output '{}' is closed", handle.name()),
                ));
            }
        }
        Ok(())
    }

    #[instrument(name = "fanout_host_close", skip(self), fields(host = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let handles = std::mem::take(&mut self.handles);
        let outputs = handles.len();
        for handle in handles {
            handle.shutdown().await;
        }
        info!(host = %self.name, outputs, "fan-out host closed");
        Ok(())
    }
}
