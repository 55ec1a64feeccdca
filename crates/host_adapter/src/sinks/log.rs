//! LogHost - logs outbound event summaries via tracing

use contracts::{ContractError, HostRuntime, OutboundEvent, OutboundKind};
use tracing::{info, instrument};

/// Host output for dry runs and debugging
pub struct LogHost {
    name: String,
}

impl LogHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_event_summary(&self, event: &OutboundEvent) {
        match &event.kind {
            OutboundKind::VehicleUpdates {
                updated,
                removed,
                sensor_updates,
            } => info!(
                host = %self.name,
                time = event.time,
                updated = updated.len(),
                removed = removed.len(),
                sensor_updates = sensor_updates.len(),
                "vehicle updates"
            ),
            OutboundKind::SignalStateChange { group_id, states } => info!(
                host = %self.name,
                time = event.time,
                group_id = %group_id,
                indications = states.len(),
                "signal state change"
            ),
            OutboundKind::TimeAdvanceRequest { requested } => info!(
                host = %self.name,
                requested,
                "time advance requested"
            ),
            other => info!(
                host = %self.name,
                time = event.time,
                kind = other.name(),
                "outbound event"
            ),
        }
    }
}

impl HostRuntime for LogHost {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_host_emit",
        skip(self, event),
        fields(host = %self.name, time = event.time)
    )]
    async fn emit(&mut self, event: OutboundEvent) -> Result<(), ContractError> {
        self.log_event_summary(&event);
        Ok(())
    }

    #[instrument(name = "log_host_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(host = %self.name, "LogHost closed");
        Ok(())
    }
}
