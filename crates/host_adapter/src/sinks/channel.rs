//! ChannelHost - forwards outbound events to an in-process receiver

use contracts::{ContractError, HostRuntime, OutboundEvent};
use tokio::sync::mpsc;
use tracing::debug;

/// Host whose runtime lives in the same process, e.g. an embedding
/// application or a test harness
pub struct ChannelHost {
    name: String,
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelHost {
    /// Returns the host and the receiver the embedding side reads from
    pub fn new(name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }
}

impl HostRuntime for ChannelHost {
    fn name(&self) -> &str {
        &self.name
    }

    async fn emit(&mut self, event: OutboundEvent) -> Result<(), ContractError> {
        self.tx
            .send(event)
            .map_err(|_| ContractError::host_emit(&self.name, "receiver dropped"))
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(host = %self.name, "ChannelHost closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::OutboundKind;

    #[tokio::test]
    async fn test_channel_host_forwards() {
        let (mut host, mut rx) = ChannelHost::new("embedded");
        let event = OutboundEvent::new(7, OutboundKind::TimeAdvanceRequest { requested: 7 });
        host.emit(event.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(event));
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_an_error() {
        let (mut host, rx) = ChannelHost::new("embedded");
        drop(rx);
        let event = OutboundEvent::new(0, OutboundKind::TimeAdvanceRequest { requested: 0 });
        let err = host.emit(event).await.unwrap_err();
        assert!(matches!(err, ContractError::HostEmit { .. }));
    }
}
