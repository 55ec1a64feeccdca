//! HostRuntime trait - outbound side of the host simulation runtime
//!
//! The coordinator only ever publishes through this trait, so any host ABI can
//! sit behind a thin adapter.

use crate::{ContractError, OutboundEvent};

/// Publishes bridge events into the host runtime
#[trait_variant::make(HostRuntime: Send)]
pub trait LocalHostRuntime {
    /// Adapter name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Publish one outbound event
    ///
    /// # Errors
    /// A failed publish is fatal for the current step.
    async fn emit(&mut self, event: OutboundEvent) -> Result<(), ContractError>;

    /// Release resources held by the adapter
    async fn close(&mut self) -> Result<(), ContractError>;
}
