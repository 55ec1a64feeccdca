//! # Contracts
//!
//! Frozen interface contracts shared by every bridge crate: the entity data
//! model, the inbound/outbound host event sum types, the remote-step protocol
//! descriptors and the bridge configuration.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Host simulation time is an integer count of nanoseconds ([`SimTime`])
//! - The remote simulator has no clock of its own, it advances one step per grant

mod bridge_config;
mod entity_id;
mod error;
mod events;
mod host;
mod remote;
mod report;
mod signal;
mod vehicle;

pub use bridge_config::*;
pub use entity_id::{EntityId, GroupId, InstallationId, SensorId, VehicleId};
pub use error::*;
pub use events::*;
pub use host::*;
pub use remote::*;
pub use report::StepReport;
pub use signal::*;
pub use vehicle::*;
