//! # Host Adapter
//!
//! Host runtime adapters.
//!
//! Responsibilities:
//! - HostRuntime outputs for outbound events (channel, log, JSON-lines file)
//! - fan-out to several outputs, one worker per output
//! - replay a recorded host trace (inbound events and grants) into the coordinator

pub mod error;
pub mod fanout;
pub mod handle;
pub mod metrics;
pub mod sinks;
pub mod trace;

pub use contracts::{HostRuntime, OutboundEvent};
pub use error::HostAdapterError;
pub use fanout::FanoutHost;
pub use handle::HostHandle;
pub use metrics::{HostMetrics, MetricsSnapshot};
pub use sinks::{ChannelHost, JsonLinesHost, JsonLinesHostConfig, LogHost};
pub use trace::{parse_trace, TraceDriver, TraceEntry, TraceSummary};
