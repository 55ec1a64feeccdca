//! HostRuntime implementations
//!
//! Contains ChannelHost, LogHost, and JsonLinesHost.

mod channel;
mod file;
mod log;

pub use self::channel::ChannelHost;
pub use self::file::{JsonLinesHost, JsonLinesHostConfig};
pub use self::log::LogHost;
