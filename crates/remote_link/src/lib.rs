//! # Remote Link
//!
//! Remote physics simulator access.
//!
//! Responsibilities:
//! - `RemoteSimulator` trait over the remote step protocol
//! - `RemoteLink`: step timeout, result validation, sensor id extraction,
//!   bounded shutdown
//! - `MockRemoteSimulator`: scripted in-memory remote with failure injection

pub mod client;
pub mod error;
pub mod link;
pub mod mock;

pub use client::RemoteSimulator;
pub use error::{RemoteError, Result};
pub use link::RemoteLink;
pub use mock::{parse_script, MockConfig, MockRemoteSimulator, RemoteCall};
