//! Remote Link error types

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Remote simulator cannot be reached
    #[error("remote simulator unreachable at {target}: {message}")]
    Unreachable { target: String, message: String },

    /// A remote call returned an error
    #[error("remote call {call} failed: {message}")]
    CallFailed { call: &'static str, message: String },

    #[error("remote step timed out after {timeout_ms} ms")]
    StepTimeout { timeout_ms: u64 },

    /// Sensor spawn answered without an assigned sensor id
    #[error("sensor spawn for vehicle '{vehicle_id}' returned no sensor id")]
    MissingSensorId { vehicle_id: String },

    #[error("remote link is not connected")]
    NotConnected,

    /// Wrapped ContractError (malformed step result, script parsing)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl RemoteError {
    pub fn unreachable(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn call_failed(call: &'static str, message: impl Into<String>) -> Self {
        Self::CallFailed {
            call,
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, RemoteError>;
