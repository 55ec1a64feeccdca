//! Host adapter error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostAdapterError {
    #[error("failed to create host output '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Trace line that is neither an inbound event nor a grant
    #[error("trace line {line}: {message}")]
    Trace { line: usize, message: String },

    #[error("coordinator error: {0}")]
    Coordinator(#[from] coordinator::CoordinatorError),

    #[error("host error: {0}")]
    Contract(#[from] contracts::ContractError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostAdapterError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn trace(line: usize, message: impl Into<String>) -> Self {
        Self::Trace {
            line,
            message: message.into(),
        }
    }
}
