//! Layered error definitions
//!
//! Categorized by source: config / topology / remote step / host

use thiserror::Error;

/// Unified contract error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Static signal topology could not be loaded
    #[error("signal topology error in '{path}': {message}")]
    Topology { path: String, message: String },

    // ===== Remote Protocol Errors =====
    /// Step result failed structural validation
    #[error("malformed step result: {message}")]
    MalformedStep { message: String },

    // ===== Host Errors =====
    /// Host runtime rejected an outbound event
    #[error("host '{host}' emit error: {message}")]
    HostEmit { host: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn topology(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Topology {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn malformed_step(message: impl Into<String>) -> Self {
        Self::MalformedStep {
            message: message.into(),
        }
    }

    /// Create host emit error
    pub fn host_emit(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostEmit {
            host: host.into(),
            message: message.into(),
        }
    }
}
