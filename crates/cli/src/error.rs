//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Input file not found
    #[error("{kind} file not found: {path}")]
    FileNotFound { kind: &'static str, path: String },

    /// Host trace could not be loaded
    #[error("Failed to load trace {path}: {message}")]
    TraceLoad { path: String, message: String },

    /// Remote step script could not be loaded
    #[error("Failed to load remote script {path}: {message}")]
    ScriptLoad { path: String, message: String },

    /// Outbound host could not be created
    #[error("Failed to create output {path}: {message}")]
    Output { path: String, message: String },

    /// Bridge stopped on a fatal error
    #[error("Bridge execution failed: {message}")]
    BridgeExecution { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn file_not_found(kind: &'static str, path: impl Into<String>) -> Self {
        Self::FileNotFound {
            kind,
            path: path.into(),
        }
    }

    pub fn trace_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TraceLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn script_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn output(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Output {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn bridge_execution(message: impl Into<String>) -> Self {
        Self::BridgeExecution {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
