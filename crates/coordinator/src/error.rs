//! Coordinator error types
//!
//! Every error returned by a grant is fatal for the federate.

use contracts::{ContractError, SimTime};
use remote_link::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A buffered event lies in the future of the granted time
    #[error("{kind} event at {event_time} is later than granted time {granted}")]
    TemporalOrderingViolation {
        kind: &'static str,
        event_time: SimTime,
        granted: SimTime,
    },

    #[error("remote step result malformed: {message}")]
    MalformedStep { message: String },

    #[error(transparent)]
    Remote(RemoteError),

    /// Host runtime refused an outbound event
    #[error("host emission failed: {0}")]
    HostEmit(#[source] ContractError),

    /// Operation not allowed in the current lifecycle state
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Next step time does not fit the clock
    #[error("next step {next_step} + interval {interval} overflows the simulation clock")]
    ClockOverflow { next_step: SimTime, interval: SimTime },

    /// Intake closed by shutdown
    #[error("event intake is closed")]
    IntakeClosed,
}

impl From<RemoteError> for CoordinatorError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Contract(ContractError::MalformedStep { message }) => {
                Self::MalformedStep { message }
            }
            other => Self::Remote(other),
        }
    }
}

impl CoordinatorError {
    pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TemporalOrderingViolation { .. } => "temporal_ordering_violation",
            Self::MalformedStep { .. } => "malformed_step",
            Self::Remote(_) => "remote",
            Self::HostEmit(_) => "host_emit",
            Self::InvalidState { .. } => "invalid_state",
            Self::ClockOverflow { .. } => "clock_overflow",
            Self::IntakeClosed => "intake_closed",
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, CoordinatorError>;
