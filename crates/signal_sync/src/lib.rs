//! # Signal Sync
//!
//! Signal topology matching and state reduction.
//!
//! Responsibilities:
//! - state table of remote signal installations
//! - fine / coarse indication conversion (strict / permissive)
//! - map host signal groups to installation clusters by distance, pole count and conflicts
//! - replaceable approach ordering (clockwise by default)

mod installation;
mod matcher;
mod ordering;
mod reducer;

pub use installation::{InstallationTable, SignalInstallation};
pub use matcher::{approach_indices, MatchOutcome, MatchReport, TopologyMatcher};
pub use ordering::{ApproachOrdering, Clockwise};
pub use reducer::{fine_for, StateReducer};
