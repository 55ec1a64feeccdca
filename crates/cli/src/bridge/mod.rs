//! Bridge run orchestration module.

mod runner;
mod stats;

pub use runner::{load_script, load_trace, BridgeRun, RunConfig};
pub use stats::RunStats;
