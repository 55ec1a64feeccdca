//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Co-simulation bridge between a host traffic runtime and a remote physics simulator
#[derive(Parser, Debug)]
#[command(
    name = "cosim-bridge",
    author,
    version,
    about = "Time-synchronized co-simulation bridge",
    long_about = "Couples a host traffic co-simulation runtime with a remote physics \n\
                  simulator. Replays host events at each time grant, steps the remote \n\
                  simulator and publishes its changes back to the host."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "COSIM_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "COSIM_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a host trace through the bridge
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "bridge.toml",
        env = "COSIM_BRIDGE_CONFIG"
    )]
    pub config: PathBuf,

    /// Host trace: one JSON inbound event or `{"grant": <ns>}` per line
    #[arg(short, long, env = "COSIM_BRIDGE_TRACE")]
    pub trace: PathBuf,

    /// Remote step script: one JSON step result per line
    #[arg(long, env = "COSIM_BRIDGE_REMOTE_SCRIPT")]
    pub remote_script: Option<PathBuf>,

    /// Write outbound events as JSON lines to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Append to the output file instead of truncating it
    #[arg(long, requires = "output")]
    pub append: bool,

    /// Log every outbound event
    #[arg(long)]
    pub log_events: bool,

    /// Simulation time of the first time-advance request (ns)
    #[arg(long, default_value = "0")]
    pub start_time: u64,

    /// Queue capacity of each outbound host worker
    #[arg(long, default_value = "256", env = "COSIM_BRIDGE_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Validate configuration and trace, then exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "COSIM_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the signal installations of the static topology
    #[arg(long)]
    pub topology: bool,

    /// Show lidar spawn attributes
    #[arg(long)]
    pub lidar: bool,

    /// Print the effective configuration, defaults filled in
    #[arg(long, conflicts_with_all = ["topology", "lidar"])]
    pub effective: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
