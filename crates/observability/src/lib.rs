//! # Observability
//!
//! Tracing and Prometheus metrics for the bridge.
//!
//! ## Features
//!
//! - Tracing setup (JSON / pretty / compact)
//! - Prometheus exporter
//! - StepReport recording and aggregation
//!
//! ## Usage
//!
//! ```ignore
//! use observability::{init_with_config, metrics, LogFormat, ObservabilityConfig};
//!
//! // -v => debug, compact output
//! init_with_config(ObservabilityConfig::from_verbosity(1, false, LogFormat::Compact))?;
//!
//! // record per-step metrics
//! if let GrantOutcome::Stepped(report) = coordinator.grant(granted).await? {
//!     metrics::record_step_report(&report);
//! }
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use ::metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_host_emit, record_idle_grant, record_step_report, record_trace_entry,
    BridgeMetricsAggregator, BridgeSummary, RunningStats, StatsSummary,
};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Level used when RUST_LOG is unset
    pub default_log_level: String,
    /// Ignore RUST_LOG and log warn and above only
    pub quiet: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
            quiet: false,
        }
    }
}

impl ObservabilityConfig {
    /// `-v` count to level: 0 info, 1 debug, 2+ trace
    pub fn from_verbosity(verbose: u8, quiet: bool, log_format: LogFormat) -> Self {
        let default_log_level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        Self {
            log_format,
            metrics_port: None,
            default_log_level: default_log_level.to_string(),
            quiet,
        }
    }

    pub fn with_metrics_port(mut self, port: u16) -> Self {
        self.metrics_port = Some(port);
        self
    }

    fn env_filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::new("warn");
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs
    #[default]
    Json,
    /// Human-readable
    Pretty,
    /// Compact single line
    Compact,
}

/// Initialize tracing, and Prometheus when a port is configured
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        quiet = config.quiet,
        "Observability initialized"
    );
    Ok(())
}

/// Initialize the Prometheus exporter only (no tracing)
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;
    describe_bridge_metrics();

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

/// Register metric descriptions (HELP lines in the Prometheus output)
pub fn describe_bridge_metrics() {
    describe_counter!("bridge_steps_total", "Remote steps executed");
    describe_counter!("bridge_grants_total", "Time-advance grants by outcome");
    describe_counter!("bridge_events_submitted_total", "Inbound host events queued");
    describe_counter!("bridge_events_emitted_total", "Outbound host events, by kind");
    describe_counter!("bridge_trace_entries_total", "Trace entries driven, by kind");
    describe_counter!("bridge_idle_grants_total", "Grants earlier than the next scheduled step");
    describe_counter!("bridge_events_replayed_total", "Inbound host events replayed, by kind");
    describe_counter!("bridge_events_discarded_total", "Events still queued at shutdown");
    describe_counter!("bridge_ordering_violations_total", "Events later than the granted time");
    describe_counter!("bridge_fatal_errors_total", "Fatal coordinator errors, by kind");
    describe_counter!("bridge_items_skipped_total", "Recoverable items skipped, by reason");
    describe_counter!("bridge_vehicles_total", "Remote vehicle changes, by change");
    describe_counter!("bridge_signal_updates_total", "Signal state updates, by direction");
    describe_counter!("bridge_sensor_frames_total", "Sensor frames, by outcome");
    describe_counter!("bridge_host_emits_total", "Outbound events written, by output and outcome");
    describe_counter!("bridge_step_frames_dropped_total", "Sensor frames dropped for unbound sensors");
    describe_counter!("signal_match_total", "Topology match attempts, by outcome");
    describe_counter!("remote_calls_total", "Remote simulator calls, by call and outcome");
    describe_gauge!("bridge_event_queue_depth", "Events waiting for the next grant");
    describe_gauge!("bridge_last_grant_seconds", Unit::Seconds, "Last granted simulation time");
    describe_gauge!("bridge_last_step_vehicles", "Vehicle changes of the last step, by change");
    describe_gauge!("bridge_sim_time_seconds", Unit::Seconds, "Granted simulation time of the last step");
    describe_gauge!("signal_unmatched_groups", "Signal groups left unmatched by the last matching pass");
    describe_gauge!(
        "signal_unmatched_installations",
        "Installations left unmatched by the last matching pass"
    );
    describe_histogram!("bridge_step_latency_ms", Unit::Milliseconds, "Wall time of one remote step");
    describe_histogram!("bridge_events_per_grant", Unit::Count, "Events replayed per grant");
    describe_histogram!("remote_step_duration_ms", Unit::Milliseconds, "Remote step call duration");
}
