//! Bridge runner - wires configuration, remote, outputs and the trace driver.
//!
//! The remote simulator is the scripted in-memory one; the host runtime is
//! stood in for by a recorded trace on the inbound side and by a fan-out of
//! JSON-lines / log outputs on the outbound side.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{BridgeConfig, InstallationSpec, SimTime, StepResult};
use coordinator::Coordinator;
use host_adapter::{
    parse_trace, FanoutHost, HostHandle, HostMetrics, JsonLinesHost, JsonLinesHostConfig, LogHost,
    TraceDriver, TraceEntry,
};
use remote_link::MockRemoteSimulator;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::RunStats;
use crate::error::CliError;

/// Everything a bridge run needs, already loaded
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub config: BridgeConfig,

    /// Remote static signal topology (empty = signal sync disabled)
    pub installations: Vec<InstallationSpec>,

    pub trace: Vec<TraceEntry>,

    /// Remote steps returned in order; an exhausted script yields empty steps
    pub script: Vec<StepResult>,

    /// JSON-lines output (None = no file output)
    pub output: Option<JsonLinesHostConfig>,

    /// Log every outbound event
    pub log_events: bool,

    pub start_time: SimTime,

    pub queue_capacity: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Load a host trace file
pub fn load_trace(path: &Path) -> crate::error::Result<Vec<TraceEntry>> {
    if !path.exists() {
        return Err(CliError::file_not_found("Trace", path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_trace(&content).map_err(|e| CliError::trace_load(path.display().to_string(), e.to_string()))
}

/// Load a remote step script
pub fn load_script(path: &Path) -> crate::error::Result<Vec<StepResult>> {
    if !path.exists() {
        return Err(CliError::file_not_found(
            "Remote script",
            path.display().to_string(),
        ));
    }
    let content = std::fs::read_to_string(path)?;
    remote_link::parse_script(&content)
        .map_err(|e| CliError::script_load(path.display().to_string(), e.to_string()))
}

/// One bridge run over a recorded trace
pub struct BridgeRun {
    config: RunConfig,
}

impl BridgeRun {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run the trace to completion or until `shutdown` flips to true
    ///
    /// The coordinator is always shut down, also after a fatal error, so the
    /// outputs are flushed either way.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<RunStats> {
        let started = Instant::now();
        let RunConfig {
            config,
            installations,
            trace,
            script,
            output,
            log_events,
            start_time,
            queue_capacity,
            metrics_port,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let (host, outputs) = build_outputs(output, log_events, queue_capacity)?;
        let remote = MockRemoteSimulator::new().with_script(script);

        info!(
            remote = %config.remote.target(),
            interval_ms = config.update_interval_ms,
            signal_manager = ?config.signal_manager,
            installations = installations.len(),
            outputs = outputs.len(),
            "Starting bridge"
        );

        let coordinator = Arc::new(Coordinator::new(config, remote, host, installations));
        let driver = TraceDriver::new(Arc::clone(&coordinator)).with_start_time(start_time);
        let result = driver.run(trace, shutdown).await;

        let report = coordinator
            .shutdown()
            .await
            .context("Failed to shut down coordinator")?;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, state = coordinator.state().await.as_str(), "Bridge stopped");
                return Err(CliError::bridge_execution(e.to_string()).into());
            }
        };

        if summary.interrupted {
            warn!("Bridge interrupted before the end of the trace");
        }

        Ok(RunStats {
            entries: summary.entries,
            events_submitted: summary.events_submitted,
            grants: summary.grants,
            interrupted: summary.interrupted,
            discarded_events: report.discarded_events,
            duration: started.elapsed(),
            outputs: outputs
                .into_iter()
                .map(|(name, metrics)| (name, metrics.snapshot()))
                .collect(),
            metrics: summary.metrics,
        })
    }
}

/// Spawn one worker per output; a log output is added when nothing else is
fn build_outputs(
    output: Option<JsonLinesHostConfig>,
    log_events: bool,
    queue_capacity: usize,
) -> Result<(FanoutHost, Vec<(String, Arc<HostMetrics>)>)> {
    let mut handles = Vec::new();

    if let Some(output) = output {
        let path = output.path.display().to_string();
        let host = JsonLinesHost::new("jsonl", output)
            .map_err(|e| CliError::output(path.clone(), e.to_string()))?;
        info!(path = %path, "Writing outbound events");
        handles.push(HostHandle::spawn(host, queue_capacity));
    }
    if log_events || handles.is_empty() {
        handles.push(HostHandle::spawn(LogHost::new("log"), queue_capacity));
    }

    let outputs = handles
        .iter()
        .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
        .collect();
    Ok((FanoutHost::with_handles("outputs", handles), outputs))
}
