//! `run` command implementation.

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use config_loader::{ConfigLoader, TopologyLoader};
use contracts::{BridgeConfig, InstallationSpec};
use host_adapter::JsonLinesHostConfig;

use crate::bridge::{load_script, load_trace, BridgeRun, RunConfig};
use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let installations = load_installations(&config);

    let trace = load_trace(&args.trace)?;
    let script = match &args.remote_script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };

    info!(
        interval_ms = config.update_interval_ms,
        signal_manager = ?config.signal_manager,
        installations = installations.len(),
        trace_entries = trace.len(),
        remote_steps = script.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration and trace are valid, exiting");
        return Ok(());
    }

    let run_config = RunConfig {
        config,
        installations,
        trace,
        script,
        output: args.output.as_ref().map(|path| JsonLinesHostConfig {
            path: path.clone(),
            append: args.append,
        }),
        log_events: args.log_events,
        start_time: args.start_time,
        queue_capacity: args.queue_capacity.max(1),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping after the current grant...");
        let _ = shutdown_tx.send(true);
    });

    info!("Starting bridge...");
    let result = BridgeRun::new(run_config).run(shutdown_rx).await;
    signal_task.abort();

    let stats = result.context("Bridge execution failed")?;
    info!(
        steps = stats.metrics.total_steps,
        grants = stats.grants,
        interrupted = stats.interrupted,
        duration_secs = stats.duration.as_secs_f64(),
        "Bridge completed"
    );
    stats.print_summary();

    info!("cosim-bridge finished");
    Ok(())
}

/// Installations of the configured topology; a missing or broken topology
/// disables signal synchronization instead of aborting the run
fn load_installations(config: &BridgeConfig) -> Vec<InstallationSpec> {
    let Some(path) = &config.topology_path else {
        info!("No signal topology configured, signal synchronization disabled");
        return Vec::new();
    };
    match TopologyLoader::load_from_path(path) {
        Ok(installations) => installations,
        Err(e) => {
            warn!(error = %e, "Failed to load signal topology, signal synchronization disabled");
            Vec::new()
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
