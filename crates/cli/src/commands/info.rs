//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use config_loader::{ConfigLoader, TopologyLoader};
use contracts::{BridgeConfig, InstallationSpec};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    timing: TimingInfo,
    signals: SignalInfo,
    vehicles: VehicleInfo,
    remote: RemoteInfo,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    lidar: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct TimingInfo {
    update_interval_ms: u64,
    step_interval_ns: u64,
}

#[derive(Serialize)]
struct SignalInfo {
    manager: String,
    reduction_policy: String,
    match_radius_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    topology_path: Option<String>,
    installation_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    clusters: Vec<ClusterInfo>,
}

#[derive(Serialize)]
struct ClusterInfo {
    installations: Vec<InstallationInfo>,
}

#[derive(Serialize)]
struct InstallationInfo {
    id: String,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct VehicleInfo {
    federate_id: String,
    vehicle_group: String,
    federate_assignment_radius_m: f64,
}

#[derive(Serialize)]
struct RemoteInfo {
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step_timeout_ms: Option<u64>,
    shutdown_grace_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.effective {
        let rendered = if args.json {
            ConfigLoader::to_json(&config)
        } else {
            ConfigLoader::to_toml(&config)
        }
        .context("Failed to render effective configuration")?;
        println!("{}", rendered);
        return Ok(());
    }

    let installations = match &config.topology_path {
        Some(path) => TopologyLoader::load_from_path(path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load signal topology");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let info = build_config_info(&config, &installations, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

/// Group installations by landmark cluster, in first-declared order
fn clusters(installations: &[InstallationSpec]) -> Vec<ClusterInfo> {
    let mut seen = Vec::new();
    let mut clusters = Vec::new();
    for installation in installations {
        if seen.contains(&installation.cluster) {
            continue;
        }
        seen.push(installation.cluster.clone());
        clusters.push(ClusterInfo {
            installations: installations
                .iter()
                .filter(|other| installation.cluster.contains(&other.id))
                .map(|other| InstallationInfo {
                    id: other.id.to_string(),
                    x: other.location.x,
                    y: other.location.y,
                })
                .collect(),
        });
    }
    clusters
}

fn build_config_info(
    config: &BridgeConfig,
    installations: &[InstallationSpec],
    args: &InfoArgs,
) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        timing: TimingInfo {
            update_interval_ms: config.update_interval_ms,
            step_interval_ns: config.step_interval(),
        },
        signals: SignalInfo {
            manager: format!("{:?}", config.signal_manager),
            reduction_policy: format!("{:?}", config.reduction_policy),
            match_radius_m: config.match_radius_m,
            topology_path: config
                .topology_path
                .as_ref()
                .map(|p| p.display().to_string()),
            installation_count: installations.len(),
            clusters: if args.topology {
                clusters(installations)
            } else {
                Vec::new()
            },
        },
        vehicles: VehicleInfo {
            federate_id: config.federate_id.clone(),
            vehicle_group: config.vehicle_group.clone(),
            federate_assignment_radius_m: config.federate_assignment_radius_m,
        },
        remote: RemoteInfo {
            target: config.remote.target(),
            step_timeout_ms: config.remote.step_timeout_ms,
            shutdown_grace_ms: config.remote.shutdown_grace_ms,
        },
        lidar: if args.lidar {
            config.lidar.to_attributes()
        } else {
            BTreeMap::new()
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Bridge Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nTiming:");
    println!("  Update interval: {} ms", info.timing.update_interval_ms);
    println!("  Step interval: {} ns", info.timing.step_interval_ns);

    println!("\nSignals:");
    println!("  Manager: {}", info.signals.manager);
    println!("  Reduction policy: {}", info.signals.reduction_policy);
    println!("  Match radius: {} m", info.signals.match_radius_m);
    match &info.signals.topology_path {
        Some(path) => println!(
            "  Topology: {} ({} installations)",
            path, info.signals.installation_count
        ),
        None => println!("  Topology: none (signal synchronization disabled)"),
    }
    for (idx, cluster) in info.signals.clusters.iter().enumerate() {
        println!("  Cluster {}:", idx);
        for installation in &cluster.installations {
            println!(
                "    - {} ({:.2}, {:.2})",
                installation.id, installation.x, installation.y
            );
        }
    }

    println!("\nVehicles:");
    println!("  Federate: {}", info.vehicles.federate_id);
    println!("  Group: {}", info.vehicles.vehicle_group);
    println!(
        "  Assignment radius: {} m",
        info.vehicles.federate_assignment_radius_m
    );

    println!("\nRemote:");
    println!("  Target: {}", info.remote.target);
    match info.remote.step_timeout_ms {
        Some(ms) => println!("  Step timeout: {} ms", ms),
        None => println!("  Step timeout: none"),
    }
    println!("  Shutdown grace: {} ms", info.remote.shutdown_grace_ms);

    if !info.lidar.is_empty() {
        println!("\nLidar:");
        for (key, value) in &info.lidar {
            println!("  {}: {}", key, value);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Location;
    use std::path::PathBuf;

    fn installation(id: &str, cluster: &[&str]) -> InstallationSpec {
        InstallationSpec {
            id: id.into(),
            location: Location::new(1.0, 2.0, 0.0),
            cluster: cluster.iter().map(|c| (*c).into()).collect(),
        }
    }

    #[test]
    fn test_clusters_grouped_once() {
        let installations = vec![
            installation("a", &["a", "b"]),
            installation("b", &["a", "b"]),
            installation("c", &["c"]),
        ];
        let clusters = clusters(&installations);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].installations.len(), 2);
        assert_eq!(clusters[1].installations[0].id, "c");
    }

    #[test]
    fn test_build_info_respects_flags() {
        let args = InfoArgs {
            config: PathBuf::from("bridge.toml"),
            json: true,
            topology: false,
            lidar: true,
            effective: false,
        };
        let installations = vec![installation("a", &["a"])];
        let info = build_config_info(&BridgeConfig::default(), &installations, &args);

        assert_eq!(info.timing.step_interval_ns, 1_000_000_000);
        assert_eq!(info.signals.installation_count, 1);
        assert!(info.signals.clusters.is_empty());
        assert_eq!(info.lidar["channels"], "32");
    }
}
