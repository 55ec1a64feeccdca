//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{ConfigLoader, TopologyLoader};
use contracts::{BridgeConfig, SignalManager};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    update_interval_ms: u64,
    signal_manager: String,
    reduction_policy: String,
    remote: String,
    installation_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let (installation_count, mut warnings) = check_topology(&config);
            warnings.extend(collect_warnings(&config));

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    update_interval_ms: config.update_interval_ms,
                    signal_manager: format!("{:?}", config.signal_manager),
                    reduction_policy: format!("{:?}", config.reduction_policy),
                    remote: config.remote.target(),
                    installation_count,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// A topology problem never invalidates the configuration: the bridge runs
/// without signal synchronization
fn check_topology(config: &BridgeConfig) -> (usize, Vec<String>) {
    let Some(path) = &config.topology_path else {
        return (
            0,
            vec!["No topology_path configured - signal synchronization disabled".to_string()],
        );
    };
    match TopologyLoader::load_from_path(path) {
        Ok(installations) if installations.is_empty() => (
            0,
            vec!["Signal topology is empty - signal synchronization disabled".to_string()],
        ),
        Ok(installations) => (installations.len(), Vec::new()),
        Err(e) => (
            0,
            vec![format!("{e} - signal synchronization disabled")],
        ),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.remote.step_timeout_ms.is_none() {
        warnings.push("remote.step_timeout_ms not set - a stalled remote step blocks the bridge".to_string());
    }

    if config.signal_manager == SignalManager::Remote && config.topology_path.is_none() {
        warnings.push("signal_manager = remote without a topology - remote signal updates are ignored".to_string());
    }

    if config.federate_assignment_radius_m > config.match_radius_m {
        warnings.push(format!(
            "federate_assignment_radius_m ({}) exceeds match_radius_m ({})",
            config.federate_assignment_radius_m, config.match_radius_m
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Update interval: {} ms", summary.update_interval_ms);
            println!("  Signal manager: {}", summary.signal_manager);
            println!("  Reduction policy: {}", summary.reduction_policy);
            println!("  Remote: {}", summary.remote);
            println!("  Installations: {}", summary.installation_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("bridge.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_valid_config_with_topology() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("topology.json"),
            r#"{ "1": [ { "p": [ {"landmark_id": "7"}, {"pos_x": "1"}, {"pos_y": "2"} ] } ] }"#,
        )
        .unwrap();
        let config = write_config(
            &dir,
            "update_interval_ms = 500\ntopology_path = \"topology.json\"\n\n[remote]\nstep_timeout_ms = 2000\n",
        );

        let result = validate_config(&ValidateArgs { config, json: true });
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.update_interval_ms, 500);
        assert_eq!(summary.installation_count, 1);
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_broken_topology_is_only_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "topology_path = \"missing.json\"\n");

        let result = validate_config(&ValidateArgs { config, json: false });
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("signal synchronization disabled")));
    }

    #[test]
    fn test_interval_below_minimum_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, "update_interval_ms = 10\n");

        let result = validate_config(&ValidateArgs { config, json: false });
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/bridge.toml"),
            json: false,
        });
        assert!(!result.valid);
    }
}
