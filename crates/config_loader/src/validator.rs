//! Config validation
//!
//! Rules:
//! - field ranges (derive `Validate`): 100 <= update_interval_ms <= 3_600_000, match_radius_m > 0 ...
//! - lidar.upper_fov > lidar.lower_fov
//! - remote.step_timeout_ms must not be shorter than update_interval_ms
//! - vehicle_group / federate_id contain no whitespace

use contracts::{BridgeConfig, ContractError};
use validator::{Validate, ValidationErrors};

/// Validate a BridgeConfig
///
/// Returns the first error found.
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    config.validate().map_err(into_contract_error)?;
    validate_lidar_fov(config)?;
    validate_step_timeout(config)?;
    validate_identifiers(config)?;
    Ok(())
}

fn into_contract_error(errors: ValidationErrors) -> ContractError {
    let field = errors
        .errors()
        .keys()
        .min()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "config".to_string());
    ContractError::config_validation(field, errors.to_string())
}

fn validate_lidar_fov(config: &BridgeConfig) -> Result<(), ContractError> {
    let lidar = &config.lidar;
    if lidar.upper_fov <= lidar.lower_fov {
        return Err(ContractError::config_validation(
            "lidar.upper_fov / lidar.lower_fov",
            format!(
                "upper_fov ({}) must be > lower_fov ({})",
                lidar.upper_fov, lidar.lower_fov
            ),
        ));
    }
    Ok(())
}

/// a timeout shorter than one step fails every step
fn validate_step_timeout(config: &BridgeConfig) -> Result<(), ContractError> {
    if let Some(timeout) = config.remote.step_timeout_ms {
        if timeout < config.update_interval_ms {
            return Err(ContractError::config_validation(
                "remote.step_timeout_ms",
                format!(
                    "step timeout ({timeout} ms) must be >= update_interval_ms ({} ms)",
                    config.update_interval_ms
                ),
            ));
        }
    }
    Ok(())
}

fn validate_identifiers(config: &BridgeConfig) -> Result<(), ContractError> {
    for (field, value) in [
        ("federate_id", &config.federate_id),
        ("vehicle_group", &config.vehicle_group),
    ] {
        if value.chars().any(char::is_whitespace) {
            return Err(ContractError::config_validation(
                field,
                format!("'{value}' must not contain whitespace"),
            ));
        }
    }
    Ok(())
}
