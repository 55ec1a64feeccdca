//! BridgeConfig - Config Loader output
//!
//! Read-only runtime parameters of the bridge: step interval, signal manager,
//! reduction policy, matching radius, remote endpoint and lidar defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use validator::Validate;

use crate::{ReductionPolicy, SimTime, MILLISECOND};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Which simulator is the manager of record for traffic signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalManager {
    /// Host drives signals, states are pushed to the remote
    #[default]
    #[serde(alias = "local", alias = "mosaic")]
    Host,
    /// Remote drives signals, states are published to the host
    #[serde(alias = "carla")]
    Remote,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BridgeConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Remote step length in milliseconds
    #[serde(default = "default_update_interval_ms")]
    #[validate(range(
        min = 100,
        max = 3_600_000,
        message = "update interval must be between 100 ms and one hour"
    ))]
    pub update_interval_ms: u64,

    #[serde(default)]
    pub signal_manager: SignalManager,

    #[serde(default)]
    pub reduction_policy: ReductionPolicy,

    /// Max anchor-to-installation distance for a topology match (meters)
    #[serde(default = "default_match_radius_m")]
    #[validate(range(exclusive_min = 0.0, message = "match radius must be positive"))]
    pub match_radius_m: f64,

    /// This federate's id; events it sent itself are ignored
    #[serde(default = "default_federate_id")]
    #[validate(length(min = 1))]
    pub federate_id: String,

    /// Host vehicle group for remote-spawned vehicles
    #[serde(default = "default_vehicle_group")]
    #[validate(length(min = 1))]
    pub vehicle_group: String,

    /// Radius declared with each federate assignment (meters)
    #[serde(default = "default_assignment_radius_m")]
    #[validate(range(min = 0.0))]
    pub federate_assignment_radius_m: f64,

    /// Static remote signal topology (JSON)
    #[serde(default)]
    pub topology_path: Option<PathBuf>,

    #[serde(default)]
    #[validate(nested)]
    pub remote: RemoteEndpointConfig,

    #[serde(default)]
    #[validate(nested)]
    pub lidar: LidarConfig,

    /// Origin of the local projection between Cartesian and geodetic positions
    #[serde(default)]
    #[validate(nested)]
    pub geo_origin: GeoOrigin,
}

impl BridgeConfig {
    /// Step interval in host time units
    pub fn step_interval(&self) -> SimTime {
        self.update_interval_ms.saturating_mul(MILLISECOND)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::default(),
            update_interval_ms: default_update_interval_ms(),
            signal_manager: SignalManager::default(),
            reduction_policy: ReductionPolicy::default(),
            match_radius_m: default_match_radius_m(),
            federate_id: default_federate_id(),
            vehicle_group: default_vehicle_group(),
            federate_assignment_radius_m: default_assignment_radius_m(),
            topology_path: None,
            remote: RemoteEndpointConfig::default(),
            lidar: LidarConfig::default(),
            geo_origin: GeoOrigin::default(),
        }
    }
}

fn default_update_interval_ms() -> u64 {
    1000
}

fn default_match_radius_m() -> f64 {
    15.0
}

fn default_federate_id() -> String {
    "carla".to_string()
}

fn default_vehicle_group() -> String {
    "carla-controlled".to_string()
}

fn default_assignment_radius_m() -> f64 {
    10.0
}

/// Remote simulator endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RemoteEndpointConfig {
    #[serde(default = "default_remote_host")]
    #[validate(length(min = 1))]
    pub host: String,

    #[serde(default = "default_remote_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Step call timeout; none waits indefinitely
    #[serde(default)]
    #[validate(range(min = 1))]
    pub step_timeout_ms: Option<u64>,

    /// Drain period granted to in-flight calls on shutdown
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl RemoteEndpointConfig {
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RemoteEndpointConfig {
    fn default() -> Self {
        Self {
            host: default_remote_host(),
            port: default_remote_port(),
            step_timeout_ms: None,
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

fn default_remote_host() -> String {
    "localhost".to_string()
}

fn default_remote_port() -> u16 {
    50051
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

/// Lidar parameters sent with every sensor spawn
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LidarConfig {
    #[validate(range(min = 1))]
    pub channels: u32,
    #[validate(range(exclusive_min = 0.0))]
    pub range: f64,
    #[validate(range(min = 1))]
    pub points_per_second: u32,
    #[validate(range(exclusive_min = 0.0))]
    pub rotation_frequency: f64,
    pub upper_fov: f64,
    pub lower_fov: f64,
    #[validate(range(min = 0.0))]
    pub atmosphere_attenuation_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dropoff_general_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dropoff_intensity_limit: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub dropoff_zero_intensity: f64,
    #[validate(range(min = 0.0))]
    pub noise_stddev: f64,
}

impl LidarConfig {
    /// Spawn attribute map, keyed by the remote's attribute names
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        [
            ("channels", self.channels.to_string()),
            ("range", self.range.to_string()),
            ("points_per_second", self.points_per_second.to_string()),
            ("rotation_frequency", self.rotation_frequency.to_string()),
            ("upper_fov", self.upper_fov.to_string()),
            ("lower_fov", self.lower_fov.to_string()),
            (
                "atmosphere_attenuation_rate",
                self.atmosphere_attenuation_rate.to_string(),
            ),
            ("dropoff_general_rate", self.dropoff_general_rate.to_string()),
            (
                "dropoff_intensity_limit",
                self.dropoff_intensity_limit.to_string(),
            ),
            (
                "dropoff_zero_intensity",
                self.dropoff_zero_intensity.to_string(),
            ),
            ("noise_stddev", self.noise_stddev.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self {
            channels: 32,
            range: 10.0,
            points_per_second: 56000,
            rotation_frequency: 10.0,
            upper_fov: 10.0,
            lower_fov: -30.0,
            atmosphere_attenuation_rate: 0.004,
            dropoff_general_rate: 0.45,
            dropoff_intensity_limit: 0.8,
            dropoff_zero_intensity: 0.4,
            noise_stddev: 0.0,
        }
    }
}

/// Geodetic origin of the shared planar frame (degrees)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeoOrigin {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.update_interval_ms, 1000);
        assert_eq!(config.step_interval(), 1_000_000_000);
        assert_eq!(config.signal_manager, SignalManager::Host);
        assert_eq!(config.reduction_policy, ReductionPolicy::Strict);
        assert_eq!(config.remote.target(), "localhost:50051");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interval_below_minimum_fails() {
        let config = BridgeConfig {
            update_interval_ms: 50,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("update_interval_ms"));
    }

    #[test]
    fn test_interval_above_one_hour_fails() {
        let config = BridgeConfig {
            update_interval_ms: u64::MAX / 1000,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("update_interval_ms"));
        // an unvalidated config still does not overflow
        assert_eq!(config.step_interval(), u64::MAX);

        let hour = BridgeConfig {
            update_interval_ms: 3_600_000,
            ..Default::default()
        };
        assert!(hour.validate().is_ok());
    }

    #[test]
    fn test_signal_manager_aliases() {
        let host: SignalManager = serde_json::from_str("\"mosaic\"").unwrap();
        let remote: SignalManager = serde_json::from_str("\"carla\"").unwrap();
        assert_eq!(host, SignalManager::Host);
        assert_eq!(remote, SignalManager::Remote);
    }

    #[test]
    fn test_lidar_attributes() {
        let attributes = LidarConfig::default().to_attributes();
        assert_eq!(attributes.len(), 11);
        assert_eq!(attributes["channels"], "32");
        assert_eq!(attributes["points_per_second"], "56000");
        assert_eq!(attributes["lower_fov"], "-30");
        assert_eq!(attributes["dropoff_general_rate"], "0.45");
    }
}
