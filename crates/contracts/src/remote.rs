//! Remote-step protocol descriptors
//!
//! One `StepResult` is returned per remote step; descriptors travel the other way
//! through `AddVehicle`/`UpdateVehicle`/`RemoveVehicle`/`UpdateSignal`/`AddSensor`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ContractError, InstallationId, Location, SensorId, VehicleId};

/// Attribute key under which the remote returns an assigned sensor id
pub const SENSOR_ID_ATTRIBUTE: &str = "sensor_id";

/// Color sent for vehicle types that carry none
pub const DEFAULT_VEHICLE_COLOR: &str = "255,255,255,100";

/// Minimum bytes per point: x, y, z as f32
pub const MIN_POINT_STRIDE: u32 = 12;

/// Vehicle spawned inside the remote simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub actor_id: VehicleId,
    pub type_id: String,
    /// Remote vehicle-class string
    pub class_id: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub color: Option<String>,
    /// Route id to register for the vehicle
    pub route: String,
}

/// Remote-controlled vehicle moved during the step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub actor_id: VehicleId,
    pub location: Location,
    /// degrees
    pub yaw: f64,
    #[serde(default)]
    pub slope: f64,
    #[serde(default)]
    pub signals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyRequest {
    pub actor_id: VehicleId,
}

/// Remote installation changed state, `state` is a one-character code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalUpdate {
    pub installation_id: InstallationId,
    pub state: String,
}

/// Raw point cloud, little-endian f32 `x, y, z[, intensity]` per point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudData {
    pub num_points: u32,
    /// Bytes per point
    pub point_stride: u32,
    pub data: Bytes,
}

/// One lidar sweep produced by a remote sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    pub sensor_id: SensorId,
    /// Sensor origin in the remote frame
    pub location: Location,
    pub min_range: f64,
    pub max_range: f64,
    pub points: PointCloudData,
}

/// Everything the remote reports for one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    #[serde(default)]
    pub spawn_requests: Vec<SpawnRequest>,
    #[serde(default)]
    pub destroy_requests: Vec<DestroyRequest>,
    #[serde(default)]
    pub move_requests: Vec<MoveRequest>,
    #[serde(default)]
    pub signal_updates: Vec<SignalUpdate>,
    #[serde(default)]
    pub sensor_frames: Vec<SensorFrame>,
}

impl StepResult {
    pub fn is_empty(&self) -> bool {
        self.spawn_requests.is_empty()
            && self.destroy_requests.is_empty()
            && self.move_requests.is_empty()
            && self.signal_updates.is_empty()
            && self.sensor_frames.is_empty()
    }

    /// Structural checks run before any part of the step is dispatched.
    ///
    /// # Errors
    /// `ContractError::MalformedStep` naming the first offending entry.
    pub fn validate(&self) -> Result<(), ContractError> {
        for (idx, spawn) in self.spawn_requests.iter().enumerate() {
            if spawn.actor_id.is_empty() {
                return Err(ContractError::malformed_step(format!(
                    "spawn_requests[{idx}]: empty actor id"
                )));
            }
            if !(spawn.length.is_finite() && spawn.width.is_finite() && spawn.height.is_finite()) {
                return Err(ContractError::malformed_step(format!(
                    "spawn_requests[{idx}]: non-finite dimensions"
                )));
            }
        }
        for (idx, destroy) in self.destroy_requests.iter().enumerate() {
            if destroy.actor_id.is_empty() {
                return Err(ContractError::malformed_step(format!(
                    "destroy_requests[{idx}]: empty actor id"
                )));
            }
        }
        for (idx, mv) in self.move_requests.iter().enumerate() {
            if mv.actor_id.is_empty() {
                return Err(ContractError::malformed_step(format!(
                    "move_requests[{idx}]: empty actor id"
                )));
            }
            if !mv.location.is_finite() || !mv.yaw.is_finite() || !mv.slope.is_finite() {
                return Err(ContractError::malformed_step(format!(
                    "move_requests[{idx}] ({}): non-finite pose",
                    mv.actor_id
                )));
            }
        }
        for (idx, signal) in self.signal_updates.iter().enumerate() {
            if signal.installation_id.is_empty() {
                return Err(ContractError::malformed_step(format!(
                    "signal_updates[{idx}]: empty installation id"
                )));
            }
        }
        for (idx, frame) in self.sensor_frames.iter().enumerate() {
            let points = &frame.points;
            if points.point_stride < MIN_POINT_STRIDE {
                return Err(ContractError::malformed_step(format!(
                    "sensor_frames[{idx}]: point stride {} < {MIN_POINT_STRIDE}",
                    points.point_stride
                )));
            }
            let expected = points.num_points as usize * points.point_stride as usize;
            if points.data.len() != expected {
                return Err(ContractError::malformed_step(format!(
                    "sensor_frames[{idx}]: expected {expected} bytes, got {}",
                    points.data.len()
                )));
            }
        }
        Ok(())
    }
}

/// Remote rotation pair (the remote only uses slope and heading)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DescriptorRotation {
    pub slope: f64,
    pub heading: f64,
}

/// Vehicle as sent to the remote, sizes as decimal strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDescriptor {
    pub id: VehicleId,
    pub type_id: String,
    pub class_id: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub color: String,
    pub location: Location,
    pub rotation: DescriptorRotation,
    pub signals: u32,
}

/// Sensor kinds the remote can attach to a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SensorKind {
    #[default]
    #[serde(rename = "LiDAR", alias = "lidar")]
    Lidar,
}

impl SensorKind {
    pub fn type_id(&self) -> &'static str {
        match self {
            SensorKind::Lidar => "LiDAR",
        }
    }
}

/// Sensor spawn/removal request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub id: String,
    pub type_id: String,
    pub attached_vehicle_id: VehicleId,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl SensorDescriptor {
    /// Remote-assigned sensor id, present on spawn responses
    pub fn assigned_sensor_id(&self) -> Option<SensorId> {
        self.attributes
            .get(SENSOR_ID_ATTRIBUTE)
            .filter(|id| !id.is_empty())
            .map(SensorId::from)
    }
}
