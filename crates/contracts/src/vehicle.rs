//! Vehicle data model shared by both simulators

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::VehicleId;

/// Host-side vehicle class vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    #[default]
    Unknown,
    Car,
    LightGoodsVehicle,
    HeavyGoodsVehicle,
    PublicTransportVehicle,
    EmergencyVehicle,
    WorksVehicle,
    ExceptionalSizeVehicle,
    VehicleWithTrailer,
    HighSideVehicle,
    MiniBus,
    Taxi,
    ElectricVehicle,
    AutomatedVehicle,
    Bicycle,
    Motorcycle,
    HighOccupancyVehicle,
}

/// Immutable vehicle type, shared by every vehicle of that type via `Arc`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleType {
    pub name: String,
    /// meters
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub vehicle_class: VehicleClass,
    /// "r,g,b,a"
    #[serde(default)]
    pub color: Option<String>,
}

pub type SharedVehicleType = Arc<VehicleType>;

/// Cartesian point in the shared planar frame (meters)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar (x, y) distance, z ignored
    pub fn planar_distance(&self, other: &Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Geodetic point (degrees, meters)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Dual position representation carried by every vehicle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub cartesian: Location,
    pub geo: GeoPoint,
}

/// Light and turn-signal flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VehicleSignals {
    pub blinker_right: bool,
    pub blinker_left: bool,
    pub blinker_emergency: bool,
    pub brake_light: bool,
    pub reverse_drive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveDirection {
    #[default]
    Forward,
    Backward,
}

/// Which simulator currently owns a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllingSide {
    /// Moved by the host traffic simulator
    Host,
    /// Moved by the remote physics simulator
    Remote,
}

/// One vehicle's kinematic snapshot as exchanged with the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub id: VehicleId,
    pub position: VehiclePosition,
    /// degrees
    pub heading: f64,
    #[serde(default)]
    pub slope: f64,
    #[serde(default)]
    pub signals: VehicleSignals,
    #[serde(default)]
    pub direction: DriveDirection,
}

/// Registry entry for a known vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub vehicle_type: SharedVehicleType,
    pub position: VehiclePosition,
    pub heading: f64,
    pub slope: f64,
    pub signals_mask: u32,
    pub controlled_by: ControllingSide,
}

/// Host route declaration, edges in travel order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRoute {
    pub id: String,
    #[serde(default)]
    pub edges: Vec<String>,
}

impl VehicleRoute {
    /// Last edge of the route, if it has any
    pub fn last_edge(&self) -> Option<&str> {
        self.edges.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_class_serde_snake_case() {
        let json = serde_json::to_string(&VehicleClass::LightGoodsVehicle).unwrap();
        assert_eq!(json, "\"light_goods_vehicle\"");
    }

    #[test]
    fn test_planar_distance_ignores_z() {
        let a = Location::new(0.0, 0.0, 5.0);
        let b = Location::new(3.0, 4.0, -2.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_vehicle_state_defaults() {
        let state: VehicleState = serde_json::from_str(
            r#"{"id":"veh_0","position":{"cartesian":{"x":1.0,"y":2.0,"z":0.0},
                "geo":{"latitude":0.0,"longitude":0.0,"altitude":0.0}},"heading":90.0}"#,
        )
        .unwrap();
        assert_eq!(state.direction, DriveDirection::Forward);
        assert_eq!(state.signals, VehicleSignals::default());
    }

    #[test]
    fn test_route_last_edge() {
        let route = VehicleRoute {
            id: "r0".into(),
            edges: vec!["e1".into(), "e2".into()],
        };
        assert_eq!(route.last_edge(), Some("e2"));
        let empty = VehicleRoute {
            id: "r1".into(),
            edges: Vec::new(),
        };
        assert_eq!(empty.last_edge(), None);
    }
}
