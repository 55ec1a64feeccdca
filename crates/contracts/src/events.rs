//! Host-runtime events, both directions
//!
//! Inbound events are tagged variants matched exhaustively at replay time.
//! Outbound events are what the bridge asks the host runtime to publish.

use serde::{Deserialize, Serialize};

use crate::{
    FineIndication, GroupId, Location, SensorKind, SignalGroup, VehicleId, VehicleRoute,
    VehicleState, VehicleType,
};

/// Host simulation time in nanoseconds
pub type SimTime = u64;

pub const MILLISECOND: SimTime = 1_000_000;

/// Event delivered by the host runtime, buffered until the next grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub time: SimTime,
    /// Federate that published the event
    pub sender: String,
    #[serde(flatten)]
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundKind {
    /// Batched kinematic updates of host-controlled vehicles
    VehicleUpdates {
        #[serde(default)]
        added: Vec<VehicleState>,
        #[serde(default)]
        updated: Vec<VehicleState>,
        #[serde(default)]
        removed: Vec<VehicleId>,
    },
    /// A vehicle the host will move
    VehicleRegistration {
        vehicle_id: VehicleId,
        vehicle_type: VehicleType,
    },
    VehicleTypes { types: Vec<VehicleType> },
    Routes { routes: Vec<VehicleRoute> },
    /// One-shot announcement of every host signal group
    SignalTopology { groups: Vec<SignalGroup> },
    /// Current fine indications per group, in each group's link order
    SignalStates { groups: Vec<GroupSignalState> },
    SensorActivation {
        vehicle_id: VehicleId,
        #[serde(default)]
        sensor: SensorKind,
        activate: bool,
    },
}

impl InboundKind {
    /// Short name for logs and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            InboundKind::VehicleUpdates { .. } => "vehicle_updates",
            InboundKind::VehicleRegistration { .. } => "vehicle_registration",
            InboundKind::VehicleTypes { .. } => "vehicle_types",
            InboundKind::Routes { .. } => "routes",
            InboundKind::SignalTopology { .. } => "signal_topology",
            InboundKind::SignalStates { .. } => "signal_states",
            InboundKind::SensorActivation { .. } => "sensor_activation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSignalState {
    pub group_id: GroupId,
    pub states: Vec<FineIndication>,
}

/// Single lidar return, host frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarPoint {
    pub position: Location,
    pub hit: bool,
}

/// Lidar sweep re-expressed for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarFrame {
    /// Row-major sensor orientation
    pub rotation: [[f64; 3]; 3],
    /// Sensor origin
    pub reference: Location,
    pub points: Vec<LidarPoint>,
    pub timestamp: SimTime,
    pub min_range: f64,
    pub max_range: f64,
}

/// Sensor payload attached to one vehicle update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSensorUpdate {
    pub vehicle_id: VehicleId,
    pub lidar: LidarFrame,
}

/// Event the bridge publishes to the host runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub time: SimTime,
    #[serde(flatten)]
    pub kind: OutboundKind,
}

impl OutboundEvent {
    pub fn new(time: SimTime, kind: OutboundKind) -> Self {
        Self { time, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundKind {
    /// Batched updates of remote-controlled vehicles
    VehicleUpdates {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        updated: Vec<VehicleState>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        removed: Vec<VehicleId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sensor_updates: Vec<VehicleSensorUpdate>,
    },
    RouteRegistration { route: VehicleRoute },
    VehicleRegistration {
        vehicle_id: VehicleId,
        group: String,
        route_id: String,
        vehicle_type: VehicleType,
    },
    /// Declares a vehicle as moved by this federate
    FederateAssignment {
        vehicle_id: VehicleId,
        federate_id: String,
        radius_m: f64,
    },
    SignalSubscription { group_id: GroupId },
    SignalStateChange {
        group_id: GroupId,
        states: Vec<FineIndication>,
    },
    TimeAdvanceRequest { requested: SimTime },
}

impl OutboundKind {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundKind::VehicleUpdates { .. } => "vehicle_updates",
            OutboundKind::RouteRegistration { .. } => "route_registration",
            OutboundKind::VehicleRegistration { .. } => "vehicle_registration",
            OutboundKind::FederateAssignment { .. } => "federate_assignment",
            OutboundKind::SignalSubscription { .. } => "signal_subscription",
            OutboundKind::SignalStateChange { .. } => "signal_state_change",
            OutboundKind::TimeAdvanceRequest { .. } => "time_advance_request",
        }
    }
}
