//! Remote descriptors built from registry data, and host data built from step results

use std::collections::BTreeMap;

use contracts::{
    DescriptorRotation, DriveDirection, Location, MoveRequest, SensorDescriptor, SensorKind,
    SpawnRequest, VehicleDescriptor, VehicleId, VehicleRecord, VehicleState, VehicleType,
    DEFAULT_VEHICLE_COLOR,
};

use crate::projection::LocalProjection;
use crate::signals::{decode_signals, encode_signals};
use crate::vehicle_class::{class_from_remote, class_to_remote};

/// Decimal string with at least one fractional digit ("4.5", "2.0")
fn decimal(value: f64) -> String {
    format!("{value:?}")
}

/// Host vehicle state + type -> remote descriptor
pub fn vehicle_descriptor(state: &VehicleState, vehicle_type: &VehicleType) -> VehicleDescriptor {
    build_descriptor(
        &state.id,
        vehicle_type,
        state.position.cartesian,
        DescriptorRotation {
            slope: state.slope,
            heading: state.heading,
        },
        encode_signals(&state.signals),
    )
}

/// Descriptor of an already registered vehicle, e.g. for removal
pub fn record_descriptor(record: &VehicleRecord) -> VehicleDescriptor {
    build_descriptor(
        &record.id,
        &record.vehicle_type,
        record.position.cartesian,
        DescriptorRotation {
            slope: record.slope,
            heading: record.heading,
        },
        record.signals_mask,
    )
}

fn build_descriptor(
    id: &VehicleId,
    vehicle_type: &VehicleType,
    location: Location,
    rotation: DescriptorRotation,
    signals: u32,
) -> VehicleDescriptor {
    VehicleDescriptor {
        id: id.clone(),
        type_id: vehicle_type.name.clone(),
        class_id: class_to_remote(vehicle_type.vehicle_class).to_string(),
        length: decimal(vehicle_type.length),
        width: decimal(vehicle_type.width),
        height: decimal(vehicle_type.height),
        color: vehicle_type
            .color
            .clone()
            .unwrap_or_else(|| DEFAULT_VEHICLE_COLOR.to_string()),
        location,
        rotation,
        signals,
    }
}

/// Type synthesized for a remote spawn whose type the host never announced
pub fn vehicle_type_from_spawn(spawn: &SpawnRequest) -> VehicleType {
    VehicleType {
        name: spawn.type_id.clone(),
        length: spawn.length,
        width: spawn.width,
        height: spawn.height,
        vehicle_class: class_from_remote(&spawn.class_id),
        color: spawn.color.clone(),
    }
}

/// Remote move -> host vehicle state, in both position representations
pub fn vehicle_state_from_move(mv: &MoveRequest, projection: &LocalProjection) -> VehicleState {
    let signals = decode_signals(mv.signals);
    VehicleState {
        id: mv.actor_id.clone(),
        position: projection.position(mv.location),
        heading: mv.yaw,
        slope: mv.slope,
        direction: if signals.reverse_drive {
            DriveDirection::Backward
        } else {
            DriveDirection::Forward
        },
        signals,
    }
}

/// Sensor request; `id` is the vehicle id on spawn and the sensor id on removal
pub fn sensor_descriptor(
    id: &str,
    vehicle_id: &VehicleId,
    kind: SensorKind,
    attributes: BTreeMap<String, String>,
) -> SensorDescriptor {
    SensorDescriptor {
        id: id.to_string(),
        type_id: kind.type_id().to_string(),
        attached_vehicle_id: vehicle_id.clone(),
        attributes,
    }
}
