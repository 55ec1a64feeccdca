//! # Translator
//!
//! Stateless conversions between the host and remote data models.
//!
//! Responsibilities:
//! - vehicle class, signal code and light bitmask mappings
//! - Cartesian / geodetic projection
//! - remote descriptor building
//! - point cloud relay

pub mod descriptor;
pub mod indication;
pub mod projection;
pub mod sensor_relay;
pub mod signals;
pub mod vehicle_class;

pub use descriptor::{
    record_descriptor, sensor_descriptor, vehicle_descriptor, vehicle_state_from_move,
    vehicle_type_from_spawn,
};
pub use indication::{code_to_coarse, coarse_to_code};
pub use projection::LocalProjection;
pub use sensor_relay::SensorRelay;
pub use signals::{decode_signals, encode_signals};
pub use vehicle_class::{class_from_remote, class_to_remote, IGNORED_CLASS};
