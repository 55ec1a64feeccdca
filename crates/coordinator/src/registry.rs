//! Entity Registry
//!
//! Every mutable map the bridge keeps about the co-simulation. Owned by the
//! coordinator core and only touched while its lock is held.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use contracts::{
    ControllingSide, GroupAssignment, GroupId, InstallationId, SensorId, SensorKind,
    SharedVehicleType, VehicleId, VehiclePosition, VehicleRecord, VehicleType,
};
use signal_sync::InstallationTable;

/// Sensor attached to a vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorBinding {
    pub vehicle_id: VehicleId,
    pub kind: SensorKind,
}

#[derive(Debug, Default)]
pub struct EntityRegistry {
    vehicle_types: HashMap<String, SharedVehicleType>,
    vehicles: HashMap<VehicleId, VehicleRecord>,
    installations: InstallationTable,
    assignments: BTreeMap<GroupId, GroupAssignment>,
    installation_groups: HashMap<InstallationId, GroupId>,
    sensors: BTreeMap<SensorId, SensorBinding>,
    /// Single-edge placeholder route used by remote spawns
    spawn_edge: Option<String>,
}

impl EntityRegistry {
    pub fn new(installations: InstallationTable) -> Self {
        Self {
            installations,
            ..Default::default()
        }
    }

    // ===== vehicle types =====

    /// Shared type for `vehicle_type.name`; the first registration of a name wins
    pub fn register_type(&mut self, vehicle_type: VehicleType) -> SharedVehicleType {
        self.vehicle_types
            .entry(vehicle_type.name.clone())
            .or_insert_with(|| Arc::new(vehicle_type))
            .clone()
    }

    pub fn vehicle_type(&self, name: &str) -> Option<SharedVehicleType> {
        self.vehicle_types.get(name).cloned()
    }

    pub fn type_count(&self) -> usize {
        self.vehicle_types.len()
    }

    // ===== vehicles =====

    /// Insert a new vehicle record; an existing record is left untouched
    ///
    /// Returns `false` when the id was already known.
    pub fn insert_vehicle(
        &mut self,
        id: VehicleId,
        vehicle_type: SharedVehicleType,
        controlled_by: ControllingSide,
    ) -> bool {
        if self.vehicles.contains_key(&id) {
            return false;
        }
        self.vehicles.insert(
            id.clone(),
            VehicleRecord {
                id,
                vehicle_type,
                position: VehiclePosition::default(),
                heading: 0.0,
                slope: 0.0,
                signals_mask: 0,
                controlled_by,
            },
        );
        true
    }

    pub fn vehicle(&self, id: &str) -> Option<&VehicleRecord> {
        self.vehicles.get(id)
    }

    pub fn vehicle_mut(&mut self, id: &str) -> Option<&mut VehicleRecord> {
        self.vehicles.get_mut(id)
    }

    pub fn remove_vehicle(&mut self, id: &str) -> Option<VehicleRecord> {
        self.vehicles.remove(id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn set_spawn_edge(&mut self, edge: &str) -> bool {
        if self.spawn_edge.is_some() {
            return false;
        }
        self.spawn_edge = Some(edge.to_string());
        true
    }

    pub fn spawn_edge(&self) -> Option<&str> {
        self.spawn_edge.as_deref()
    }

    // ===== signals =====

    pub fn installations(&self) -> &InstallationTable {
        &self.installations
    }

    pub fn installations_mut(&mut self) -> &mut InstallationTable {
        &mut self.installations
    }

    pub fn is_assigned(&self, group_id: &str) -> bool {
        self.assignments.contains_key(group_id)
    }

    pub fn add_assignment(&mut self, assignment: GroupAssignment) {
        for installation in &assignment.installations {
            self.installation_groups
                .insert(installation.clone(), assignment.group_id.clone());
        }
        self.assignments
            .insert(assignment.group_id.clone(), assignment);
    }

    pub fn assignment(&self, group_id: &str) -> Option<&GroupAssignment> {
        self.assignments.get(group_id)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &GroupAssignment> {
        self.assignments.values()
    }

    /// Group an installation was assigned to
    pub fn group_of(&self, installation_id: &str) -> Option<&GroupId> {
        self.installation_groups.get(installation_id)
    }

    // ===== sensors =====

    pub fn bind_sensor(&mut self, sensor_id: SensorId, vehicle_id: VehicleId, kind: SensorKind) {
        self.sensors
            .insert(sensor_id, SensorBinding { vehicle_id, kind });
    }

    pub fn vehicle_for_sensor(&self, sensor_id: &str) -> Option<VehicleId> {
        self.sensors.get(sensor_id).map(|b| b.vehicle_id.clone())
    }

    /// Drop every binding of a vehicle and return the removed sensors
    pub fn unbind_vehicle(&mut self, vehicle_id: &str) -> Vec<(SensorId, SensorBinding)> {
        let ids: Vec<SensorId> = self
            .sensors
            .iter()
            .filter(|(_, b)| b.vehicle_id == vehicle_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.into_iter()
            .filter_map(|id| self.sensors.remove(&id).map(|b| (id, b)))
            .collect()
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }
}
