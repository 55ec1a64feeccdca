//! Replay of buffered host events at grant time

use std::collections::BTreeMap;

use contracts::{
    ControllingSide, GroupSignalState, HostRuntime, InboundEvent, InboundKind, OutboundKind,
    SensorKind, SignalGroup, SignalManager, SimTime, VehicleId, VehicleRoute, VehicleState,
    VehicleType,
};
use remote_link::{RemoteError, RemoteSimulator};
use tracing::{debug, error, info, instrument, warn};
use translator::{
    coarse_to_code, encode_signals, record_descriptor, sensor_descriptor, vehicle_descriptor,
};

use crate::engine::CoordinatorCore;
use crate::error::{CoordinatorError, Result};

fn record_skip(reason: &'static str) {
    metrics::counter!("bridge_items_skipped_total", "reason" => reason).increment(1);
}

impl<S: RemoteSimulator, H: HostRuntime> CoordinatorCore<S, H> {
    /// Apply events in arrival order; returns (replayed, ignored)
    #[instrument(name = "coordinator_replay", skip(self, events), fields(events = events.len()))]
    pub(crate) async fn replay(
        &mut self,
        events: Vec<InboundEvent>,
        granted: SimTime,
    ) -> Result<(usize, usize)> {
        let mut replayed = 0;
        let mut ignored = 0;

        for event in events {
            let kind = event.kind.name();
            if event.time > granted {
                metrics::counter!("bridge_ordering_violations_total").increment(1);
                error!(kind, event_time = event.time, granted, "event from the future");
                return Err(CoordinatorError::TemporalOrderingViolation {
                    kind,
                    event_time: event.time,
                    granted,
                });
            }
            if event.sender == self.config.federate_id {
                ignored += 1;
                continue;
            }

            replayed += 1;
            metrics::counter!("bridge_events_replayed_total", "kind" => kind).increment(1);
            match event.kind {
                InboundKind::VehicleUpdates {
                    added,
                    updated,
                    removed,
                } => self.on_vehicle_updates(added, updated, removed).await?,
                InboundKind::VehicleRegistration {
                    vehicle_id,
                    vehicle_type,
                } => self.on_vehicle_registration(vehicle_id, vehicle_type),
                InboundKind::VehicleTypes { types } => {
                    for vehicle_type in types {
                        self.registry.register_type(vehicle_type);
                    }
                }
                InboundKind::Routes { routes } => self.on_routes(&routes),
                InboundKind::SignalTopology { groups } => {
                    self.on_signal_topology(groups, granted).await?
                }
                InboundKind::SignalStates { groups } => self.on_signal_states(&groups).await?,
                InboundKind::SensorActivation {
                    vehicle_id,
                    sensor,
                    activate,
                } => {
                    if activate {
                        self.activate_sensor(vehicle_id, sensor).await?
                    } else {
                        self.deactivate_sensors(&vehicle_id).await?
                    }
                }
            }
        }

        Ok((replayed, ignored))
    }

    async fn on_vehicle_updates(
        &mut self,
        added: Vec<VehicleState>,
        updated: Vec<VehicleState>,
        removed: Vec<VehicleId>,
    ) -> Result<()> {
        for state in &added {
            self.push_host_vehicle(state, true).await?;
        }
        for state in &updated {
            self.push_host_vehicle(state, false).await?;
        }
        for vehicle_id in &removed {
            match self.registry.vehicle(vehicle_id).map(|r| r.controlled_by) {
                None => {
                    debug!(vehicle_id = %vehicle_id, "removal of unknown vehicle skipped");
                    record_skip("unknown_vehicle");
                    continue;
                }
                Some(ControllingSide::Remote) => {
                    warn!(vehicle_id = %vehicle_id, "host removal of remote-controlled vehicle skipped");
                    record_skip("remote_controlled");
                    continue;
                }
                Some(ControllingSide::Host) => {}
            }
            let Some(record) = self.registry.remove_vehicle(vehicle_id) else {
                continue;
            };
            self.remote
                .remove_vehicle(&record_descriptor(&record))
                .await?;
            let dropped = self.registry.unbind_vehicle(vehicle_id);
            if !dropped.is_empty() {
                debug!(vehicle_id = %vehicle_id, sensors = dropped.len(), "sensor bindings dropped with vehicle");
            }
        }
        Ok(())
    }

    /// Mirror one host-driven vehicle into the remote
    async fn push_host_vehicle(&mut self, state: &VehicleState, added: bool) -> Result<()> {
        let Some(record) = self.registry.vehicle_mut(&state.id) else {
            debug!(vehicle_id = %state.id, "update for unregistered vehicle skipped");
            record_skip("unregistered_vehicle");
            return Ok(());
        };
        if record.controlled_by == ControllingSide::Remote {
            warn!(vehicle_id = %state.id, "host update for remote-controlled vehicle skipped");
            record_skip("remote_controlled");
            return Ok(());
        }

        record.position = state.position;
        record.heading = state.heading;
        record.slope = state.slope;
        record.signals_mask = encode_signals(&state.signals);
        let descriptor = vehicle_descriptor(state, &record.vehicle_type);

        if added {
            self.remote.add_vehicle(&descriptor).await?;
        } else {
            self.remote.update_vehicle(&descriptor).await?;
        }
        Ok(())
    }

    fn on_vehicle_registration(&mut self, vehicle_id: VehicleId, vehicle_type: VehicleType) {
        let vehicle_type = self.registry.register_type(vehicle_type);
        if self
            .registry
            .insert_vehicle(vehicle_id.clone(), vehicle_type, ControllingSide::Host)
        {
            debug!(vehicle_id = %vehicle_id, "host vehicle registered");
        } else {
            debug!(vehicle_id = %vehicle_id, "vehicle already registered");
        }
    }

    fn on_routes(&mut self, routes: &[VehicleRoute]) {
        for route in routes {
            match route.last_edge() {
                Some(edge) => {
                    if self.registry.set_spawn_edge(edge) {
                        info!(route_id = %route.id, edge, "spawn edge selected");
                    }
                }
                None => warn!(route_id = %route.id, "route without edges"),
            }
        }
    }

    async fn on_signal_topology(&mut self, groups: Vec<SignalGroup>, granted: SimTime) -> Result<()> {
        if self.registry.installations().is_empty() {
            warn!(
                groups = groups.len(),
                "no static signal topology loaded, signal sync disabled"
            );
            return Ok(());
        }

        let fresh: Vec<SignalGroup> = groups
            .into_iter()
            .filter(|group| {
                let known = self.registry.is_assigned(&group.group_id);
                if known {
                    debug!(group_id = %group.group_id, "group already assigned, not re-matched");
                }
                !known
            })
            .collect();

        let report = self
            .matcher
            .match_all(&fresh, self.registry.installations_mut());
        for assignment in report.assignments {
            let group_id = assignment.group_id.clone();
            self.registry.add_assignment(assignment);
            self.emit(granted, OutboundKind::SignalSubscription { group_id })
                .await?;
        }
        Ok(())
    }

    /// Host is manager of record: reduce each installation's share and push it
    async fn on_signal_states(&mut self, groups: &[GroupSignalState]) -> Result<()> {
        if self.config.signal_manager != SignalManager::Host {
            debug!(groups = groups.len(), "host signal states ignored, remote manages signals");
            return Ok(());
        }

        for group in groups {
            let Some(assignment) = self.registry.assignment(&group.group_id).cloned() else {
                debug!(group_id = %group.group_id, "state for unmatched group skipped");
                record_skip("unmatched_group");
                continue;
            };

            let mut offset = 0;
            for installation_id in &assignment.installations {
                let Some(installation) = self
                    .registry
                    .installations_mut()
                    .get_mut(installation_id)
                else {
                    continue;
                };
                let end = (offset + installation.number_of_indications()).min(group.states.len());
                let coarse = installation.apply_fine(&group.states[offset..end], &self.reducer);
                offset = end;

                self.remote
                    .update_signal(installation_id, coarse_to_code(coarse))
                    .await?;
                metrics::counter!("bridge_signal_updates_total", "direction" => "to_remote")
                    .increment(1);
            }
            if offset != group.states.len() {
                warn!(
                    group_id = %group.group_id,
                    states = group.states.len(),
                    consumed = offset,
                    "group state length does not match its installations"
                );
            }
        }
        Ok(())
    }

    async fn activate_sensor(&mut self, vehicle_id: VehicleId, kind: SensorKind) -> Result<()> {
        let attributes = match kind {
            SensorKind::Lidar => self.config.lidar.to_attributes(),
        };
        let descriptor = sensor_descriptor(vehicle_id.as_str(), &vehicle_id, kind, attributes);

        match self.remote.spawn_sensor(&descriptor).await {
            Ok(sensor_id) => {
                info!(vehicle_id = %vehicle_id, sensor_id = %sensor_id, sensor = kind.type_id(), "sensor attached");
                self.registry.bind_sensor(sensor_id, vehicle_id, kind);
                Ok(())
            }
            Err(RemoteError::MissingSensorId { .. }) => {
                warn!(vehicle_id = %vehicle_id, "remote assigned no sensor id, sensor not bound");
                record_skip("missing_sensor_id");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn deactivate_sensors(&mut self, vehicle_id: &VehicleId) -> Result<()> {
        let bindings = self.registry.unbind_vehicle(vehicle_id);
        if bindings.is_empty() {
            debug!(vehicle_id = %vehicle_id, "no sensors to remove");
            return Ok(());
        }
        for (sensor_id, binding) in bindings {
            let descriptor = sensor_descriptor(
                sensor_id.as_str(),
                &binding.vehicle_id,
                binding.kind,
                BTreeMap::new(),
            );
            self.remote.remove_sensor(&descriptor).await?;
            info!(vehicle_id = %vehicle_id, sensor_id = %sensor_id, "sensor removed");
        }
        Ok(())
    }
}
