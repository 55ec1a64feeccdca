//! Dispatch of one remote step's results to the host

use contracts::{
    CoarseIndication, ControllingSide, FineIndication, GroupId, HostRuntime, OutboundKind,
    SignalManager, SignalUpdate, SimTime, StepReport, StepResult, VehicleRoute,
};
use remote_link::RemoteSimulator;
use tracing::{debug, instrument, trace, warn};
use translator::{code_to_coarse, encode_signals, vehicle_state_from_move, vehicle_type_from_spawn};

use crate::engine::CoordinatorCore;
use crate::error::Result;

fn record_skip(reason: &'static str) {
    metrics::counter!("bridge_items_skipped_total", "reason" => reason).increment(1);
}

impl<S: RemoteSimulator, H: HostRuntime> CoordinatorCore<S, H> {
    /// Spawns and vehicle updates are stamped with `granted`, signal and sensor
    /// output with `next`.
    #[instrument(
        name = "coordinator_dispatch",
        skip(self, step, report),
        fields(
            spawns = step.spawn_requests.len(),
            moves = step.move_requests.len(),
            destroys = step.destroy_requests.len(),
        )
    )]
    pub(crate) async fn dispatch_step(
        &mut self,
        step: StepResult,
        granted: SimTime,
        next: SimTime,
        report: &mut StepReport,
    ) -> Result<()> {
        let StepResult {
            spawn_requests,
            destroy_requests,
            move_requests,
            signal_updates,
            sensor_frames,
        } = step;

        // ===== spawns =====
        for spawn in spawn_requests {
            if self.registry.vehicle(&spawn.actor_id).is_some() {
                debug!(vehicle_id = %spawn.actor_id, "spawn of known vehicle skipped");
                record_skip("known_vehicle");
                continue;
            }
            // placeholder route needs one edge
            let Some(edge) = self.registry.spawn_edge().map(str::to_string) else {
                warn!(vehicle_id = %spawn.actor_id, "no spawn edge known yet, spawn skipped");
                record_skip("no_spawn_edge");
                continue;
            };

            let vehicle_type = match self.registry.vehicle_type(&spawn.type_id) {
                Some(vehicle_type) => vehicle_type,
                None => {
                    debug!(type_id = %spawn.type_id, "synthesizing vehicle type from spawn");
                    self.registry.register_type(vehicle_type_from_spawn(&spawn))
                }
            };

            self.emit(
                granted,
                OutboundKind::RouteRegistration {
                    route: VehicleRoute {
                        id: spawn.route.clone(),
                        edges: vec![edge],
                    },
                },
            )
            .await?;
            self.emit(
                granted,
                OutboundKind::VehicleRegistration {
                    vehicle_id: spawn.actor_id.clone(),
                    group: self.config.vehicle_group.clone(),
                    route_id: spawn.route.clone(),
                    vehicle_type: (*vehicle_type).clone(),
                },
            )
            .await?;
            self.emit(
                granted,
                OutboundKind::FederateAssignment {
                    vehicle_id: spawn.actor_id.clone(),
                    federate_id: self.config.federate_id.clone(),
                    radius_m: self.config.federate_assignment_radius_m,
                },
            )
            .await?;

            self.registry
                .insert_vehicle(spawn.actor_id.clone(), vehicle_type, ControllingSide::Remote);
            report.vehicles_spawned += 1;
            metrics::counter!("bridge_vehicles_total", "change" => "spawned").increment(1);
        }

        // ===== moves / destroys =====
        let mut updated = Vec::with_capacity(move_requests.len());
        for mv in &move_requests {
            let Some(record) = self.registry.vehicle_mut(&mv.actor_id) else {
                debug!(vehicle_id = %mv.actor_id, "move of unknown vehicle skipped");
                record_skip("unknown_vehicle");
                continue;
            };
            if record.controlled_by != ControllingSide::Remote {
                warn!(vehicle_id = %mv.actor_id, "remote move for host-controlled vehicle skipped");
                record_skip("host_controlled");
                continue;
            }

            let state = vehicle_state_from_move(mv, &self.projection);
            record.position = state.position;
            record.heading = state.heading;
            record.slope = state.slope;
            record.signals_mask = encode_signals(&state.signals);
            updated.push(state);
        }

        let mut removed = Vec::with_capacity(destroy_requests.len());
        for destroy in destroy_requests {
            match self.registry.vehicle(&destroy.actor_id).map(|r| r.controlled_by) {
                None => {
                    debug!(vehicle_id = %destroy.actor_id, "destroy of unknown vehicle skipped");
                    record_skip("unknown_vehicle");
                    continue;
                }
                Some(ControllingSide::Host) => {
                    warn!(vehicle_id = %destroy.actor_id, "remote destroy for host-controlled vehicle skipped");
                    record_skip("host_controlled");
                    continue;
                }
                Some(ControllingSide::Remote) => {}
            }
            self.registry.remove_vehicle(&destroy.actor_id);
            self.registry.unbind_vehicle(&destroy.actor_id);
            removed.push(destroy.actor_id);
        }

        report.vehicles_moved = updated.len();
        report.vehicles_removed = removed.len();
        metrics::counter!("bridge_vehicles_total", "change" => "moved")
            .increment(updated.len() as u64);
        metrics::counter!("bridge_vehicles_total", "change" => "removed")
            .increment(removed.len() as u64);
        if !updated.is_empty() || !removed.is_empty() {
            self.emit(
                granted,
                OutboundKind::VehicleUpdates {
                    updated,
                    removed,
                    sensor_updates: Vec::new(),
                },
            )
            .await?;
        }

        // ===== signals =====
        if !signal_updates.is_empty() {
            report.signal_changes = self.publish_remote_signals(&signal_updates, next).await?;
        }

        // ===== sensor frames =====
        for frame in &sensor_frames {
            let registry = &self.registry;
            let relayed = self
                .relay
                .relay(frame, |id| registry.vehicle_for_sensor(id), next);
            match relayed {
                Some(update) => {
                    report.sensor_frames_relayed += 1;
                    self.emit(
                        next,
                        OutboundKind::VehicleUpdates {
                            updated: Vec::new(),
                            removed: Vec::new(),
                            sensor_updates: vec![update],
                        },
                    )
                    .await?;
                }
                None => report.sensor_frames_dropped += 1,
            }
        }
        metrics::counter!("bridge_sensor_frames_total", "outcome" => "relayed")
            .increment(report.sensor_frames_relayed as u64);
        metrics::counter!("bridge_sensor_frames_total", "outcome" => "dropped")
            .increment(report.sensor_frames_dropped as u64);

        Ok(())
    }

    /// Remote is manager of record: expand codes and publish per group
    ///
    /// Returns the number of groups published.
    async fn publish_remote_signals(
        &mut self,
        updates: &[SignalUpdate],
        next: SimTime,
    ) -> Result<usize> {
        if self.config.signal_manager != SignalManager::Remote {
            trace!(updates = updates.len(), "remote signal updates ignored, host manages signals");
            return Ok(0);
        }

        let mut affected: Vec<GroupId> = Vec::new();
        for update in updates {
            let coarse = code_to_coarse(&update.state).unwrap_or_else(|| {
                warn!(
                    installation_id = %update.installation_id,
                    code = %update.state,
                    "unknown signal code, treating as off"
                );
                CoarseIndication::Off
            });
            let Some(group_id) = self.registry.group_of(&update.installation_id).cloned() else {
                debug!(installation_id = %update.installation_id, "update for unmatched installation skipped");
                record_skip("unmatched_installation");
                continue;
            };
            let Some(installation) = self
                .registry
                .installations_mut()
                .get_mut(&update.installation_id)
            else {
                continue;
            };
            installation.apply_coarse(coarse, &self.reducer);
            if !affected.contains(&group_id) {
                affected.push(group_id);
            }
        }

        let mut published = 0;
        for group_id in affected {
            let Some(assignment) = self.registry.assignment(&group_id) else {
                continue;
            };
            let states: Vec<FineIndication> = assignment
                .installations
                .iter()
                .filter_map(|id| self.registry.installations().get(id))
                .flat_map(|installation| installation.fine_state().iter().copied())
                .collect();
            self.emit(next, OutboundKind::SignalStateChange { group_id, states })
                .await?;
            metrics::counter!("bridge_signal_updates_total", "direction" => "to_host").increment(1);
            published += 1;
        }
        Ok(published)
    }
}
