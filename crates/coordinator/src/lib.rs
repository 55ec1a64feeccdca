//! # Coordinator
//!
//! Entity Registry and the Time-Advance Coordinator.
//!
//! Responsibilities:
//! - buffer inbound host events and replay them in arrival order on each grant
//! - drive at most one remote step per grant
//! - dispatch step results (spawns, moves, removals, signals, sensor frames) to the host
//! - request the next time advance

mod dispatch;
mod engine;
mod error;
mod intake;
mod registry;
mod replay;

pub use engine::{BridgeState, Coordinator, GrantOutcome, ShutdownReport};
pub use error::{CoordinatorError, Result};
pub use intake::EventIntake;
pub use registry::{EntityRegistry, SensorBinding};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex, PoisonError};

    use contracts::{
        BridgeConfig, ContractError, HostRuntime, InboundEvent, InboundKind, InstallationSpec,
        Location, OutboundEvent, SignalGroup, SignalIndication, VehicleClass, VehiclePosition,
        VehicleRoute, VehicleState, VehicleType,
    };
    use remote_link::MockRemoteSimulator;

    use crate::Coordinator;

    pub const SECOND: u64 = 1_000_000_000;

    /// Host that records every outbound event
    #[derive(Debug, Clone, Default)]
    pub struct RecordingHost {
        pub events: Arc<Mutex<Vec<OutboundEvent>>>,
        pub fail_emit: bool,
    }

    impl RecordingHost {
        pub fn take(&self) -> Vec<OutboundEvent> {
            std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }

    impl HostRuntime for RecordingHost {
        fn name(&self) -> &str {
            "recording"
        }

        async fn emit(&mut self, event: OutboundEvent) -> Result<(), ContractError> {
            if self.fail_emit {
                return Err(ContractError::host_emit("recording", "refused"));
            }
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    pub fn event(time: u64, kind: InboundKind) -> InboundEvent {
        InboundEvent {
            time,
            sender: "sumo".into(),
            kind,
        }
    }

    /// Route announcement whose last edge becomes the spawn edge `e1`
    pub fn routes_event(time: u64) -> InboundEvent {
        event(
            time,
            InboundKind::Routes {
                routes: vec![VehicleRoute {
                    id: "r0".into(),
                    edges: vec!["e1".into()],
                }],
            },
        )
    }

    pub fn car_type() -> VehicleType {
        VehicleType {
            name: "PKW".into(),
            length: 4.5,
            width: 1.8,
            height: 1.5,
            vehicle_class: VehicleClass::Car,
            color: None,
        }
    }

    pub fn state(id: &str, x: f64, y: f64) -> VehicleState {
        VehicleState {
            id: id.into(),
            position: VehiclePosition {
                cartesian: Location::new(x, y, 0.0),
                ..Default::default()
            },
            heading: 90.0,
            slope: 0.0,
            signals: Default::default(),
            direction: Default::default(),
        }
    }

    /// Four-way junction at the origin: one pole per approach
    pub fn junction_installations() -> Vec<InstallationSpec> {
        let cluster: Vec<_> = ["w", "n", "e", "s"].iter().map(|id| (*id).into()).collect();
        [
            ("w", -10.0, 0.0),
            ("n", 0.0, 10.0),
            ("e", 10.0, 0.0),
            ("s", 0.0, -10.0),
        ]
        .into_iter()
        .map(|(id, x, y)| InstallationSpec {
            id: id.into(),
            location: Location::new(x, y, 0.0),
            cluster: cluster.clone(),
        })
        .collect()
    }

    /// One indication per approach, anchored next to the west pole
    pub fn junction_group(group_id: &str) -> SignalGroup {
        let indication = |lane: &str, x: f64, y: f64| SignalIndication {
            incoming_lane: lane.into(),
            position: Location::new(x, y, 0.0),
        };
        SignalGroup {
            group_id: group_id.into(),
            indications: vec![
                indication("west_0", -9.0, 0.0),
                indication("north_0", 0.0, 9.0),
                indication("east_0", 9.0, 0.0),
                indication("south_0", 0.0, -9.0),
            ],
        }
    }

    pub fn coordinator(
        config: BridgeConfig,
        installations: Vec<InstallationSpec>,
    ) -> (
        Coordinator<MockRemoteSimulator, RecordingHost>,
        MockRemoteSimulator,
        RecordingHost,
    ) {
        let remote = MockRemoteSimulator::new();
        let host = RecordingHost::default();
        let coordinator = Coordinator::new(config, remote.clone(), host.clone(), installations);
        (coordinator, remote, host)
    }
}
