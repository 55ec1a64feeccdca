//! Mock remote simulator
//!
//! Returns scripted step results and records every call. Failures can be injected.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{
    ContractError, InstallationId, SensorDescriptor, SensorId, StepResult, VehicleDescriptor,
    VehicleId, SENSOR_ID_ATTRIBUTE,
};
use tracing::instrument;

use crate::client::RemoteSimulator;
use crate::error::{RemoteError, Result};

/// Mock behaviour
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// Fail connect
    pub fail_connect: bool,
    /// Fail the N-th step (1-based)
    pub fail_step_at: Option<u64>,
    /// Artificial delay per step
    pub step_delay: Option<Duration>,
    /// Vehicles whose add/update fails
    pub fail_vehicles: Vec<VehicleId>,
    /// Fail sensor spawns
    pub fail_sensor_spawn: bool,
    /// Sensor spawn succeeds without a sensor_id
    pub omit_sensor_id: bool,
}

/// One recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Connect(String),
    Step,
    AddVehicle(VehicleDescriptor),
    UpdateVehicle(VehicleDescriptor),
    RemoveVehicle(VehicleId),
    UpdateSignal {
        installation_id: InstallationId,
        state: String,
    },
    AddSensor(SensorDescriptor),
    RemoveSensor(String),
    Close,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<StepResult>,
    calls: Vec<RemoteCall>,
    vehicles: BTreeMap<VehicleId, VehicleDescriptor>,
    sensors: BTreeMap<SensorId, SensorDescriptor>,
    signals: BTreeMap<InstallationId, String>,
}

#[derive(Debug)]
struct MockInner {
    config: MockConfig,
    connected: AtomicBool,
    steps_taken: AtomicU64,
    /// starts at 1000 to stand out in logs
    next_sensor_id: AtomicU32,
    state: Mutex<MockState>,
}

/// In-memory remote simulator
///
/// Clones share state, so a test can keep a handle while the coordinator owns
/// another.
#[derive(Debug, Clone)]
pub struct MockRemoteSimulator {
    inner: Arc<MockInner>,
}

impl MockRemoteSimulator {
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            inner: Arc::new(MockInner {
                config,
                connected: AtomicBool::new(false),
                steps_taken: AtomicU64::new(0),
                next_sensor_id: AtomicU32::new(1000),
                state: Mutex::new(MockState::default()),
            }),
        }
    }

    /// Queue results returned by upcoming steps; an empty script steps idle
    pub fn with_script(self, steps: impl IntoIterator<Item = StepResult>) -> Self {
        self.state().script.extend(steps);
        self
    }

    pub fn push_step(&self, step: StepResult) {
        self.state().script.push_back(step);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    pub fn steps_taken(&self) -> u64 {
        self.inner.steps_taken.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Host-driven vehicles currently known to the remote
    pub fn vehicle(&self, id: &str) -> Option<VehicleDescriptor> {
        self.state().vehicles.get(id).cloned()
    }

    pub fn vehicle_count(&self) -> usize {
        self.state().vehicles.len()
    }

    pub fn sensor_count(&self) -> usize {
        self.state().sensors.len()
    }

    /// Last state code pushed for an installation
    pub fn signal_state(&self, installation_id: &str) -> Option<String> {
        self.state().signals.get(installation_id).cloned()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: RemoteCall) {
        self.state().calls.push(call);
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(RemoteError::NotConnected)
        }
    }

    fn check_vehicle(&self, call: &'static str, vehicle: &VehicleDescriptor) -> Result<()> {
        self.ensure_connected()?;
        if self.inner.config.fail_vehicles.contains(&vehicle.id) {
            return Err(RemoteError::call_failed(
                call,
                format!("mock failure for vehicle {}", vehicle.id),
            ));
        }
        Ok(())
    }
}

impl Default for MockRemoteSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSimulator for MockRemoteSimulator {
    #[instrument(name = "mock_remote_connect", skip(self), fields(target = %target))]
    async fn connect(&mut self, target: &str) -> Result<()> {
        self.record(RemoteCall::Connect(target.to_string()));
        if self.inner.config.fail_connect {
            return Err(RemoteError::unreachable(target, "mock failure"));
        }
        self.inner.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[instrument(name = "mock_remote_step", skip(self))]
    async fn step(&self) -> Result<StepResult> {
        self.ensure_connected()?;
        self.record(RemoteCall::Step);
        let index = self.inner.steps_taken.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.inner.config.step_delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.config.fail_step_at == Some(index) {
            return Err(RemoteError::call_failed(
                "step",
                format!("mock failure at step {index}"),
            ));
        }
        Ok(self.state().script.pop_front().unwrap_or_default())
    }

    async fn add_vehicle(&self, vehicle: &VehicleDescriptor) -> Result<()> {
        self.check_vehicle("add_vehicle", vehicle)?;
        let mut state = self.state();
        state.calls.push(RemoteCall::AddVehicle(vehicle.clone()));
        state.vehicles.insert(vehicle.id.clone(), vehicle.clone());
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &VehicleDescriptor) -> Result<()> {
        self.check_vehicle("update_vehicle", vehicle)?;
        let mut state = self.state();
        state.calls.push(RemoteCall::UpdateVehicle(vehicle.clone()));
        state.vehicles.insert(vehicle.id.clone(), vehicle.clone());
        Ok(())
    }

    async fn remove_vehicle(&self, vehicle: &VehicleDescriptor) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state();
        state.calls.push(RemoteCall::RemoveVehicle(vehicle.id.clone()));
        // idempotent
        state.vehicles.remove(&vehicle.id);
        Ok(())
    }

    async fn update_signal(&self, installation_id: &InstallationId, state_code: &str) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state();
        state.calls.push(RemoteCall::UpdateSignal {
            installation_id: installation_id.clone(),
            state: state_code.to_string(),
        });
        state
            .signals
            .insert(installation_id.clone(), state_code.to_string());
        Ok(())
    }

    #[instrument(
        name = "mock_remote_add_sensor",
        skip(self, sensor),
        fields(vehicle_id = %sensor.attached_vehicle_id)
    )]
    async fn add_sensor(&self, sensor: &SensorDescriptor) -> Result<SensorDescriptor> {
        self.ensure_connected()?;
        self.record(RemoteCall::AddSensor(sensor.clone()));
        if self.inner.config.fail_sensor_spawn {
            return Err(RemoteError::call_failed("add_sensor", "mock failure"));
        }

        let mut answer = sensor.clone();
        if self.inner.config.omit_sensor_id {
            return Ok(answer);
        }
        let sensor_id = SensorId::from(
            self.inner
                .next_sensor_id
                .fetch_add(1, Ordering::SeqCst)
                .to_string(),
        );
        answer
            .attributes
            .insert(SENSOR_ID_ATTRIBUTE.to_string(), sensor_id.to_string());
        self.state().sensors.insert(sensor_id, answer.clone());
        Ok(answer)
    }

    async fn remove_sensor(&self, sensor: &SensorDescriptor) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state();
        state.calls.push(RemoteCall::RemoveSensor(sensor.id.clone()));
        state.sensors.remove(sensor.id.as_str());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.record(RemoteCall::Close);
        self.inner.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Parse a step script, one JSON `StepResult` per non-empty line
///
/// # Errors
/// `ContractError::ConfigParse` naming the offending line.
pub fn parse_script(content: &str) -> Result<Vec<StepResult>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<StepResult>(line).map_err(|e| {
                RemoteError::from(ContractError::config_parse(format!(
                    "step script line {}: {e}",
                    idx + 1
                )))
            })
        })
        .collect()
}
