//! RemoteLink: the bridge's single handle on the remote simulator

use std::time::{Duration, Instant};

use contracts::{
    InstallationId, RemoteEndpointConfig, SensorDescriptor, SensorId, StepResult,
    VehicleDescriptor,
};
use tracing::{debug, info, instrument, warn};

use crate::client::RemoteSimulator;
use crate::error::{RemoteError, Result};

/// Wraps a [`RemoteSimulator`] with the bridge's call policy
///
/// - step results are validated before they are handed out
/// - an optional step timeout turns a stalled remote into an error
/// - shutdown waits at most the grace period for the channel to close
pub struct RemoteLink<S: RemoteSimulator> {
    simulator: S,
    target: String,
    step_timeout: Option<Duration>,
    shutdown_grace: Duration,
    connected: bool,
}

impl<S: RemoteSimulator> RemoteLink<S> {
    pub fn new(simulator: S, config: &RemoteEndpointConfig) -> Self {
        Self {
            simulator,
            target: config.target(),
            step_timeout: config.step_timeout_ms.map(Duration::from_millis),
            shutdown_grace: Duration::from_millis(config.shutdown_grace_ms),
            connected: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[instrument(name = "remote_link_connect", skip(self), fields(target = %self.target))]
    pub async fn connect(&mut self) -> Result<()> {
        self.simulator.connect(&self.target).await?;
        self.connected = true;
        info!("connected to remote simulator");
        Ok(())
    }

    /// One remote step, validated
    ///
    /// # Errors
    /// Remote failure, timeout, or a structurally malformed result.
    #[instrument(name = "remote_link_step", skip(self))]
    pub async fn step(&self) -> Result<StepResult> {
        self.ensure_connected()?;
        let started = Instant::now();

        let outcome = match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.simulator.step()).await {
                Ok(result) => result,
                Err(_) => Err(RemoteError::StepTimeout {
                    timeout_ms: limit.as_millis() as u64,
                }),
            },
            None => self.simulator.step().await,
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("remote_step_duration_ms").record(elapsed_ms);
        record_call("step", outcome.is_ok());

        let step = outcome?;
        step.validate()?;
        debug!(
            spawns = step.spawn_requests.len(),
            moves = step.move_requests.len(),
            destroys = step.destroy_requests.len(),
            signals = step.signal_updates.len(),
            sensor_frames = step.sensor_frames.len(),
            elapsed_ms,
            "remote step completed"
        );
        Ok(step)
    }

    #[instrument(name = "remote_link_add_vehicle", skip(self, vehicle), fields(vehicle_id = %vehicle.id))]
    pub async fn add_vehicle(&self, vehicle: &VehicleDescriptor) -> Result<()> {
        self.ensure_connected()?;
        let result = self.simulator.add_vehicle(vehicle).await;
        record_call("add_vehicle", result.is_ok());
        result
    }

    pub async fn update_vehicle(&self, vehicle: &VehicleDescriptor) -> Result<()> {
        self.ensure_connected()?;
        let result = self.simulator.update_vehicle(vehicle).await;
        record_call("update_vehicle", result.is_ok());
        result
    }

    #[instrument(name = "remote_link_remove_vehicle", skip(self, vehicle), fields(vehicle_id = %vehicle.id))]
    pub async fn remove_vehicle(&self, vehicle: &VehicleDescriptor) -> Result<()> {
        self.ensure_connected()?;
        let result = self.simulator.remove_vehicle(vehicle).await;
        record_call("remove_vehicle", result.is_ok());
        result
    }

    pub async fn update_signal(&self, installation_id: &InstallationId, state: &str) -> Result<()> {
        self.ensure_connected()?;
        let result = self.simulator.update_signal(installation_id, state).await;
        record_call("update_signal", result.is_ok());
        result
    }

    /// Spawn a sensor and return the id the remote assigned to it
    #[instrument(
        name = "remote_link_spawn_sensor",
        skip(self, sensor),
        fields(vehicle_id = %sensor.attached_vehicle_id, sensor_type = %sensor.type_id)
    )]
    pub async fn spawn_sensor(&self, sensor: &SensorDescriptor) -> Result<SensorId> {
        self.ensure_connected()?;
        let result = self.simulator.add_sensor(sensor).await;
        record_call("add_sensor", result.is_ok());
        result?
            .assigned_sensor_id()
            .ok_or_else(|| RemoteError::MissingSensorId {
                vehicle_id: sensor.attached_vehicle_id.to_string(),
            })
    }

    #[instrument(name = "remote_link_remove_sensor", skip(self, sensor), fields(sensor_id = %sensor.id))]
    pub async fn remove_sensor(&self, sensor: &SensorDescriptor) -> Result<()> {
        self.ensure_connected()?;
        let result = self.simulator.remove_sensor(sensor).await;
        record_call("remove_sensor", result.is_ok());
        result
    }

    /// Close the channel, giving in-flight calls the grace period to drain
    ///
    /// Expiry of the grace period is logged, not returned: the link is
    /// considered closed either way.
    #[instrument(name = "remote_link_shutdown", skip(self), fields(grace_ms = self.shutdown_grace.as_millis() as u64))]
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        match tokio::time::timeout(self.shutdown_grace, self.simulator.close()).await {
            Ok(result) => {
                info!("remote channel closed");
                result
            }
            Err(_) => {
                warn!("remote channel did not drain within grace period, forcing close");
                Ok(())
            }
        }
    }

    /// Underlying simulator, e.g. for inspection in tests
    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(RemoteError::NotConnected)
        }
    }
}

fn record_call(call: &'static str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!("remote_calls_total", "call" => call, "status" => status).increment(1);
}
