//! Remote simulator abstraction
//!
//! One trait over the remote step protocol, implemented by RPC clients and by
//! [`MockRemoteSimulator`](crate::MockRemoteSimulator).

use std::future::Future;

use contracts::{InstallationId, SensorDescriptor, StepResult, VehicleDescriptor};

use crate::error::Result;

/// Remote step protocol, one blocking round trip per call
pub trait RemoteSimulator: Send + Sync {
    /// Open the channel to `target` (`host:port`)
    fn connect(&mut self, target: &str) -> impl Future<Output = Result<()>> + Send;

    /// Advance the remote simulation by one step
    fn step(&self) -> impl Future<Output = Result<StepResult>> + Send;

    fn add_vehicle(&self, vehicle: &VehicleDescriptor) -> impl Future<Output = Result<()>> + Send;

    fn update_vehicle(
        &self,
        vehicle: &VehicleDescriptor,
    ) -> impl Future<Output = Result<()>> + Send;

    fn remove_vehicle(
        &self,
        vehicle: &VehicleDescriptor,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `state` is a one-character code ("r", "y", "G", "0")
    fn update_signal(
        &self,
        installation_id: &InstallationId,
        state: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Spawn a sensor; the answer carries the assigned id under `"sensor_id"`
    fn add_sensor(
        &self,
        sensor: &SensorDescriptor,
    ) -> impl Future<Output = Result<SensorDescriptor>> + Send;

    fn remove_sensor(&self, sensor: &SensorDescriptor) -> impl Future<Output = Result<()>> + Send;

    /// Close the channel; pending calls may be dropped
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
