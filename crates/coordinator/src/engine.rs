//! Time-Advance Coordinator
//!
//! Explicit state machine driven by the host adapter:
//!
//! ```text
//! Created --initialize--> Running --grant*--> Running
//!    |                       |  \--fatal error--> Failed
//!    \--------shutdown-------+------shutdown----> Stopped
//! ```
//!
//! All mutable bridge state lives in [`CoordinatorCore`] behind one async
//! mutex that is held for the whole replay-then-step sequence. Inbound events
//! bypass the lock through the [`EventIntake`].

use std::sync::Arc;
use std::time::Instant;

use contracts::{
    BridgeConfig, HostRuntime, InboundEvent, InstallationSpec, OutboundEvent, OutboundKind,
    SimTime, StepReport,
};
use remote_link::{RemoteLink, RemoteSimulator};
use signal_sync::{ApproachOrdering, InstallationTable, StateReducer, TopologyMatcher};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use translator::{LocalProjection, SensorRelay};

use crate::error::{CoordinatorError, Result};
use crate::intake::{EventBuffer, EventIntake};
use crate::registry::EntityRegistry;

/// Lifecycle state of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Built, remote not connected yet
    Created,
    Running,
    /// Shut down on request
    Stopped,
    /// A fatal error ended participation in the run
    Failed,
}

impl BridgeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeState::Created => "created",
            BridgeState::Running => "running",
            BridgeState::Stopped => "stopped",
            BridgeState::Failed => "failed",
        }
    }
}

/// Result of one time-advance grant
#[derive(Debug, Clone, PartialEq)]
pub enum GrantOutcome {
    /// Grant earlier than the scheduled next step: events replayed, no step
    Idle {
        granted: SimTime,
        events_replayed: usize,
    },
    Stepped(StepReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Events queued but never replayed
    pub discarded_events: usize,
    pub steps_executed: u64,
}

pub(crate) struct CoordinatorCore<S: RemoteSimulator, H: HostRuntime> {
    pub(crate) config: BridgeConfig,
    pub(crate) state: BridgeState,
    pub(crate) next_step: SimTime,
    pub(crate) buffer: EventBuffer,
    pub(crate) registry: EntityRegistry,
    pub(crate) remote: RemoteLink<S>,
    pub(crate) host: H,
    pub(crate) reducer: StateReducer,
    pub(crate) matcher: TopologyMatcher,
    pub(crate) relay: SensorRelay,
    pub(crate) projection: LocalProjection,
    pub(crate) steps_executed: u64,
}

/// The bridge's protocol engine
pub struct Coordinator<S: RemoteSimulator, H: HostRuntime> {
    intake: EventIntake,
    core: Mutex<CoordinatorCore<S, H>>,
}

impl<S: RemoteSimulator, H: HostRuntime> Coordinator<S, H> {
    /// `installations` is the remote static topology; empty disables signal sync
    pub fn new(
        config: BridgeConfig,
        simulator: S,
        host: H,
        installations: Vec<InstallationSpec>,
    ) -> Self {
        let (intake, buffer) = EventBuffer::channel();
        let core = CoordinatorCore {
            remote: RemoteLink::new(simulator, &config.remote),
            reducer: StateReducer::new(config.reduction_policy),
            matcher: TopologyMatcher::new(config.match_radius_m),
            projection: LocalProjection::new(config.geo_origin),
            relay: SensorRelay::new(),
            registry: EntityRegistry::new(InstallationTable::new(installations)),
            state: BridgeState::Created,
            next_step: 0,
            steps_executed: 0,
            buffer,
            host,
            config,
        };
        Self {
            intake,
            core: Mutex::new(core),
        }
    }

    /// Replace the clockwise approach ordering used by topology matching
    pub fn with_approach_ordering(mut self, ordering: Arc<dyn ApproachOrdering>) -> Self {
        let core = self.core.get_mut();
        core.matcher = TopologyMatcher::with_ordering(core.config.match_radius_m, ordering);
        self
    }

    /// Handle for submitting events from other tasks or threads
    pub fn intake(&self) -> EventIntake {
        self.intake.clone()
    }

    /// Queue an inbound event until the next grant; never blocks
    pub fn submit(&self, event: InboundEvent) -> Result<()> {
        self.intake.submit(event)
    }

    pub async fn state(&self) -> BridgeState {
        self.core.lock().await.state
    }

    /// Time of the next scheduled remote step
    pub async fn next_step(&self) -> SimTime {
        self.core.lock().await.next_step
    }

    /// Read access to the registry, under the coordinator lock
    pub async fn inspect<R>(&self, f: impl FnOnce(&EntityRegistry) -> R) -> R {
        f(&self.core.lock().await.registry)
    }

    /// Connect the remote and request the first time advance at `start_time`
    #[instrument(name = "coordinator_initialize", skip(self))]
    pub async fn initialize(&self, start_time: SimTime) -> Result<()> {
        let mut core = self.core.lock().await;
        if core.state != BridgeState::Created {
            return Err(CoordinatorError::invalid_state(
                "initialize",
                core.state.as_str(),
            ));
        }
        let result = core.start(start_time).await;
        if let Err(err) = &result {
            core.fail(err);
        }
        result
    }

    /// Replay buffered events, then run at most one remote step
    ///
    /// # Errors
    /// Every error is fatal: the coordinator moves to `Failed` and refuses
    /// further grants.
    #[instrument(name = "coordinator_grant", skip(self), fields(queued = self.intake.pending()))]
    pub async fn grant(&self, granted: SimTime) -> Result<GrantOutcome> {
        let mut core = self.core.lock().await;
        if core.state != BridgeState::Running {
            return Err(CoordinatorError::invalid_state("grant", core.state.as_str()));
        }
        let result = core.advance(granted).await;
        match &result {
            Ok(GrantOutcome::Idle { .. }) => {
                metrics::counter!("bridge_grants_total", "outcome" => "idle").increment(1)
            }
            Ok(GrantOutcome::Stepped(_)) => {
                metrics::counter!("bridge_grants_total", "outcome" => "stepped").increment(1)
            }
            Err(err) => core.fail(err),
        }
        result
    }

    /// Discard queued events, close the intake, the remote link and the host
    ///
    /// Repeated calls are no-ops.
    #[instrument(name = "coordinator_shutdown", skip(self))]
    pub async fn shutdown(&self) -> Result<ShutdownReport> {
        let mut core = self.core.lock().await;
        if core.state == BridgeState::Stopped {
            return Ok(ShutdownReport {
                discarded_events: 0,
                steps_executed: core.steps_executed,
            });
        }

        let discarded_events = core.buffer.close();
        if discarded_events > 0 {
            warn!(discarded_events, "discarding events queued at shutdown");
            metrics::counter!("bridge_events_discarded_total").increment(discarded_events as u64);
        }
        if core.state != BridgeState::Failed {
            core.state = BridgeState::Stopped;
        }

        let remote_result = core.remote.shutdown().await;
        let host_result = core.host.close().await;
        info!(
            steps_executed = core.steps_executed,
            discarded_events, "coordinator shut down"
        );
        remote_result?;
        host_result.map_err(CoordinatorError::HostEmit)?;

        Ok(ShutdownReport {
            discarded_events,
            steps_executed: core.steps_executed,
        })
    }
}

impl<S: RemoteSimulator, H: HostRuntime> CoordinatorCore<S, H> {
    async fn start(&mut self, start_time: SimTime) -> Result<()> {
        self.remote.connect().await?;
        self.next_step = start_time;
        self.state = BridgeState::Running;
        self.emit(
            start_time,
            OutboundKind::TimeAdvanceRequest {
                requested: start_time,
            },
        )
        .await?;
        info!(
            start_time,
            step_interval = self.config.step_interval(),
            installations = self.registry.installations().len(),
            signal_manager = ?self.config.signal_manager,
            "coordinator running"
        );
        Ok(())
    }

    async fn advance(&mut self, granted: SimTime) -> Result<GrantOutcome> {
        let events = self.buffer.drain();
        let (events_replayed, events_ignored) = self.replay(events, granted).await?;

        if granted < self.next_step {
            debug!(
                granted,
                next_step = self.next_step,
                "grant before scheduled step, not stepping"
            );
            return Ok(GrantOutcome::Idle {
                granted,
                events_replayed,
            });
        }

        let interval = self.config.step_interval();
        let next = self
            .next_step
            .checked_add(interval)
            .ok_or(CoordinatorError::ClockOverflow {
                next_step: self.next_step,
                interval,
            })?;
        let started = Instant::now();
        let step = self.remote.step().await?;
        let step_duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut report = StepReport {
            granted,
            next_step: next,
            events_replayed,
            events_ignored,
            step_duration_ms,
            ..Default::default()
        };
        self.dispatch_step(step, granted, next, &mut report).await?;

        self.next_step = next;
        self.steps_executed += 1;
        self.emit(next, OutboundKind::TimeAdvanceRequest { requested: next })
            .await?;
        debug!(
            granted,
            next_step = next,
            spawned = report.vehicles_spawned,
            moved = report.vehicles_moved,
            removed = report.vehicles_removed,
            "step completed"
        );
        Ok(GrantOutcome::Stepped(report))
    }

    pub(crate) async fn emit(&mut self, time: SimTime, kind: OutboundKind) -> Result<()> {
        let name = kind.name();
        self.host
            .emit(OutboundEvent::new(time, kind))
            .await
            .map_err(CoordinatorError::HostEmit)?;
        metrics::counter!("bridge_events_emitted_total", "kind" => name).increment(1);
        Ok(())
    }

    fn fail(&mut self, err: &CoordinatorError) {
        self.state = BridgeState::Failed;
        metrics::counter!("bridge_fatal_errors_total", "kind" => err.kind()).increment(1);
        error!(error = %err, kind = err.kind(), "fatal coordinator error, leaving the run");
    }
}
