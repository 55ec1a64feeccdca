//! Host trace replay
//!
//! A trace is a recorded host session, one JSON object per line: either an
//! inbound event (see [`InboundEvent`]) or a time-advance grant
//! `{"grant": <ns>}`. Blank lines and lines starting with `#` are skipped.

use std::sync::Arc;

use contracts::{HostRuntime, InboundEvent, SimTime};
use coordinator::{BridgeState, Coordinator, GrantOutcome};
use observability::{BridgeMetricsAggregator, BridgeSummary};
use remote_link::RemoteSimulator;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::HostAdapterError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceEntry {
    Grant { grant: SimTime },
    Event(InboundEvent),
}

impl TraceEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            TraceEntry::Grant { .. } => "grant",
            TraceEntry::Event(event) => event.kind.name(),
        }
    }
}

/// Parse a whole trace file
///
/// # Errors
/// `HostAdapterError::Trace` naming the first bad line (1-based).
pub fn parse_trace(content: &str) -> Result<Vec<TraceEntry>, HostAdapterError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| HostAdapterError::trace(idx + 1, e.to_string()))
        })
        .collect()
}

/// What a trace run did
#[derive(Debug, Clone)]
pub struct TraceSummary {
    pub entries: usize,
    pub events_submitted: usize,
    pub grants: usize,
    /// Stopped early by the shutdown signal
    pub interrupted: bool,
    pub metrics: BridgeSummary,
}

/// Feeds a recorded trace into a coordinator
pub struct TraceDriver<S: RemoteSimulator, H: HostRuntime> {
    coordinator: Arc<Coordinator<S, H>>,
    start_time: SimTime,
    aggregator: BridgeMetricsAggregator,
}

impl<S: RemoteSimulator, H: HostRuntime> TraceDriver<S, H> {
    pub fn new(coordinator: Arc<Coordinator<S, H>>) -> Self {
        Self {
            coordinator,
            start_time: 0,
            aggregator: BridgeMetricsAggregator::new(),
        }
    }

    /// Simulation time of the first requested advance (default 0)
    pub fn with_start_time(mut self, start_time: SimTime) -> Self {
        self.start_time = start_time;
        self
    }

    /// Replay `entries` in order
    ///
    /// Initializes the coordinator if it has not been yet. Checks `shutdown`
    /// between entries, so a grant in progress always completes. The
    /// coordinator is left running; shutting it down is up to the caller.
    ///
    /// # Errors
    /// The first coordinator error; the coordinator is `Failed` by then.
    #[instrument(name = "trace_driver_run", skip(self, entries, shutdown), fields(entries = entries.len()))]
    pub async fn run(
        mut self,
        entries: Vec<TraceEntry>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<TraceSummary, HostAdapterError> {
        if self.coordinator.state().await == BridgeState::Created {
            self.coordinator.initialize(self.start_time).await?;
        }

        let total = entries.len();
        let mut events_submitted = 0;
        let mut grants = 0;
        let mut interrupted = false;

        for (idx, entry) in entries.into_iter().enumerate() {
            if *shutdown.borrow() {
                warn!(
                    processed = idx,
                    remaining = total - idx,
                    "shutdown requested, stopping trace replay"
                );
                interrupted = true;
                break;
            }
            observability::record_trace_entry(entry.kind());

            match entry {
                TraceEntry::Event(event) => {
                    self.coordinator.submit(event)?;
                    events_submitted += 1;
                }
                TraceEntry::Grant { grant } => {
                    grants += 1;
                    self.apply_grant(grant).await?;
                }
            }
        }

        let metrics = self.aggregator.summary();
        info!(
            events_submitted,
            grants,
            steps = metrics.total_steps,
            interrupted,
            "trace replay finished"
        );
        Ok(TraceSummary {
            entries: total,
            events_submitted,
            grants,
            interrupted,
            metrics,
        })
    }

    async fn apply_grant(&mut self, granted: SimTime) -> Result<(), HostAdapterError> {
        match self.coordinator.grant(granted).await? {
            GrantOutcome::Stepped(report) => {
                observability::record_step_report(&report);
                self.aggregator.update(&report);
                debug!(granted, next_step = report.next_step, "grant stepped");
            }
            GrantOutcome::Idle {
                granted,
                events_replayed,
            } => {
                observability::record_idle_grant(granted, events_replayed);
                self.aggregator.update_idle(events_replayed);
                debug!(granted, events_replayed, "grant idle");
            }
        }
        Ok(())
    }
}
