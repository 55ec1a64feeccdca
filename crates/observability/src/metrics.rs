//! Bridge metrics
//!
//! Records and aggregates coordinator metrics from the per-grant StepReport.

use std::collections::BTreeMap;

use contracts::{SimTime, StepReport};
use metrics::{counter, gauge, histogram};

/// Record metrics from a StepReport
///
/// Called after each grant that ran a remote step.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_step_report;
///
/// if let GrantOutcome::Stepped(report) = coordinator.grant(t).await? {
///     record_step_report(&report);
/// }
/// ```
pub fn record_step_report(report: &StepReport) {
    counter!("bridge_steps_total").increment(1);

    // simulation time (ns -> s)
    gauge!("bridge_sim_time_seconds").set(report.next_step as f64 / 1e9);

    histogram!("bridge_step_latency_ms").record(report.step_duration_ms);
    histogram!("bridge_events_per_grant").record(report.events_replayed as f64);

    gauge!("bridge_last_step_vehicles", "change" => "spawned").set(report.vehicles_spawned as f64);
    gauge!("bridge_last_step_vehicles", "change" => "moved").set(report.vehicles_moved as f64);
    gauge!("bridge_last_step_vehicles", "change" => "removed").set(report.vehicles_removed as f64);

    if report.sensor_frames_dropped > 0 {
        counter!("bridge_step_frames_dropped_total").increment(report.sensor_frames_dropped as u64);
    }
}

/// Record a grant that did not step
pub fn record_idle_grant(granted: SimTime, events_replayed: usize) {
    counter!("bridge_idle_grants_total").increment(1);
    gauge!("bridge_last_grant_seconds").set(granted as f64 / 1e9);
    histogram!("bridge_events_per_grant").record(events_replayed as f64);
}

/// Record an outbound event emission
pub fn record_host_emit(host_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "bridge_host_emits_total",
        "host" => host_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a trace line read
pub fn record_trace_entry(kind: &'static str) {
    counter!("bridge_trace_entries_total", "kind" => kind).increment(1);
}

/// In-memory aggregation of bridge metrics
///
/// Used for the run summary.
#[derive(Debug, Clone, Default)]
pub struct BridgeMetricsAggregator {
    /// Steps executed
    pub total_steps: u64,

    /// Grants that did not step
    pub idle_grants: u64,

    pub events_replayed: u64,

    /// Own events ignored on replay
    pub events_ignored: u64,

    /// Vehicle changes (spawned / moved / removed)
    pub vehicle_changes: BTreeMap<&'static str, u64>,

    pub signal_changes: u64,

    pub frames_relayed: u64,
    pub frames_dropped: u64,

    /// Remote step duration
    pub step_latency: RunningStats,

    /// Events replayed per grant
    pub events_per_grant: RunningStats,
}

impl BridgeMetricsAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one step report into the totals
    pub fn update(&mut self, report: &StepReport) {
        self.total_steps += 1;
        self.events_replayed += report.events_replayed as u64;
        self.events_ignored += report.events_ignored as u64;

        for (change, count) in [
            ("spawned", report.vehicles_spawned),
            ("moved", report.vehicles_moved),
            ("removed", report.vehicles_removed),
        ] {
            *self.vehicle_changes.entry(change).or_insert(0) += count as u64;
        }

        self.signal_changes += report.signal_changes as u64;
        self.frames_relayed += report.sensor_frames_relayed as u64;
        self.frames_dropped += report.sensor_frames_dropped as u64;

        self.step_latency.push(report.step_duration_ms);
        self.events_per_grant.push(report.events_replayed as f64);
    }

    pub fn update_idle(&mut self, events_replayed: usize) {
        self.idle_grants += 1;
        self.events_replayed += events_replayed as u64;
        self.events_per_grant.push(events_replayed as f64);
    }

    /// Build the summary
    pub fn summary(&self) -> BridgeSummary {
        let frames = self.frames_relayed + self.frames_dropped;
        BridgeSummary {
            total_steps: self.total_steps,
            idle_grants: self.idle_grants,
            events_replayed: self.events_replayed,
            events_ignored: self.events_ignored,
            vehicle_changes: self.vehicle_changes.clone(),
            signal_changes: self.signal_changes,
            frames_relayed: self.frames_relayed,
            frames_dropped: self.frames_dropped,
            frame_drop_rate: if frames > 0 {
                self.frames_dropped as f64 / frames as f64 * 100.0
            } else {
                0.0
            },
            step_latency_ms: StatsSummary::from(&self.step_latency),
            events_per_grant: StatsSummary::from(&self.events_per_grant),
        }
    }

    /// Reset all totals
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct BridgeSummary {
    pub total_steps: u64,
    pub idle_grants: u64,
    pub events_replayed: u64,
    pub events_ignored: u64,
    pub vehicle_changes: BTreeMap<&'static str, u64>,
    pub signal_changes: u64,
    pub frames_relayed: u64,
    pub frames_dropped: u64,
    pub frame_drop_rate: f64,
    pub step_latency_ms: StatsSummary,
    pub events_per_grant: StatsSummary,
}

impl std::fmt::Display for BridgeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Bridge Metrics Summary ===")?;
        writeln!(f, "Steps: {}", self.total_steps)?;
        writeln!(f, "Idle grants: {}", self.idle_grants)?;
        writeln!(
            f,
            "Events replayed: {} (own events ignored: {})",
            self.events_replayed, self.events_ignored
        )?;
        writeln!(f, "Signal group changes: {}", self.signal_changes)?;
        writeln!(
            f,
            "Sensor frames: {} relayed, {} dropped ({:.2}%)",
            self.frames_relayed, self.frames_dropped, self.frame_drop_rate
        )?;
        writeln!(f, "Step latency (ms): {}", self.step_latency_ms)?;
        writeln!(f, "Events per grant: {}", self.events_per_grant)?;

        if !self.vehicle_changes.is_empty() {
            writeln!(f, "Vehicles:")?;
            for (change, count) in &self.vehicle_changes {
                writeln!(f, "  {}: {}", change, count)?;
            }
        }

        Ok(())
    }
}

/// Summary of one running statistic
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
