//! StepReport - per-grant outcome handed to observability

use serde::{Deserialize, Serialize};

use crate::SimTime;

/// What one executed remote step did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub granted: SimTime,
    /// Next-step time requested after this step
    pub next_step: SimTime,
    pub events_replayed: usize,
    /// Events sent by this federate itself
    pub events_ignored: usize,
    pub vehicles_spawned: usize,
    pub vehicles_moved: usize,
    pub vehicles_removed: usize,
    pub signal_changes: usize,
    pub sensor_frames_relayed: usize,
    pub sensor_frames_dropped: usize,
    /// Wall time of the remote step call (ms)
    pub step_duration_ms: f64,
}
