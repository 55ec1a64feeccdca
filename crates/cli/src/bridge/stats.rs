//! Run statistics.

use std::time::Duration;

use host_adapter::MetricsSnapshot;
use observability::BridgeSummary;

/// Statistics from a bridge run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Trace entries processed before the run ended
    pub entries: usize,

    pub events_submitted: usize,

    pub grants: usize,

    /// Stopped early by Ctrl+C / SIGTERM
    pub interrupted: bool,

    /// Events still queued when the coordinator shut down
    pub discarded_events: usize,

    /// Total duration of the run
    pub duration: Duration,

    /// Per-output host counters, in output order
    pub outputs: Vec<(String, MetricsSnapshot)>,

    pub metrics: BridgeSummary,
}

impl RunStats {
    /// Remote steps per wall-clock second
    pub fn steps_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.total_steps as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Bridge Run Statistics ===\n");

        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Trace entries: {}", self.entries);
        println!("  Events submitted: {}", self.events_submitted);
        println!("  Grants: {}", self.grants);
        println!("  Steps/s: {:.2}", self.steps_per_sec());
        if self.interrupted {
            println!("  Interrupted: yes");
        }
        if self.discarded_events > 0 {
            println!("  Discarded at shutdown: {}", self.discarded_events);
        }

        if !self.outputs.is_empty() {
            println!("\nOutputs");
            for (name, snapshot) in &self.outputs {
                println!(
                    "  {}: {} emitted, {} failed",
                    name, snapshot.emit_count, snapshot.failure_count
                );
            }
        }

        println!("\n{}", self.metrics);
    }
}
