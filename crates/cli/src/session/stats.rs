//! Session statistics.

use std::time::Duration;

use motion_stream::{ClockSnapshot, StreamMetricsSnapshot};
use observability::PoseMetricsAggregator;

/// Statistics from a bridge session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Total duration of the session
    pub duration: Duration,

    /// Devices built from configuration
    pub devices_configured: usize,

    /// Devices the host activated successfully
    pub devices_active: usize,

    /// Poses the host received
    pub poses_delivered: u64,

    /// Events forwarded by the router
    pub stream: StreamMetricsSnapshot,

    /// Final clock estimator state
    pub clocks: Vec<ClockSnapshot>,

    /// Periodic pose snapshots
    pub pose_metrics: PoseMetricsAggregator,
}

impl SessionStats {
    /// Poses delivered per second
    pub fn pose_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.poses_delivered as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Session Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!(
            "   ├─ Devices active: {}/{}",
            self.devices_active, self.devices_configured
        );
        println!("   ├─ Poses delivered: {}", self.poses_delivered);
        println!("   └─ Pose rate: {:.2}/s", self.pose_rate());

        println!("\nStream");
        println!("   ├─ Motion samples: {}", self.stream.motion_received);
        println!("   ├─ With velocity: {}", self.stream.with_velocity);
        println!("   └─ Tracking lost: {}", self.stream.tracking_lost);

        if !self.clocks.is_empty() {
            println!("\nClient clocks");
            for (i, clock) in self.clocks.iter().enumerate() {
                let prefix = if i == self.clocks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: offset {:.3} ms, drift {:.3e}, n={}, delayed={}, resyncs={}",
                    prefix,
                    clock.device,
                    clock.offset_ns as f64 / 1e6,
                    clock.drift,
                    clock.samples,
                    clock.delayed,
                    clock.resyncs
                );
            }
        }

        println!("\n{}", self.pose_metrics.summary());
    }
}
