//! Tracker bridge metrics
//!
//! Thin wrappers over the `metrics` facade plus an in-memory aggregator for
//! run summaries. All metric names share the `tracker_bridge_` prefix.

use std::collections::BTreeMap;

use contracts::DriverPose;
use metrics::{counter, gauge, histogram};

/// Record a device activation attempt
pub fn record_activation(device: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "tracker_bridge_activations_total",
        "device" => device.to_string(),
        "status" => status
    )
    .increment(1);
    gauge!("tracker_bridge_device_active", "device" => device.to_string())
        .set(if success { 1.0 } else { 0.0 });
}

/// Record a pose pushed to the host
///
/// `time_offset_s` is the signed offset carried by the pose.
pub fn record_pose_update(device: &str, time_offset_s: f64) {
    counter!("tracker_bridge_pose_updates_total", "device" => device.to_string()).increment(1);
    gauge!("tracker_bridge_time_offset_ms", "device" => device.to_string())
        .set(time_offset_s * 1000.0);
    histogram!("tracker_bridge_time_offset_ms_hist", "device" => device.to_string())
        .record(time_offset_s.abs() * 1000.0);
}

/// Record a property that was not applied
///
/// `kind` is one of `unknown_name`, `host_rejected` or `fatal`.
pub fn record_property_error(device: &str, kind: &'static str) {
    counter!(
        "tracker_bridge_property_errors_total",
        "device" => device.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record a motion sample that never reached the host
pub fn record_sample_dropped(device: &str, reason: &'static str) {
    counter!(
        "tracker_bridge_samples_dropped_total",
        "device" => device.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record a pose reset after tracking loss
pub fn record_tracking_lost(device: &str) {
    counter!("tracker_bridge_tracking_lost_total", "device" => device.to_string()).increment(1);
}

/// Record an event delivered by a motion source
pub fn record_stream_event(device: &str, kind: &'static str) {
    counter!(
        "tracker_bridge_stream_events_total",
        "device" => device.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Per-device pose statistics
#[derive(Debug, Clone, Default)]
struct DeviceStats {
    live: u64,
    cleared: u64,
    with_velocity: u64,
    /// |time offset| in milliseconds
    offset_ms: RunningStats,
}

/// Pose metrics aggregator
///
/// Fed with pose snapshots, aggregated in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct PoseMetricsAggregator {
    samples: u64,
    devices: BTreeMap<String, DeviceStats>,
}

impl PoseMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one pose snapshot of `device`
    pub fn update(&mut self, device: &str, pose: &DriverPose) {
        self.samples += 1;
        let stats = self.devices.entry(device.to_string()).or_default();

        if !pose.is_live() {
            stats.cleared += 1;
            return;
        }

        stats.live += 1;
        stats.offset_ms.push(pose.time_offset.abs() * 1000.0);
        if pose.velocity != Default::default() || pose.angular_velocity != Default::default() {
            stats.with_velocity += 1;
        }
    }

    pub fn summary(&self) -> PoseMetricsSummary {
        PoseMetricsSummary {
            samples: self.samples,
            devices: self
                .devices
                .iter()
                .map(|(device, stats)| DeviceSummary {
                    device: device.clone(),
                    live: stats.live,
                    cleared: stats.cleared,
                    with_velocity: stats.with_velocity,
                    time_offset_ms: StatsSummary::from(&stats.offset_ms),
                })
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of one device
#[derive(Debug, Clone, Default)]
pub struct DeviceSummary {
    pub device: String,
    pub live: u64,
    pub cleared: u64,
    pub with_velocity: u64,
    pub time_offset_ms: StatsSummary,
}

impl DeviceSummary {
    /// Share of snapshots that carried a live pose, in percent
    pub fn live_rate(&self) -> f64 {
        let total = self.live + self.cleared;
        if total > 0 {
            self.live as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Pose metrics summary, devices sorted by path
#[derive(Debug, Clone, Default)]
pub struct PoseMetricsSummary {
    pub samples: u64,
    pub devices: Vec<DeviceSummary>,
}

impl std::fmt::Display for PoseMetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Pose Metrics Summary ===")?;
        writeln!(f, "Snapshots: {}", self.samples)?;
        for device in &self.devices {
            writeln!(
                f,
                "{}: live {} ({:.2}%), cleared {}, with velocity {}",
                device.device,
                device.live,
                device.live_rate(),
                device.cleared,
                device.with_velocity
            )?;
            writeln!(f, "  |time offset| (ms): {}", device.time_offset_ms)?;
        }
        Ok(())
    }
}

/// Statistics summary
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
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
