//! ClockEstimator - best-effort client clock per device
//!
//! Every received sample is an observation of `client_ts - local_receive`.
//! The filter runs on that difference relative to a per-device base so it
//! stays in a well-conditioned range regardless of clock epochs. The base is
//! the first observation, and is moved whenever the client clock jumps.

use std::collections::HashMap;
use std::time::Instant;

use contracts::{ClientClock, ClockConfig, DevicePath};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::kalman::{Correction, OffsetFilter};

/// Per-device estimator state
struct DeviceClock {
    /// `client - local` difference (ns) the filter is relative to
    base_ns: i128,
    filter: OffsetFilter,
    last_local_ns: u64,
    samples: u64,
    delayed: u64,
    resyncs: u64,
}

impl DeviceClock {
    fn offset_ns(&self) -> i128 {
        self.base_ns + (self.filter.offset() * 1e9).round() as i128
    }
}

/// Diagnostic view of one device's estimator
#[derive(Debug, Clone, PartialEq)]
pub struct ClockSnapshot {
    pub device: DevicePath,
    /// Estimated `client - local` offset (ns)
    pub offset_ns: i128,
    /// Seconds per second
    pub drift: f64,
    /// Offset variance (s^2)
    pub uncertainty: f64,
    pub samples: u64,
    /// Samples judged late and left out of the estimate
    pub delayed: u64,
    /// Client clock restarts detected
    pub resyncs: u64,
}

/// Best-effort client clock estimator
pub struct ClockEstimator {
    config: ClockConfig,
    epoch: Instant,
    devices: Mutex<HashMap<DevicePath, DeviceClock>>,
}

impl ClockEstimator {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            devices: Mutex::new(HashMap::new()),
        }
    }

    /// Local monotonic time (ns since the estimator was created)
    pub fn local_now_ns(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Record a sample captured at `client_ts_ns`, received now
    pub fn observe(&self, device: &DevicePath, client_ts_ns: u64) {
        self.observe_at(device, client_ts_ns, self.local_now_ns());
    }

    /// Record a sample captured at `client_ts_ns`, received at `local_ns`
    pub fn observe_at(&self, device: &DevicePath, client_ts_ns: u64, local_ns: u64) {
        let observed_ns = client_ts_ns as i128 - local_ns as i128;
        let mut devices = self.devices.lock();

        let Some(clock) = devices.get_mut(device) else {
            debug!(device = %device, offset_ns = observed_ns as i64, "first clock observation");
            devices.insert(
                device.clone(),
                DeviceClock {
                    base_ns: observed_ns,
                    filter: OffsetFilter::new(&self.config, 0.0),
                    last_local_ns: local_ns,
                    samples: 1,
                    delayed: 0,
                    resyncs: 0,
                },
            );
            return;
        };

        let dt = local_ns.saturating_sub(clock.last_local_ns) as f64 / 1e9;
        let observation = (observed_ns - clock.base_ns) as f64 / 1e9;
        clock.last_local_ns = local_ns;
        clock.samples += 1;

        match clock.filter.update(observation, dt) {
            Correction::Applied { residual } => {
                trace!(device = %device, residual, "clock observation");
            }
            Correction::Delayed { residual } => {
                clock.delayed += 1;
                trace!(device = %device, residual, "delayed sample left out of clock estimate");
            }
            Correction::Resync { jump } => {
                clock.base_ns = observed_ns;
                clock.filter.reset(0.0);
                clock.resyncs += 1;
                info!(device = %device, jump_s = jump, "client clock jumped, resynchronizing");
            }
        }
    }

    /// Estimated `client - local` offset, if the device has been observed
    pub fn offset_ns(&self, device: &DevicePath) -> Option<i128> {
        self.devices.lock().get(device).map(DeviceClock::offset_ns)
    }

    /// Client time corresponding to local time `local_ns`
    ///
    /// Falls back to `local_ns` for a device that was never observed.
    pub fn estimate_at(&self, device: &DevicePath, local_ns: u64) -> u64 {
        let offset = self.offset_ns(device).unwrap_or(0);
        (local_ns as i128 + offset).clamp(0, u64::MAX as i128) as u64
    }

    /// Estimator state of every observed device, sorted by path
    pub fn snapshot(&self) -> Vec<ClockSnapshot> {
        let mut snapshots: Vec<_> = self
            .devices
            .lock()
            .iter()
            .map(|(device, clock)| ClockSnapshot {
                device: device.clone(),
                offset_ns: clock.offset_ns(),
                drift: clock.filter.drift(),
                uncertainty: clock.filter.uncertainty(),
                samples: clock.samples,
                delayed: clock.delayed,
                resyncs: clock.resyncs,
            })
            .collect();
        snapshots.sort_by(|a, b| a.device.as_str().cmp(b.device.as_str()));
        snapshots
    }

    /// Forget a device, e.g. after the client reconnects with a new clock
    pub fn reset(&self, device: &DevicePath) {
        self.devices.lock().remove(device);
    }
}

impl ClientClock for ClockEstimator {
    fn best_effort_client_time_ns(&self, device: &DevicePath) -> u64 {
        self.estimate_at(device, self.local_now_ns())
    }
}
