//! TrackingRouter - connects motion sources to pose targets
//!
//! Each registered source gets a callback that feeds the clock estimator and
//! forwards the event to the device's `PoseTarget`. Callbacks run on the
//! source's own thread; the router never buffers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{DevicePath, MotionSource, PoseTarget, TrackingCallback, TrackingEvent};
use tracing::{debug, info, instrument};

use crate::clock::ClockEstimator;
use crate::error::{Result, StreamError};

/// Event counters shared by every route
#[derive(Debug, Default)]
pub struct StreamMetrics {
    /// Motion samples forwarded
    pub motion_received: AtomicU64,

    /// Tracking-lost signals forwarded
    pub tracking_lost: AtomicU64,

    /// Samples carrying velocities
    pub with_velocity: AtomicU64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_motion(&self, has_velocity: bool) {
        self.motion_received.fetch_add(1, Ordering::Relaxed);
        if has_velocity {
            self.with_velocity.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_lost(&self) {
        self.tracking_lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamMetricsSnapshot {
        StreamMetricsSnapshot {
            motion_received: self.motion_received.load(Ordering::Relaxed),
            tracking_lost: self.tracking_lost.load(Ordering::Relaxed),
            with_velocity: self.with_velocity.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetricsSnapshot {
    pub motion_received: u64,
    pub tracking_lost: u64,
    pub with_velocity: u64,
}

struct Route {
    source: Box<dyn MotionSource>,
    target: Arc<dyn PoseTarget>,
}

/// Router from motion sources to pose targets, one source per device
pub struct TrackingRouter {
    clock: Arc<ClockEstimator>,
    routes: HashMap<DevicePath, Route>,
    metrics: Arc<StreamMetrics>,
}

impl TrackingRouter {
    pub fn new(clock: Arc<ClockEstimator>) -> Self {
        Self {
            clock,
            routes: HashMap::new(),
            metrics: Arc::new(StreamMetrics::new()),
        }
    }

    /// Route `source` into `target`
    ///
    /// # Errors
    /// `DeviceMismatch` if the two name different devices, `AlreadyRegistered`
    /// if the device already has a source.
    #[instrument(
        name = "router_register",
        skip(self, source, target),
        fields(device = %source.device_path())
    )]
    pub fn register(
        &mut self,
        source: Box<dyn MotionSource>,
        target: Arc<dyn PoseTarget>,
    ) -> Result<()> {
        let device = source.device_path().clone();
        if device != *target.device_path() {
            return Err(StreamError::DeviceMismatch {
                source_device: device.to_string(),
                target_device: target.device_path().to_string(),
            });
        }
        if self.routes.contains_key(&device) {
            return Err(StreamError::AlreadyRegistered {
                device: device.to_string(),
            });
        }

        debug!(device = %device, "registered motion source");
        self.routes.insert(device, Route { source, target });
        Ok(())
    }

    /// Start every source that is not already listening
    #[instrument(name = "router_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.routes.len(), "starting motion sources");
        for (device, route) in &self.routes {
            if !route.source.is_listening() {
                debug!(device = %device, "starting motion source");
                route.source.listen(self.callback(device, route.target.clone()));
            }
        }
    }

    /// Stop every listening source
    #[instrument(name = "router_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.routes.len(), "stopping motion sources");
        for (device, route) in &self.routes {
            if route.source.is_listening() {
                debug!(device = %device, "stopping motion source");
                route.source.stop();
            }
        }
    }

    fn callback(&self, device: &DevicePath, target: Arc<dyn PoseTarget>) -> TrackingCallback {
        let device = device.clone();
        let clock = self.clock.clone();
        let metrics = self.metrics.clone();

        Arc::new(move |event| match event {
            TrackingEvent::Motion(sample) => {
                clock.observe(&device, sample.timestamp_ns);
                metrics.record_motion(sample.has_velocity());
                observability::metrics::record_stream_event(&device, "motion");
                target.update_pose(sample);
            }
            TrackingEvent::Lost => {
                metrics.record_lost();
                observability::metrics::record_stream_event(&device, "lost");
                observability::metrics::record_tracking_lost(&device);
                target.clear_pose();
            }
        })
    }

    pub fn metrics(&self) -> Arc<StreamMetrics> {
        self.metrics.clone()
    }

    pub fn clock(&self) -> &Arc<ClockEstimator> {
        &self.clock
    }

    pub fn device_count(&self) -> usize {
        self.routes.len()
    }

    pub fn is_listening(&self, device: &str) -> bool {
        self.routes
            .get(device)
            .is_some_and(|route| route.source.is_listening())
    }
}

impl Drop for TrackingRouter {
    fn drop(&mut self) {
        self.stop_all();
    }
}
