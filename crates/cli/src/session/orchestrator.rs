//! Session orchestrator - wires config, devices, host and motion sources.
//!
//! The host runtime is simulated by `MockDriverHost`; every other component
//! is the production one.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{DevicePath, DriverConfig, MotionSource};
use device_driver::{DeviceRegistry, MockDriverHost, TrackedDeviceDriver};
use motion_stream::{
    ClockEstimator, MockMotionConfig, MockMotionSource, ReplayConfig, ReplayMotionSource,
    TrackingRouter,
};
use tracing::{error, info, warn};

use super::SessionStats;
use crate::error::{CliError, Result};

/// How often pose snapshots are taken for the summary
const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(100);

/// Where motion comes from
#[derive(Debug, Clone)]
pub enum MotionMode {
    /// Synthetic motion at the given rate (Hz)
    Mock { rate_hz: f64 },
    /// Recorded JSONL log
    Replay { path: PathBuf, config: ReplayConfig },
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub config: DriverConfig,

    /// Session length (None = until shutdown)
    pub duration: Option<Duration>,

    pub motion: MotionMode,
}

/// Bridge session
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run until the duration elapses or `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<SessionStats> {
        let driver_config = &self.config.config;

        let host = Arc::new(MockDriverHost::new());
        let clock = Arc::new(ClockEstimator::new(driver_config.clock.clone()));

        let registry = DeviceRegistry::from_config(
            driver_config,
            host.clone(),
            Arc::new(driver_config.clone()),
            clock.clone(),
        )?;

        self.run_on(&host, &registry, clock, shutdown).await
    }

    /// Drive an already built registry; every device is deactivated on return
    async fn run_on(
        &self,
        host: &MockDriverHost,
        registry: &DeviceRegistry,
        clock: Arc<ClockEstimator>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SessionStats> {
        let result = self.drive(host, registry, clock, shutdown).await;
        registry.deactivate_all();
        result
    }

    async fn drive(
        &self,
        host: &MockDriverHost,
        registry: &DeviceRegistry,
        clock: Arc<ClockEstimator>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SessionStats> {
        let start_time = Instant::now();

        // Activate
        let mut active = Vec::new();
        for driver in registry.drivers() {
            let path = driver.device_path().clone();
            match host.add_device(driver.as_ref()) {
                Ok(index) => {
                    info!(device = %path, index, "device added to host");
                    active.push(path);
                }
                Err(e) => error!(device = %path, error = %e, "device activation failed"),
            }
        }

        if active.is_empty() {
            return Err(CliError::session("no device could be activated"));
        }

        // Route motion into every active device
        let mut router = TrackingRouter::new(clock);
        for path in &active {
            let Some(source) = self.motion_source(path)? else {
                continue;
            };
            router.register(source, registry.require_pose_target(path)?)?;
        }

        if router.device_count() == 0 {
            return Err(CliError::session("no active device has motion to play"));
        }

        info!(
            devices = router.device_count(),
            duration = ?self.config.duration,
            "session running"
        );
        router.start_all();

        let mut stats = SessionStats {
            devices_configured: registry.len(),
            devices_active: active.len(),
            ..Default::default()
        };

        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(SNAPSHOT_INTERVAL);
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    info!("session duration reached");
                    break;
                }
                _ = &mut shutdown => {
                    warn!("received shutdown signal, stopping session");
                    break;
                }
                _ = ticker.tick() => {
                    for (path, pose) in registry.poses() {
                        stats.pose_metrics.update(&path, &pose);
                    }
                }
            }
        }

        router.stop_all();

        stats.duration = start_time.elapsed();
        stats.poses_delivered = host.total_pose_updates();
        stats.stream = router.metrics().snapshot();
        stats.clocks = router.clock().snapshot();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            poses = stats.poses_delivered,
            pose_rate = format!("{:.2}", stats.pose_rate()),
            "session finished"
        );

        Ok(stats)
    }

    /// Motion source for `device`, or None when a replay has nothing for it
    fn motion_source(&self, device: &DevicePath) -> Result<Option<Box<dyn MotionSource>>> {
        match &self.config.motion {
            MotionMode::Mock { rate_hz } => {
                if !rate_hz.is_finite() || *rate_hz <= 0.0 {
                    return Err(CliError::motion_source(
                        device.as_str(),
                        format!("rate must be positive, got {rate_hz}"),
                    ));
                }
                let config = MockMotionConfig {
                    rate_hz: *rate_hz,
                    ..MockMotionConfig::for_device(device)
                };
                Ok(Some(Box::new(MockMotionSource::new(device.clone(), config))))
            }
            MotionMode::Replay { path, config } => {
                let source = ReplayMotionSource::load(path, device.clone(), config.clone())?;
                if source.is_empty() {
                    warn!(device = %device, path = %path.display(), "replay has no records for device");
                    return Ok(None);
                }
                Ok(Some(Box::new(source)))
            }
        }
    }
}
