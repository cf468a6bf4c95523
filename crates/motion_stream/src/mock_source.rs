//! Mock motion source
//!
//! Implements `MotionSource` with a background thread generating a slow yaw
//! sweep and a vertical bob around a base position. Used for offline runs
//! and tests without a headset.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{
    DevicePath, MotionSample, MotionSource, Quat, TrackingCallback, TrackingEvent, Vec3,
};
use nalgebra::{UnitQuaternion, Vector3};
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockMotionConfig {
    /// Sample rate (Hz)
    pub rate_hz: f64,
    /// Center of the motion (m)
    pub base_position: Vec3,
    /// Yaw rate (rad/s)
    pub yaw_rate: f64,
    /// Vertical bob amplitude (m)
    pub bob_amplitude: f64,
    /// Vertical bob frequency (Hz)
    pub bob_frequency: f64,
    /// Attach velocities to samples
    pub with_velocity: bool,
    /// Emit a tracking-lost event every N samples
    pub lost_every: Option<u64>,
    /// Added to elapsed time to simulate a client clock with another epoch (ns)
    pub client_clock_offset_ns: u64,
}

impl Default for MockMotionConfig {
    fn default() -> Self {
        Self {
            rate_hz: 90.0,
            base_position: Vec3::new(0.0, 1.6, 0.0),
            yaw_rate: 0.5,
            bob_amplitude: 0.02,
            bob_frequency: 0.5,
            with_velocity: true,
            lost_every: None,
            client_clock_offset_ns: 1_000_000_000,
        }
    }
}

impl MockMotionConfig {
    /// Defaults with a base position suited to the device path
    pub fn for_device(device: &DevicePath) -> Self {
        let base_position = match device.as_str() {
            DevicePath::LEFT_HAND => Vec3::new(-0.2, 1.0, -0.3),
            DevicePath::RIGHT_HAND => Vec3::new(0.2, 1.0, -0.3),
            _ => Vec3::new(0.0, 1.6, 0.0),
        };
        Self {
            base_position,
            ..Default::default()
        }
    }
}

/// Mock motion source
pub struct MockMotionSource {
    device: DevicePath,
    config: MockMotionConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockMotionSource {
    pub fn new(device: DevicePath, config: MockMotionConfig) -> Self {
        Self {
            device,
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    pub fn with_defaults(device: DevicePath) -> Self {
        let config = MockMotionConfig::for_device(&device);
        Self::new(device, config)
    }

    /// Sample at `t` seconds after the source started
    pub fn sample_at(config: &MockMotionConfig, t: f64) -> MotionSample {
        let yaw = config.yaw_rate * t;
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw);
        let q = rotation.quaternion();

        let omega = TAU * config.bob_frequency;
        let position = Vec3::new(
            config.base_position.x,
            config.base_position.y + config.bob_amplitude * (omega * t).sin(),
            config.base_position.z,
        );

        let timestamp_ns = config.client_clock_offset_ns + (t * 1e9) as u64;
        let sample = MotionSample::new(position, Quat::new(q.w, q.i, q.j, q.k), timestamp_ns);

        if config.with_velocity {
            let linear = Vec3::new(0.0, config.bob_amplitude * omega * (omega * t).cos(), 0.0);
            let angular = rotation * Vector3::new(0.0, config.yaw_rate, 0.0);
            sample.with_velocity(linear, Vec3::new(angular.x, angular.y, angular.z))
        } else {
            sample
        }
    }
}

impl MotionSource for MockMotionSource {
    fn device_path(&self) -> &DevicePath {
        &self.device
    }

    fn listen(&self, callback: TrackingCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let device = self.device.clone();
        let config = self.config.clone();
        let listening = self.listening.clone();
        let interval = Duration::from_secs_f64(1.0 / config.rate_hz.max(1.0));

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let mut seq: u64 = 0;

            debug!(device = %device, rate_hz = config.rate_hz, "mock motion source started");

            while listening.load(Ordering::Relaxed) {
                seq += 1;

                let event = match config.lost_every {
                    Some(n) if n > 0 && seq % n == 0 => TrackingEvent::Lost,
                    _ => TrackingEvent::Motion(Self::sample_at(&config, start.elapsed().as_secs_f64())),
                };
                callback(event);

                trace!(device = %device, seq, "mock motion event sent");
                thread::sleep(interval);
            }

            debug!(device = %device, "mock motion source stopped");
        });

        *self.thread_handle.lock() = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for MockMotionSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_sample_at_start() {
        let config = MockMotionConfig::default();
        let sample = MockMotionSource::sample_at(&config, 0.0);

        assert_eq!(sample.position, Vec3::new(0.0, 1.6, 0.0));
        assert_abs_diff_eq!(sample.orientation.w, 1.0, epsilon = 1e-12);
        assert_eq!(sample.timestamp_ns, config.client_clock_offset_ns);
        assert!(sample.has_velocity());
    }

    #[test]
    fn test_yaw_is_about_vertical_axis() {
        let config = MockMotionConfig {
            yaw_rate: std::f64::consts::FRAC_PI_2,
            ..Default::default()
        };
        // 1 s -> 90 degrees of yaw
        let q = MockMotionSource::sample_at(&config, 1.0).orientation;
        let half = std::f64::consts::FRAC_PI_4;
        assert_abs_diff_eq!(q.w, half.cos(), epsilon = 1e-9);
        assert_abs_diff_eq!(q.y, half.sin(), epsilon = 1e-9);
        assert_abs_diff_eq!(q.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_without_velocity() {
        let config = MockMotionConfig {
            with_velocity: false,
            ..Default::default()
        };
        assert!(!MockMotionSource::sample_at(&config, 0.3).has_velocity());
    }

    #[test]
    fn test_hand_base_positions() {
        let left = MockMotionConfig::for_device(&DevicePath::new(DevicePath::LEFT_HAND));
        let right = MockMotionConfig::for_device(&DevicePath::new(DevicePath::RIGHT_HAND));
        assert!(left.base_position.x < 0.0);
        assert!(right.base_position.x > 0.0);
    }

    #[test]
    fn test_listen_emits_motion_and_loss() {
        let source = MockMotionSource::new(
            DevicePath::new(DevicePath::HEAD),
            MockMotionConfig {
                rate_hz: 500.0,
                lost_every: Some(3),
                ..Default::default()
            },
        );

        let motion = Arc::new(AtomicU64::new(0));
        let lost = Arc::new(AtomicU64::new(0));
        let (m, l) = (motion.clone(), lost.clone());

        source.listen(Arc::new(move |event| match event {
            TrackingEvent::Motion(_) => {
                m.fetch_add(1, Ordering::Relaxed);
            }
            TrackingEvent::Lost => {
                l.fetch_add(1, Ordering::Relaxed);
            }
        }));

        thread::sleep(Duration::from_millis(100));
        source.stop();

        assert!(!source.is_listening());
        assert!(motion.load(Ordering::Relaxed) > 0);
        assert!(lost.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn test_idempotent_listen() {
        let source = MockMotionSource::with_defaults(DevicePath::new(DevicePath::HEAD));
        let count = Arc::new(AtomicU64::new(0));
        let (c1, c2) = (count.clone(), count.clone());

        source.listen(Arc::new(move |_| {
            c1.fetch_add(1, Ordering::Relaxed);
        }));
        source.listen(Arc::new(move |_| {
            c2.fetch_add(1_000, Ordering::Relaxed);
        }));

        thread::sleep(Duration::from_millis(50));
        source.stop();

        let total = count.load(Ordering::Relaxed);
        assert!(total > 0);
        assert!(total < 1_000);
    }
}
