//! Streaming and configuration layer boundary
//!
//! Data flows one way: static properties and motion events come in, nothing
//! is called back except logging.

use std::sync::Arc;

use crate::{DevicePath, MotionSample, PropertyDescriptor, TrackingEvent};

/// Static (dashboard-configured) property list, fetched once per activation
pub trait StaticPropertySource: Send + Sync {
    /// Properties for `device`, in application order
    fn static_properties(&self, device: &DevicePath) -> Vec<PropertyDescriptor>;
}

/// Best-effort estimate of a remote device's clock
pub trait ClientClock: Send + Sync {
    /// Current client time in nanoseconds, same base as `MotionSample::timestamp_ns`
    fn best_effort_client_time_ns(&self, device: &DevicePath) -> u64;
}

/// Consumer of motion events for one device
///
/// Implemented by the device adapter. Called from the streaming thread.
pub trait PoseTarget: Send + Sync {
    fn device_path(&self) -> &DevicePath;

    /// Apply a freshly received motion sample
    fn update_pose(&self, sample: MotionSample);

    /// Tracking lost or client disconnected
    fn clear_pose(&self);
}

/// Motion event callback type
pub type TrackingCallback = Arc<dyn Fn(TrackingEvent) + Send + Sync>;

/// Motion data source for one device
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn MotionSource> = make_source();
/// source.listen(Arc::new(|event| {
///     println!("event: {:?}", event);
/// }));
/// // ... stream ...
/// source.stop();
/// ```
pub trait MotionSource: Send + Sync {
    /// Device this source produces events for
    fn device_path(&self) -> &DevicePath;

    /// Register the event callback and start producing.
    ///
    /// Repeated calls while listening are ignored.
    fn listen(&self, callback: TrackingCallback);

    /// Stop producing events
    fn stop(&self);

    fn is_listening(&self) -> bool;
}
