//! Host lifecycle contract
//!
//! The host drives every transition. All methods take `&self` because the
//! host calls them from its own thread while the streaming thread keeps
//! updating the pose.

use contracts::{DeviceIndex, DevicePath, DriverPose};

use crate::error::InitError;
use crate::tracked_device::TrackedDevice;

/// Tracked device as seen by the host runtime
///
/// Concrete device kinds embed a [`TrackedDevice`] and expose it through
/// [`core`](Self::core); everything except `activate` defaults to the core.
pub trait TrackedDeviceDriver: Send + Sync {
    /// Embedded device core
    fn core(&self) -> &TrackedDevice;

    /// Bind to `index` and apply properties. Called once per activation cycle.
    fn activate(&self, index: DeviceIndex) -> Result<(), InitError>;

    /// Drop host handles. Idempotent.
    fn deactivate(&self) {
        self.core().deactivate();
    }

    /// Host is entering standby
    fn enter_standby(&self) {}

    /// Diagnostic passthrough
    fn debug_request(&self, request: &str) -> String {
        self.core().debug_request(request)
    }

    /// Last computed pose; the cleared pose before any sample
    fn get_pose(&self) -> DriverPose {
        self.core().get_pose()
    }

    fn device_path(&self) -> &DevicePath {
        self.core().device_path()
    }
}
