//! Head-mounted display

use contracts::{DeviceIndex, DevicePath, MotionSample, PoseTarget, PropertyDescriptor};
use tracing::info;

use crate::driver::TrackedDeviceDriver;
use crate::error::InitError;
use crate::tracked_device::TrackedDevice;

/// Tracking system name reported for every device of this driver
pub const TRACKING_SYSTEM_NAME: &str = "tracker_bridge";

/// Device class codes understood by the host
pub(crate) const DEVICE_CLASS_HMD: i32 = 1;
pub(crate) const DEVICE_CLASS_CONTROLLER: i32 = 2;

/// Implicit HMD properties, applied before the dashboard list
#[derive(Debug, Clone, PartialEq)]
pub struct HmdDefaults {
    pub tracking_system_name: String,
    pub display_frequency_hz: f32,
    pub ipd_m: f32,
    pub seconds_from_vsync_to_photons: f32,
}

impl Default for HmdDefaults {
    fn default() -> Self {
        Self {
            tracking_system_name: TRACKING_SYSTEM_NAME.to_string(),
            display_frequency_hz: 90.0,
            ipd_m: 0.063,
            seconds_from_vsync_to_photons: 0.011,
        }
    }
}

impl HmdDefaults {
    pub fn to_properties(&self) -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor::string("TrackingSystemNameString", &self.tracking_system_name),
            PropertyDescriptor::int32("DeviceClassInt32", DEVICE_CLASS_HMD),
            PropertyDescriptor::float("DisplayFrequencyFloat", self.display_frequency_hz),
            PropertyDescriptor::float("UserIpdMetersFloat", self.ipd_m),
            PropertyDescriptor::float(
                "SecondsFromVsyncToPhotonsFloat",
                self.seconds_from_vsync_to_photons,
            ),
        ]
    }
}

/// HMD device
///
/// Standby clears the pose so the host stops presenting stale head motion.
pub struct HmdDevice {
    core: TrackedDevice,
    defaults: HmdDefaults,
}

impl HmdDevice {
    pub fn new(core: TrackedDevice) -> Self {
        Self::with_defaults(core, HmdDefaults::default())
    }

    pub fn with_defaults(core: TrackedDevice, defaults: HmdDefaults) -> Self {
        Self { core, defaults }
    }

    pub fn defaults(&self) -> &HmdDefaults {
        &self.defaults
    }
}

impl TrackedDeviceDriver for HmdDevice {
    fn core(&self) -> &TrackedDevice {
        &self.core
    }

    fn activate(&self, index: DeviceIndex) -> Result<(), InitError> {
        self.core.activate_with(index, &self.defaults.to_properties())
    }

    fn enter_standby(&self) {
        info!(device = %self.core.device_path(), "hmd entering standby");
        self.core.clear_pose();
    }
}

impl PoseTarget for HmdDevice {
    fn device_path(&self) -> &DevicePath {
        self.core.device_path()
    }

    fn update_pose(&self, sample: MotionSample) {
        self.core.update_pose(sample);
    }

    fn clear_pose(&self) {
        self.core.clear_pose();
    }
}
