//! Hand controllers

use contracts::{DeviceIndex, DeviceKind, DevicePath, MotionSample, PoseTarget, PropertyDescriptor};

use crate::driver::TrackedDeviceDriver;
use crate::error::InitError;
use crate::hmd::{DEVICE_CLASS_CONTROLLER, TRACKING_SYSTEM_NAME};
use crate::tracked_device::TrackedDevice;

/// Controller type reported when the dashboard does not override it
pub const DEFAULT_CONTROLLER_TYPE: &str = "tracker_bridge_controller";

/// Which hand a controller is held in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Host role hint code
    pub fn role_hint(self) -> i32 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
        }
    }

    pub fn from_kind(kind: DeviceKind) -> Option<Self> {
        match kind {
            DeviceKind::LeftController => Some(Self::Left),
            DeviceKind::RightController => Some(Self::Right),
            DeviceKind::Hmd => None,
        }
    }
}

/// Controller device
pub struct ControllerDevice {
    core: TrackedDevice,
    hand: Hand,
}

impl ControllerDevice {
    pub fn new(core: TrackedDevice, hand: Hand) -> Self {
        Self { core, hand }
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }

    fn defaults(&self) -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor::string("TrackingSystemNameString", TRACKING_SYSTEM_NAME),
            PropertyDescriptor::int32("DeviceClassInt32", DEVICE_CLASS_CONTROLLER),
            PropertyDescriptor::int32("ControllerRoleHintInt32", self.hand.role_hint()),
            PropertyDescriptor::string("ControllerTypeString", DEFAULT_CONTROLLER_TYPE),
        ]
    }
}

impl TrackedDeviceDriver for ControllerDevice {
    fn core(&self) -> &TrackedDevice {
        &self.core
    }

    fn activate(&self, index: DeviceIndex) -> Result<(), InitError> {
        self.core.activate_with(index, &self.defaults())
    }
}

impl PoseTarget for ControllerDevice {
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
