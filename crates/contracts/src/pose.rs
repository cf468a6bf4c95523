//! DriverPose - the host's per-device pose record
//!
//! One pose is live per device. It is replaced as a whole value on every
//! update and never mutated field by field while shared.

use serde::{Deserialize, Serialize};

use crate::{Quat, Vec3};

/// Tracking state reported alongside a pose
///
/// Discriminants match the host runtime's numeric codes. `Uninitialized`
/// and `RunningOk` are the floor states every device kind uses; the others
/// exist for device kinds that report partial tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum TrackingResult {
    #[default]
    Uninitialized = 1,
    CalibratingInProgress = 100,
    CalibratingOutOfRange = 101,
    RunningOk = 200,
    RunningOutOfRange = 201,
    FallbackRotationOnly = 300,
}

impl TrackingResult {
    /// Numeric code as understood by the host
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::RunningOk | Self::RunningOutOfRange)
    }
}

/// Pose as delivered to the host pose-ingestion callback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverPose {
    /// Seconds between the pose's capture and "now" in the host time base.
    /// Usually negative. Never clamped.
    pub time_offset: f64,

    /// Driver space to world space
    pub world_from_driver_rotation: Quat,
    pub world_from_driver_translation: Vec3,

    /// Head space to driver space
    pub driver_from_head_rotation: Quat,
    pub driver_from_head_translation: Vec3,

    /// Position in driver space (meters)
    pub position: Vec3,
    /// Orientation in driver space
    pub rotation: Quat,
    /// Linear velocity (m/s)
    pub velocity: Vec3,
    /// Angular velocity (rad/s)
    pub angular_velocity: Vec3,

    pub tracking_result: TrackingResult,
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
}

impl DriverPose {
    /// The "no data" pose: identity frames, zero motion, not valid, not connected
    pub const fn cleared() -> Self {
        Self {
            time_offset: 0.0,
            world_from_driver_rotation: Quat::IDENTITY,
            world_from_driver_translation: Vec3::ZERO,
            driver_from_head_rotation: Quat::IDENTITY,
            driver_from_head_translation: Vec3::ZERO,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            tracking_result: TrackingResult::Uninitialized,
            pose_is_valid: false,
            device_is_connected: false,
        }
    }

    /// True when the pose originated from an actual motion sample
    pub fn is_live(&self) -> bool {
        self.pose_is_valid && self.device_is_connected
    }
}

impl Default for DriverPose {
    fn default() -> Self {
        Self::cleared()
    }
}
