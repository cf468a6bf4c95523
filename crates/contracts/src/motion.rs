//! MotionSample - streaming layer output
//!
//! Decoded motion data for one device, consumed once by the pose
//! synchronizer and not retained.

use serde::{Deserialize, Serialize};

use crate::{Quat, Vec3};

/// Linear and angular velocity pair; either both are present or neither
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionVelocity {
    /// Linear velocity (m/s)
    pub linear: Vec3,
    /// Angular velocity (rad/s)
    pub angular: Vec3,
}

/// Motion sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Position (meters)
    pub position: Vec3,

    /// Orientation
    pub orientation: Quat,

    /// Velocities, when the client reported them
    pub velocity: Option<MotionVelocity>,

    /// Capture time on the client clock (nanoseconds)
    pub timestamp_ns: u64,
}

impl MotionSample {
    /// Sample with position and orientation only
    pub fn new(position: Vec3, orientation: Quat, timestamp_ns: u64) -> Self {
        Self {
            position,
            orientation,
            velocity: None,
            timestamp_ns,
        }
    }

    pub fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.velocity = Some(MotionVelocity { linear, angular });
        self
    }

    pub fn has_velocity(&self) -> bool {
        self.velocity.is_some()
    }
}

/// Event delivered by a motion source for one device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackingEvent {
    /// A freshly decoded motion sample
    Motion(MotionSample),
    /// Out-of-band signal: tracking lost or client disconnected
    Lost,
}
