//! # Contracts
//!
//! Frozen interface contracts between the tracked-device core, the host
//! runtime and the streaming/configuration layers. Every other crate depends
//! on this one; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Motion samples carry the remote client's capture time in nanoseconds
//! - Pose time offsets are signed seconds (`f64`), usually negative

mod device_path;
mod driver_config;
mod error;
mod host;
mod math;
mod motion;
mod pose;
mod property;
mod property_key;
mod streaming;

pub use device_path::DevicePath;
pub use driver_config::*;
pub use error::*;
pub use host::*;
pub use math::{Quat, Vec3};
pub use motion::{MotionSample, MotionVelocity, TrackingEvent};
pub use pose::{DriverPose, TrackingResult};
pub use property::{PropertyDescriptor, PropertyType, PropertyValue};
pub use property_key::{lookup_property, property_table, PropertyInfo, PropertyKey};
pub use streaming::*;
