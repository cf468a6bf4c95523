//! # Device Driver
//!
//! Host-facing tracked device adapters.
//!
//! Responsibilities:
//! - Bind the device lifecycle (activate / deactivate / standby) to host handles
//! - Apply static properties through the host's typed setters
//! - Turn motion samples into host poses with latency compensation
//! - Build devices from `DriverConfig` and index them by `DevicePath`
//! - Provide a recording `MockDriverHost` for tests and offline runs

pub mod controller;
pub mod driver;
pub mod error;
pub mod hmd;
pub mod mock_host;
pub mod registry;
pub mod tracked_device;

pub use contracts::{DevicePath, DriverHost, DriverPose, PoseTarget};
pub use controller::{ControllerDevice, Hand};
pub use driver::TrackedDeviceDriver;
pub use error::{DeviceError, InitError, Result};
pub use hmd::{HmdDefaults, HmdDevice};
pub use mock_host::{ManualClock, MockDriverHost, MockHostConfig, SetterCall};
pub use registry::DeviceRegistry;
pub use tracked_device::{time_offset_seconds, PropertyReport, TrackedDevice};
