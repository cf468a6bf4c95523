//! DriverConfig - Config Loader output
//!
//! Local cache of the dashboard settings: which devices exist, what kind
//! they are, and the static properties to apply when each one activates.

use serde::{Deserialize, Serialize};

use crate::{DevicePath, PropertyDescriptor, StaticPropertySource};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Client clock estimation tuning
    #[serde(default)]
    pub clock: ClockConfig,

    /// Tracked devices
    pub devices: Vec<DeviceConfig>,
}

/// Concrete device kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Hmd,
    LeftController,
    RightController,
}

impl DeviceKind {
    /// Path used when a device entry does not name one
    pub fn default_path(self) -> DevicePath {
        match self {
            Self::Hmd => DevicePath::new(DevicePath::HEAD),
            Self::LeftController => DevicePath::new(DevicePath::LEFT_HAND),
            Self::RightController => DevicePath::new(DevicePath::RIGHT_HAND),
        }
    }
}

/// One tracked device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Remote device path, e.g. "/user/head"
    pub path: DevicePath,

    pub kind: DeviceKind,

    /// Disabled devices are kept in the file but never built
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Dashboard properties, applied last during activation
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

fn default_enabled() -> bool {
    true
}

/// Best-effort client clock estimator tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Process noise (Q) of the offset filter
    #[serde(default = "default_process_noise")]
    pub process_noise: f64,

    /// Baseline measurement noise (R) of the offset filter
    #[serde(default = "default_measurement_noise")]
    pub measurement_noise: f64,

    /// Offset jump (ms) treated as a client clock restart
    #[serde(default = "default_resync_threshold_ms")]
    pub resync_threshold_ms: f64,
}

fn default_process_noise() -> f64 {
    1e-4
}

fn default_measurement_noise() -> f64 {
    1e-3
}

fn default_resync_threshold_ms() -> f64 {
    1000.0
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            process_noise: default_process_noise(),
            measurement_noise: default_measurement_noise(),
            resync_threshold_ms: default_resync_threshold_ms(),
        }
    }
}

impl DriverConfig {
    /// Enabled devices only
    pub fn enabled_devices(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.iter().filter(|device| device.enabled)
    }

    pub fn device(&self, path: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|device| device.path == path)
    }
}

impl StaticPropertySource for DriverConfig {
    fn static_properties(&self, device: &DevicePath) -> Vec<PropertyDescriptor> {
        self.device(device)
            .map(|device| device.properties.clone())
            .unwrap_or_default()
    }
}
