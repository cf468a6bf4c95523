//! DeviceRegistry - devices built from configuration
//!
//! Each device is exposed twice: as a `TrackedDeviceDriver` for the host and
//! as a `PoseTarget` for the streaming layer. Both handles point at the same
//! object.

use std::sync::Arc;

use contracts::{
    ClientClock, DeviceKind, DevicePath, DriverConfig, DriverHost, DriverPose, PoseTarget,
    StaticPropertySource,
};
use tracing::{info, instrument};

use crate::controller::{ControllerDevice, Hand};
use crate::driver::TrackedDeviceDriver;
use crate::error::{DeviceError, Result};
use crate::hmd::HmdDevice;
use crate::tracked_device::TrackedDevice;

struct RegisteredDevice {
    path: DevicePath,
    kind: Option<DeviceKind>,
    driver: Arc<dyn TrackedDeviceDriver>,
    target: Arc<dyn PoseTarget>,
}

/// Devices by path, in configuration order
#[derive(Default)]
pub struct DeviceRegistry {
    devices: Vec<RegisteredDevice>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one device per enabled config entry
    #[instrument(
        name = "device_registry_from_config",
        skip_all,
        fields(devices = config.devices.len())
    )]
    pub fn from_config(
        config: &DriverConfig,
        host: Arc<dyn DriverHost>,
        properties: Arc<dyn StaticPropertySource>,
        clock: Arc<dyn ClientClock>,
    ) -> Result<Self> {
        let mut registry = Self::new();

        for device in config.enabled_devices() {
            let core = TrackedDevice::new(
                device.path.clone(),
                host.clone(),
                properties.clone(),
                clock.clone(),
            );

            match Hand::from_kind(device.kind) {
                Some(hand) => {
                    registry.insert(Some(device.kind), Arc::new(ControllerDevice::new(core, hand)))?
                }
                None => registry.insert(Some(device.kind), Arc::new(HmdDevice::new(core)))?,
            }
        }

        info!(count = registry.len(), "device registry built");
        Ok(registry)
    }

    /// Register a device
    ///
    /// # Errors
    /// `DuplicateDevice` if the path is taken
    pub fn insert<D>(&mut self, kind: Option<DeviceKind>, device: Arc<D>) -> Result<()>
    where
        D: TrackedDeviceDriver + PoseTarget + 'static,
    {
        let path = TrackedDeviceDriver::device_path(&*device).clone();
        if self.entry(&path).is_some() {
            return Err(DeviceError::duplicate(path.as_str()));
        }

        self.devices.push(RegisteredDevice {
            path,
            kind,
            driver: device.clone(),
            target: device,
        });
        Ok(())
    }

    pub fn driver(&self, path: &str) -> Option<Arc<dyn TrackedDeviceDriver>> {
        self.entry(path).map(|d| d.driver.clone())
    }

    pub fn pose_target(&self, path: &str) -> Option<Arc<dyn PoseTarget>> {
        self.entry(path).map(|d| d.target.clone())
    }

    /// Like [`pose_target`](Self::pose_target) but fails for unknown paths
    pub fn require_pose_target(&self, path: &str) -> Result<Arc<dyn PoseTarget>> {
        self.pose_target(path)
            .ok_or_else(|| DeviceError::unknown(path))
    }

    pub fn kind(&self, path: &str) -> Option<DeviceKind> {
        self.entry(path).and_then(|d| d.kind)
    }

    pub fn paths(&self) -> impl Iterator<Item = &DevicePath> {
        self.devices.iter().map(|d| &d.path)
    }

    pub fn drivers(&self) -> impl Iterator<Item = &Arc<dyn TrackedDeviceDriver>> {
        self.devices.iter().map(|d| &d.driver)
    }

    /// Current pose of every device
    pub fn poses(&self) -> Vec<(DevicePath, DriverPose)> {
        self.devices
            .iter()
            .map(|d| (d.path.clone(), d.driver.get_pose()))
            .collect()
    }

    /// Deactivate every device, in reverse registration order
    pub fn deactivate_all(&self) {
        for device in self.devices.iter().rev() {
            device.driver.deactivate();
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn entry(&self, path: &str) -> Option<&RegisteredDevice> {
        self.devices.iter().find(|d| d.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_host::{ManualClock, MockDriverHost};
    use contracts::{
        ClockConfig, ConfigVersion, DeviceConfig, MotionSample, PropertyDescriptor, PropertyValue,
        Quat, Vec3,
    };

    fn config() -> DriverConfig {
        DriverConfig {
            version: ConfigVersion::V1,
            clock: ClockConfig::default(),
            devices: vec![
                DeviceConfig {
                    path: DevicePath::new(DevicePath::HEAD),
                    kind: DeviceKind::Hmd,
                    enabled: true,
                    properties: vec![PropertyDescriptor::string("ModelNumberString", "Remote HMD")],
                },
                DeviceConfig {
                    path: DevicePath::new(DevicePath::LEFT_HAND),
                    kind: DeviceKind::LeftController,
                    enabled: true,
                    properties: vec![],
                },
                DeviceConfig {
                    path: DevicePath::new(DevicePath::RIGHT_HAND),
                    kind: DeviceKind::RightController,
                    enabled: false,
                    properties: vec![],
                },
            ],
        }
    }

    fn build(host: Arc<MockDriverHost>) -> DeviceRegistry {
        let config = config();
        DeviceRegistry::from_config(
            &config,
            host,
            Arc::new(config.clone()),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap()
    }

    #[test]
    fn test_from_config_builds_enabled_devices() {
        let registry = build(Arc::new(MockDriverHost::new()));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.kind("/user/head"), Some(DeviceKind::Hmd));
        assert_eq!(registry.kind("/user/hand/left"), Some(DeviceKind::LeftController));
        assert!(registry.driver("/user/hand/right").is_none());
        assert!(registry.require_pose_target("/user/hand/right").is_err());
    }

    #[test]
    fn test_driver_and_target_share_state() {
        let host = Arc::new(MockDriverHost::new());
        let registry = build(host.clone());

        let driver = registry.driver("/user/head").unwrap();
        let target = registry.pose_target("/user/head").unwrap();
        let index = host.add_device(driver.as_ref()).unwrap();

        target.update_pose(MotionSample::new(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY, 0));
        assert_eq!(driver.get_pose().position.y, 1.6);
        assert_eq!(
            host.property_by_name(index, "ModelNumberString"),
            Some(PropertyValue::String("Remote HMD".into()))
        );
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let host: Arc<dyn DriverHost> = Arc::new(MockDriverHost::new());
        let mut registry = DeviceRegistry::new();
        let make = || {
            Arc::new(TrackedDevice::new(
                DevicePath::new("/user/waist"),
                host.clone(),
                Arc::new(config()),
                Arc::new(ManualClock::new(0)),
            ))
        };

        registry.insert(None, make()).unwrap();
        let err = registry.insert(None, make()).unwrap_err();
        assert!(matches!(err, DeviceError::DuplicateDevice { .. }));
    }

    #[test]
    fn test_deactivate_all() {
        let host = Arc::new(MockDriverHost::new());
        let registry = build(host.clone());
        for driver in registry.drivers() {
            host.add_device(driver.as_ref()).unwrap();
        }
        assert!(registry.drivers().all(|d| d.core().is_active()));

        registry.deactivate_all();
        assert!(registry.drivers().all(|d| !d.core().is_active()));
        assert!(registry.poses().iter().all(|(_, pose)| !pose.is_live()));
    }
}
