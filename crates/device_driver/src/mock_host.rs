//! Mock host runtime
//!
//! Records every setter call and pose delivery, assigns device indices like
//! the real host does on device registration, and supports failure
//! injection per property key or device index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use contracts::{
    property_table, ClientClock, DeviceIndex, DevicePath, DriverPose, PoseSink, PropertyContainer,
    PropertyError, PropertyKey, PropertyStore, PropertyType, PropertyValue,
    INVALID_PROPERTY_CONTAINER,
};
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::driver::TrackedDeviceDriver;
use crate::error::InitError;

/// Containers are derived from the index so they are easy to recognize
const CONTAINER_BASE: PropertyContainer = 0x1000;

/// Mock host configuration
#[derive(Debug, Default, Clone)]
pub struct MockHostConfig {
    /// Keys whose setters fail with the given error
    pub reject_keys: Vec<(PropertyKey, PropertyError)>,
    /// Indices the host has no property container for
    pub missing_containers: Vec<DeviceIndex>,
    /// Accept any value type under any key
    pub lenient_types: bool,
    /// Keep every delivered pose, not only the latest per device
    pub record_pose_history: bool,
}

/// One recorded setter invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SetterCall {
    pub container: PropertyContainer,
    pub key: PropertyKey,
    /// Which typed setter was called
    pub ty: PropertyType,
    pub accepted: bool,
}

#[derive(Default)]
struct PoseLog {
    latest: HashMap<DeviceIndex, DriverPose>,
    counts: HashMap<DeviceIndex, u64>,
    history: Vec<(DeviceIndex, DriverPose)>,
}

/// Mock host runtime
pub struct MockDriverHost {
    config: MockHostConfig,
    next_index: AtomicU32,
    setter_calls: Mutex<Vec<SetterCall>>,
    properties: Mutex<HashMap<(PropertyContainer, PropertyKey), PropertyValue>>,
    poses: Mutex<PoseLog>,
}

impl MockDriverHost {
    pub fn new() -> Self {
        Self::with_config(MockHostConfig::default())
    }

    pub fn with_config(config: MockHostConfig) -> Self {
        Self {
            config,
            next_index: AtomicU32::new(0),
            setter_calls: Mutex::new(Vec::new()),
            properties: Mutex::new(HashMap::new()),
            poses: Mutex::new(PoseLog::default()),
        }
    }

    /// Register a device: assign the next index and activate it
    #[instrument(name = "mock_host_add_device", skip(self, driver), fields(device = %driver.device_path()))]
    pub fn add_device(&self, driver: &dyn TrackedDeviceDriver) -> Result<DeviceIndex, InitError> {
        let index = self.next_index.fetch_add(1, Ordering::SeqCst);
        driver.activate(index)?;
        debug!(index, "device added");
        Ok(index)
    }

    /// Unregister a device
    pub fn remove_device(&self, driver: &dyn TrackedDeviceDriver) {
        driver.deactivate();
    }

    /// Container the host hands out for `index`
    pub fn container_of(&self, index: DeviceIndex) -> Option<PropertyContainer> {
        if self.config.missing_containers.contains(&index) {
            None
        } else {
            Some(CONTAINER_BASE + index as PropertyContainer)
        }
    }

    /// All setter calls in order
    pub fn setter_calls(&self) -> Vec<SetterCall> {
        self.setter_calls.lock().clone()
    }

    /// Stored value under `(container, key)`
    pub fn property(&self, container: PropertyContainer, key: PropertyKey) -> Option<PropertyValue> {
        self.properties.lock().get(&(container, key)).cloned()
    }

    /// Stored value for the device at `index`, by property name
    pub fn property_by_name(&self, index: DeviceIndex, name: &str) -> Option<PropertyValue> {
        let container = self.container_of(index)?;
        let info = contracts::lookup_property(name)?;
        self.property(container, info.key)
    }

    /// Last pose delivered for `index`
    pub fn latest_pose(&self, index: DeviceIndex) -> Option<DriverPose> {
        self.poses.lock().latest.get(&index).copied()
    }

    /// Number of poses delivered for `index`
    pub fn pose_count(&self, index: DeviceIndex) -> u64 {
        self.poses.lock().counts.get(&index).copied().unwrap_or(0)
    }

    pub fn total_pose_updates(&self) -> u64 {
        self.poses.lock().counts.values().sum()
    }

    /// Delivered poses for `index`, oldest first (needs `record_pose_history`)
    pub fn pose_history(&self, index: DeviceIndex) -> Vec<DriverPose> {
        self.poses
            .lock()
            .history
            .iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, pose)| *pose)
            .collect()
    }

    fn store(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        let ty = value.ty();
        let result = self.check(container, key, ty);

        self.setter_calls.lock().push(SetterCall {
            container,
            key,
            ty,
            accepted: result.is_ok(),
        });

        if result.is_ok() {
            self.properties.lock().insert((container, key), value);
        }
        result
    }

    fn check(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        ty: PropertyType,
    ) -> Result<(), PropertyError> {
        if container == INVALID_PROPERTY_CONTAINER {
            return Err(PropertyError::InvalidContainer);
        }

        if let Some((_, error)) = self.config.reject_keys.iter().find(|(k, _)| *k == key) {
            return Err(*error);
        }

        if !self.config.lenient_types {
            let table = property_table();
            let info = table
                .binary_search_by_key(&key, |info| info.key)
                .map(|pos| table[pos])
                .map_err(|_| PropertyError::UnknownProperty)?;
            if info.ty != ty {
                return Err(PropertyError::WrongDataType);
            }
        }

        Ok(())
    }
}

impl Default for MockDriverHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyStore for MockDriverHost {
    fn container_for(&self, index: DeviceIndex) -> PropertyContainer {
        self.container_of(index).unwrap_or(INVALID_PROPERTY_CONTAINER)
    }

    fn set_bool(&self, c: PropertyContainer, key: PropertyKey, v: bool) -> Result<(), PropertyError> {
        self.store(c, key, PropertyValue::Bool(v))
    }

    fn set_float(&self, c: PropertyContainer, key: PropertyKey, v: f32) -> Result<(), PropertyError> {
        self.store(c, key, PropertyValue::Float(v))
    }

    fn set_int32(&self, c: PropertyContainer, key: PropertyKey, v: i32) -> Result<(), PropertyError> {
        self.store(c, key, PropertyValue::Int32(v))
    }

    fn set_uint64(&self, c: PropertyContainer, key: PropertyKey, v: u64) -> Result<(), PropertyError> {
        self.store(c, key, PropertyValue::Uint64(v))
    }

    fn set_vector3(
        &self,
        c: PropertyContainer,
        key: PropertyKey,
        v: [f32; 3],
    ) -> Result<(), PropertyError> {
        self.store(c, key, PropertyValue::Vector3(v))
    }

    fn set_double(&self, c: PropertyContainer, key: PropertyKey, v: f64) -> Result<(), PropertyError> {
        self.store(c, key, PropertyValue::Double(v))
    }

    fn set_string(&self, c: PropertyContainer, key: PropertyKey, v: &str) -> Result<(), PropertyError> {
        self.store(c, key, PropertyValue::String(v.to_string()))
    }
}

impl PoseSink for MockDriverHost {
    fn pose_updated(&self, index: DeviceIndex, pose: &DriverPose) {
        let mut log = self.poses.lock();
        log.latest.insert(index, *pose);
        *log.counts.entry(index).or_insert(0) += 1;
        if self.config.record_pose_history {
            log.history.push((index, *pose));
        }
    }
}

/// Client clock that reads a settable value
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ns: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ns: u64) -> Self {
        Self {
            now_ns: AtomicU64::new(now_ns),
        }
    }

    pub fn set(&self, now_ns: u64) {
        self.now_ns.store(now_ns, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ns: u64) {
        self.now_ns.fetch_add(delta_ns, Ordering::SeqCst);
    }
}

impl ClientClock for ManualClock {
    fn best_effort_client_time_ns(&self, _device: &DevicePath) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
}
