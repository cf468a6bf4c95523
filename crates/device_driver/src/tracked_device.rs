//! TrackedDevice - per-device adapter core
//!
//! Owns the lifecycle handles, the property binder and the live pose for
//! one remotely tracked device. Concrete device kinds embed it.
//!
//! Two independent callers share it:
//! - the host thread (`activate`, `deactivate`, `get_pose`, ...)
//! - the streaming thread (`update_pose`, `clear_pose`)
//!
//! Handles are atomics written only by activate/deactivate. The pose lives in
//! a single `RwLock` cell and is replaced as a whole value. Pushes to the host
//! happen under a read guard, so the host must not deactivate the device from
//! inside `pose_updated`.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{
    lookup_property, ClientClock, ContractError, DeviceIndex, DevicePath, DriverHost, DriverPose,
    MotionSample, PoseTarget, PropertyContainer, PropertyDescriptor, PropertyType, PropertyValue,
    StaticPropertySource, TrackingResult, INVALID_DEVICE_INDEX, INVALID_PROPERTY_CONTAINER,
};
use observability::metrics::{
    record_activation, record_pose_update, record_property_error, record_sample_dropped,
};
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::driver::TrackedDeviceDriver;
use crate::error::InitError;

/// Outcome of one property batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyReport {
    /// Accepted by the host
    pub applied: usize,
    /// Skipped because the name has no host key
    pub unknown: usize,
    /// Rejected by the host
    pub rejected: usize,
}

impl PropertyReport {
    pub fn merge(self, other: Self) -> Self {
        Self {
            applied: self.applied + other.applied,
            unknown: self.unknown + other.unknown,
            rejected: self.rejected + other.rejected,
        }
    }
}

/// Seconds from `capture_ns` to `client_now_ns`, signed
///
/// Negative when the capture is "in the future" of the estimate. Computed in
/// i128 so neither operand order can wrap.
pub fn time_offset_seconds(client_now_ns: u64, capture_ns: u64) -> f64 {
    (client_now_ns as i128 - capture_ns as i128) as f64 / 1e9
}

/// Device adapter core
pub struct TrackedDevice {
    device_path: DevicePath,
    host: Arc<dyn DriverHost>,
    properties: Arc<dyn StaticPropertySource>,
    clock: Arc<dyn ClientClock>,
    object_id: AtomicU32,
    property_container: AtomicU64,
    pose: RwLock<DriverPose>,
}

impl TrackedDevice {
    /// Create an inactive device with a cleared pose
    pub fn new(
        device_path: DevicePath,
        host: Arc<dyn DriverHost>,
        properties: Arc<dyn StaticPropertySource>,
        clock: Arc<dyn ClientClock>,
    ) -> Self {
        Self {
            device_path,
            host,
            properties,
            clock,
            object_id: AtomicU32::new(INVALID_DEVICE_INDEX),
            property_container: AtomicU64::new(INVALID_PROPERTY_CONTAINER),
            pose: RwLock::new(DriverPose::cleared()),
        }
    }

    pub fn device_path(&self) -> &DevicePath {
        &self.device_path
    }

    /// Host index while active
    pub fn object_id(&self) -> Option<DeviceIndex> {
        let id = self.object_id.load(Ordering::Acquire);
        (id != INVALID_DEVICE_INDEX).then_some(id)
    }

    /// Host property container while active
    pub fn property_container(&self) -> Option<PropertyContainer> {
        let container = self.property_container.load(Ordering::Acquire);
        (container != INVALID_PROPERTY_CONTAINER).then_some(container)
    }

    pub fn is_active(&self) -> bool {
        self.object_id().is_some()
    }

    // ===== Lifecycle =====

    /// Activation sequence shared by every device kind
    ///
    /// Binds the handles, applies `defaults`, then the static property list
    /// for this device. A fatal property error unbinds the device again.
    #[instrument(
        name = "device_activate",
        skip(self, defaults),
        fields(device = %self.device_path, defaults = defaults.len())
    )]
    pub fn activate_with(
        &self,
        index: DeviceIndex,
        defaults: &[PropertyDescriptor],
    ) -> Result<(), InitError> {
        let container = match self.bind(index) {
            Ok(container) => container,
            Err(e) => {
                warn!(error = %e, "activation refused");
                record_activation(&self.device_path, false);
                return Err(e);
            }
        };

        let result = self
            .apply_properties(defaults)
            .and_then(|report| Ok(report.merge(self.set_static_props()?)));

        match result {
            Ok(report) => {
                info!(
                    container,
                    applied = report.applied,
                    unknown = report.unknown,
                    rejected = report.rejected,
                    "device activated"
                );
                record_activation(&self.device_path, true);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "fatal property configuration error, device setup aborted");
                self.unbind();
                record_activation(&self.device_path, false);
                Err(InitError::property_config(self.device_path.as_str(), e))
            }
        }
    }

    /// Drop host handles and clear the pose. Idempotent.
    #[instrument(name = "device_deactivate", skip(self), fields(device = %self.device_path))]
    pub fn deactivate(&self) {
        // Unbinding under the pose lock keeps an in-flight sample from
        // landing after the clear.
        let previous = {
            let mut pose = self.pose.write();
            *pose = DriverPose::cleared();
            self.unbind()
        };

        match previous {
            Some(index) => info!(index, "device deactivated"),
            None => debug!("deactivate on inactive device ignored"),
        }
    }

    fn bind(&self, index: DeviceIndex) -> Result<PropertyContainer, InitError> {
        if index == INVALID_DEVICE_INDEX {
            return Err(InitError::InvalidIndex);
        }

        if let Err(current) = self.object_id.compare_exchange(
            INVALID_DEVICE_INDEX,
            index,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(InitError::AlreadyActive {
                path: self.device_path.to_string(),
                index: current,
            });
        }

        let container = self.host.container_for(index);
        if container == INVALID_PROPERTY_CONTAINER {
            self.object_id.store(INVALID_DEVICE_INDEX, Ordering::Release);
            return Err(InitError::NoPropertyContainer { index });
        }

        self.property_container.store(container, Ordering::Release);
        Ok(container)
    }

    fn unbind(&self) -> Option<DeviceIndex> {
        self.property_container
            .store(INVALID_PROPERTY_CONTAINER, Ordering::Release);
        let previous = self.object_id.swap(INVALID_DEVICE_INDEX, Ordering::AcqRel);
        (previous != INVALID_DEVICE_INDEX).then_some(previous)
    }

    // ===== Property binder =====

    /// Apply one descriptor through the matching host setter
    ///
    /// # Errors
    /// - `UnknownPropertyName`: no host key for the name, nothing sent
    /// - `HostRejected`: the host setter returned an error
    /// - `UnrecognizedPropertyType`: tag has no setter or disagrees with the value
    pub fn set_prop(&self, desc: &PropertyDescriptor) -> Result<(), ContractError> {
        let info =
            lookup_property(&desc.name).ok_or_else(|| ContractError::unknown_property(&desc.name))?;

        let container = self.property_container.load(Ordering::Acquire);
        let key = info.key;
        let host = &*self.host;

        let result = match (desc.ty, &desc.value) {
            (PropertyType::Bool, PropertyValue::Bool(v)) => host.set_bool(container, key, *v),
            (PropertyType::Float, PropertyValue::Float(v)) => host.set_float(container, key, *v),
            (PropertyType::Int32, PropertyValue::Int32(v)) => host.set_int32(container, key, *v),
            (PropertyType::Uint64, PropertyValue::Uint64(v)) => {
                host.set_uint64(container, key, *v)
            }
            (PropertyType::Vector3, PropertyValue::Vector3(v)) => {
                host.set_vector3(container, key, *v)
            }
            (PropertyType::Double, PropertyValue::Double(v)) => {
                host.set_double(container, key, *v)
            }
            (PropertyType::String, PropertyValue::String(v)) => {
                host.set_string(container, key, v)
            }
            (ty, _) => {
                return Err(ContractError::UnrecognizedPropertyType {
                    name: desc.name.clone(),
                    ty,
                })
            }
        };

        result.map_err(|error| ContractError::host_rejected(&desc.name, error))
    }

    /// Apply a batch in order
    ///
    /// Unknown names and host rejections are logged and skipped. The first
    /// fatal error stops the batch and is returned.
    #[instrument(
        name = "device_apply_properties",
        skip(self, props),
        fields(device = %self.device_path, count = props.len())
    )]
    pub fn apply_properties(
        &self,
        props: &[PropertyDescriptor],
    ) -> Result<PropertyReport, ContractError> {
        let mut report = PropertyReport::default();

        for desc in props {
            match self.set_prop(desc) {
                Ok(()) => report.applied += 1,
                Err(ContractError::UnknownPropertyName { name }) => {
                    warn!(property = %name, "unknown property name, skipped");
                    record_property_error(&self.device_path, "unknown_name");
                    report.unknown += 1;
                }
                Err(ContractError::HostRejected { name, error }) => {
                    warn!(property = %name, error = error.name(), "error setting property");
                    record_property_error(&self.device_path, "host_rejected");
                    report.rejected += 1;
                }
                Err(e) => {
                    record_property_error(&self.device_path, "fatal");
                    return Err(e);
                }
            }
        }

        Ok(report)
    }

    /// Apply the dashboard-configured properties for this device
    pub fn set_static_props(&self) -> Result<PropertyReport, ContractError> {
        let props = self.properties.static_properties(&self.device_path);
        self.apply_properties(&props)
    }

    // ===== Pose synchronizer =====

    /// Build a pose from `sample` and push it to the host
    ///
    /// Samples that arrive while the device is inactive are dropped. The
    /// handle is checked under the pose lock so a concurrent `deactivate`
    /// either runs first (sample dropped) or clears after the push.
    pub fn update_pose(&self, sample: MotionSample) {
        if !self.is_active() {
            self.drop_sample();
            return;
        }

        let client_now = self.clock.best_effort_client_time_ns(&self.device_path);
        let time_offset = time_offset_seconds(client_now, sample.timestamp_ns);

        let mut current = self.pose.write();
        let Some(index) = self.object_id() else {
            drop(current);
            self.drop_sample();
            return;
        };

        let mut pose = *current;
        pose.position = sample.position;
        pose.rotation = sample.orientation;
        if let Some(velocity) = sample.velocity {
            pose.velocity = velocity.linear;
            pose.angular_velocity = velocity.angular;
        }
        pose.time_offset = time_offset;
        pose.tracking_result = TrackingResult::RunningOk;
        pose.pose_is_valid = true;
        pose.device_is_connected = true;
        *current = pose;

        // Readers may proceed; deactivate waits until the host has the pose.
        let _guard = RwLockWriteGuard::downgrade(current);
        self.host.pose_updated(index, &pose);

        trace!(device = %self.device_path, index, time_offset, "pose updated");
        record_pose_update(&self.device_path, time_offset);
    }

    fn drop_sample(&self) {
        trace!(device = %self.device_path, "sample for inactive device dropped");
        record_sample_dropped(&self.device_path, "inactive");
    }

    /// Reset to the "no data" pose and tell the host while active
    pub fn clear_pose(&self) {
        let pose = DriverPose::cleared();
        let mut current = self.pose.write();
        *current = pose;

        let _guard = RwLockWriteGuard::downgrade(current);
        if let Some(index) = self.object_id() {
            self.host.pose_updated(index, &pose);
        }

        debug!(device = %self.device_path, "pose cleared");
    }

    /// Snapshot of the live pose
    pub fn get_pose(&self) -> DriverPose {
        *self.pose.read_recursive()
    }

    /// `"pose"` and `"status"` are answered as JSON; anything else gets an
    /// empty response.
    pub fn debug_request(&self, request: &str) -> String {
        match request.trim() {
            "pose" => serde_json::to_string(&self.get_pose()).unwrap_or_default(),
            "status" => serde_json::json!({
                "device_path": self.device_path.as_str(),
                "active": self.is_active(),
                "object_id": self.object_id(),
                "property_container": self.property_container(),
                "tracking_result": self.get_pose().tracking_result,
            })
            .to_string(),
            other => {
                debug!(device = %self.device_path, request = other, "unsupported debug request");
                String::new()
            }
        }
    }
}

impl TrackedDeviceDriver for TrackedDevice {
    fn core(&self) -> &TrackedDevice {
        self
    }

    fn activate(&self, index: DeviceIndex) -> Result<(), InitError> {
        self.activate_with(index, &[])
    }
}

impl PoseTarget for TrackedDevice {
    fn device_path(&self) -> &DevicePath {
        &self.device_path
    }

    fn update_pose(&self, sample: MotionSample) {
        TrackedDevice::update_pose(self, sample);
    }

    fn clear_pose(&self) {
        TrackedDevice::clear_pose(self);
    }
}
