//! Host runtime boundary
//!
//! The host owns device indices, property containers and the pose
//! ingestion path. These traits are the only calls the device core makes
//! into it.

use serde::{Deserialize, Serialize};

use crate::{DriverPose, PropertyKey};

/// Host-assigned device index
pub type DeviceIndex = u32;

/// Host-assigned opaque property container handle
pub type PropertyContainer = u64;

/// Index value meaning "not activated"
pub const INVALID_DEVICE_INDEX: DeviceIndex = u32::MAX;

/// Container value meaning "not activated"
pub const INVALID_PROPERTY_CONTAINER: PropertyContainer = 0;

/// Error codes returned by the host property setters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyError {
    WrongDataType,
    WrongDeviceClass,
    BufferTooSmall,
    UnknownProperty,
    InvalidDevice,
    CouldNotContactServer,
    ValueNotProvidedByDevice,
    StringExceedsMaximumLength,
    NotYetAvailable,
    PermissionDenied,
    InvalidOperation,
    CannotWriteToWildcards,
    IpcReadFailure,
    OutOfMemory,
    InvalidContainer,
}

impl PropertyError {
    /// Host's symbolic name for the error
    pub fn name(self) -> &'static str {
        match self {
            Self::WrongDataType => "TrackedProp_WrongDataType",
            Self::WrongDeviceClass => "TrackedProp_WrongDeviceClass",
            Self::BufferTooSmall => "TrackedProp_BufferTooSmall",
            Self::UnknownProperty => "TrackedProp_UnknownProperty",
            Self::InvalidDevice => "TrackedProp_InvalidDevice",
            Self::CouldNotContactServer => "TrackedProp_CouldNotContactServer",
            Self::ValueNotProvidedByDevice => "TrackedProp_ValueNotProvidedByDevice",
            Self::StringExceedsMaximumLength => "TrackedProp_StringExceedsMaximumLength",
            Self::NotYetAvailable => "TrackedProp_NotYetAvailable",
            Self::PermissionDenied => "TrackedProp_PermissionDenied",
            Self::InvalidOperation => "TrackedProp_InvalidOperation",
            Self::CannotWriteToWildcards => "TrackedProp_CannotWriteToWildcards",
            Self::IpcReadFailure => "TrackedProp_IPCReadFailure",
            Self::OutOfMemory => "TrackedProp_OutOfMemory",
            Self::InvalidContainer => "TrackedProp_InvalidContainer",
        }
    }
}

/// Host property store
///
/// Setters are keyed by `(container, key)` and report success or a
/// [`PropertyError`]. Implementations must be callable from any thread.
pub trait PropertyStore: Send + Sync {
    /// Resolve the property container for an activated device index
    fn container_for(&self, index: DeviceIndex) -> PropertyContainer;

    fn set_bool(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: bool,
    ) -> Result<(), PropertyError>;

    fn set_float(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: f32,
    ) -> Result<(), PropertyError>;

    fn set_int32(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: i32,
    ) -> Result<(), PropertyError>;

    fn set_uint64(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: u64,
    ) -> Result<(), PropertyError>;

    fn set_vector3(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: [f32; 3],
    ) -> Result<(), PropertyError>;

    fn set_double(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: f64,
    ) -> Result<(), PropertyError>;

    fn set_string(
        &self,
        container: PropertyContainer,
        key: PropertyKey,
        value: &str,
    ) -> Result<(), PropertyError>;
}

/// Host pose ingestion
pub trait PoseSink: Send + Sync {
    /// Deliver a complete pose for an activated device
    fn pose_updated(&self, index: DeviceIndex, pose: &DriverPose);
}

/// Everything the device core needs from the host
pub trait DriverHost: PropertyStore + PoseSink {}

impl<T: PropertyStore + PoseSink> DriverHost for T {}
