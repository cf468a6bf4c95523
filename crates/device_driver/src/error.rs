//! Device driver error types

use contracts::{ContractError, DeviceIndex};
use thiserror::Error;

/// Error returned to the host from `activate`
#[derive(Debug, Error)]
pub enum InitError {
    /// Host passed the reserved invalid index
    #[error("invalid device index")]
    InvalidIndex,

    /// Device is already bound to a host index
    #[error("device '{path}' is already active as index {index}")]
    AlreadyActive { path: String, index: DeviceIndex },

    /// Host has no property container for the index
    #[error("no property container for device index {index}")]
    NoPropertyContainer { index: DeviceIndex },

    /// Property list violated the descriptor contract
    #[error("device '{path}' setup aborted: {source}")]
    PropertyConfig {
        path: String,
        #[source]
        source: ContractError,
    },
}

impl InitError {
    /// Create property configuration error
    pub fn property_config(path: impl Into<String>, source: ContractError) -> Self {
        Self::PropertyConfig {
            path: path.into(),
            source,
        }
    }
}

/// Device registry / driver error
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Two devices share a path
    #[error("device '{path}' is already registered")]
    DuplicateDevice { path: String },

    /// No device under this path
    #[error("no device registered for '{path}'")]
    UnknownDevice { path: String },

    /// Activation failed
    #[error(transparent)]
    Init(#[from] InitError),

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl DeviceError {
    /// Create duplicate device error
    pub fn duplicate(path: impl Into<String>) -> Self {
        Self::DuplicateDevice { path: path.into() }
    }

    /// Create unknown device error
    pub fn unknown(path: impl Into<String>) -> Self {
        Self::UnknownDevice { path: path.into() }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DeviceError>;
