//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A configured device has no motion for this session
    #[error("No motion source for device '{device}': {message}")]
    MotionSource { device: String, message: String },

    /// Session setup or execution error
    #[error("Session failed: {message}")]
    Session { message: String },

    /// Device layer error
    #[error(transparent)]
    Device(#[from] device_driver::DeviceError),

    /// Motion stream error
    #[error(transparent)]
    Stream(#[from] motion_stream::StreamError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn motion_source(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MotionSource {
            device: device.into(),
            message: message.into(),
        }
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
