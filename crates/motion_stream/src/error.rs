//! Motion stream error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Motion stream error
#[derive(Debug, Error)]
pub enum StreamError {
    /// Replay file could not be read
    #[error("failed to read replay file '{}': {source}", .path.display())]
    ReplayIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Replay line could not be decoded
    #[error("replay line {line}: {source}")]
    ReplayRecord {
        line: usize,
        #[source]
        source: ContractError,
    },

    /// Source and target disagree on the device
    #[error("source for '{source_device}' cannot feed target '{target_device}'")]
    DeviceMismatch {
        source_device: String,
        target_device: String,
    },

    /// A route for this device already exists
    #[error("device '{device}' already has a motion source")]
    AlreadyRegistered { device: String },
}

impl StreamError {
    pub fn record(line: usize, device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReplayRecord {
            line,
            source: ContractError::MotionParse {
                device: device.into(),
                message: message.into(),
            },
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, StreamError>;
