//! Layered error definitions
//!
//! Categorized by source: config / property / host / stream

use thiserror::Error;

use crate::{PropertyError, PropertyType};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Property Errors =====
    /// Property name has no entry in the host key table
    #[error("unknown property name '{name}'")]
    UnknownPropertyName { name: String },

    /// Property type tag is not one the dispatch table understands
    #[error("unrecognized type {ty:?} for property '{name}'")]
    UnrecognizedPropertyType { name: String, ty: PropertyType },

    // ===== Host Errors =====
    /// Host rejected a well-formed property
    #[error("host rejected property '{name}': {}", .error.name())]
    HostRejected { name: String, error: PropertyError },

    // ===== Stream Errors =====
    /// Motion record could not be decoded
    #[error("motion record parse error for device '{device}': {message}")]
    MotionParse { device: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unknown property name error
    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownPropertyName { name: name.into() }
    }

    /// Create host rejection error
    pub fn host_rejected(name: impl Into<String>, error: PropertyError) -> Self {
        Self::HostRejected {
            name: name.into(),
            error,
        }
    }

    /// True for errors that must abort device setup instead of being skipped
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnrecognizedPropertyType { .. })
    }
}
