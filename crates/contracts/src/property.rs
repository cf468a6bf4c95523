//! PropertyDescriptor - configuration layer output
//!
//! Dynamically typed device properties that the device adapter maps onto
//! the host's statically typed property setters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Property type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PropertyType {
    Bool,
    Float,
    Int32,
    Uint64,
    Vector3,
    Double,
    String,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Uint64 => "uint64",
            Self::Vector3 => "vector3",
            Self::Double => "double",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// Property value
///
/// Downstream crates must keep a fallback arm when matching on this enum;
/// the streaming layer may grow new tags before the host setters do.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PropertyValue {
    Bool(bool),
    Float(f32),
    Int32(i32),
    Uint64(u64),
    Vector3([f32; 3]),
    Double(f64),
    String(String),
}

impl PropertyValue {
    /// Type tag matching this value
    pub fn ty(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Float(_) => PropertyType::Float,
            Self::Int32(_) => PropertyType::Int32,
            Self::Uint64(_) => PropertyType::Uint64,
            Self::Vector3(_) => PropertyType::Vector3,
            Self::Double(_) => PropertyType::Double,
            Self::String(_) => PropertyType::String,
        }
    }
}

/// Property descriptor
///
/// `ty` is carried separately from `value` because descriptors arrive from
/// the streaming layer as a tag plus an untyped payload. A descriptor whose
/// tag disagrees with its payload violates the descriptor contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPropertyDescriptor", into = "RawPropertyDescriptor")]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: PropertyType,
    pub value: PropertyValue,
}

impl PropertyDescriptor {
    /// Descriptor whose tag is derived from the value
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            ty: value.ty(),
            value,
        }
    }

    /// Descriptor with an explicit tag, as received from the streaming layer
    pub fn tagged(name: impl Into<String>, ty: PropertyType, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            ty,
            value,
        }
    }

    pub fn bool(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, PropertyValue::Bool(value))
    }

    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, PropertyValue::Float(value))
    }

    pub fn int32(name: impl Into<String>, value: i32) -> Self {
        Self::new(name, PropertyValue::Int32(value))
    }

    pub fn uint64(name: impl Into<String>, value: u64) -> Self {
        Self::new(name, PropertyValue::Uint64(value))
    }

    pub fn vector3(name: impl Into<String>, value: [f32; 3]) -> Self {
        Self::new(name, PropertyValue::Vector3(value))
    }

    pub fn double(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, PropertyValue::Double(value))
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, PropertyValue::String(value.into()))
    }

    /// Tag and payload agree
    pub fn is_consistent(&self) -> bool {
        self.ty == self.value.ty()
    }
}

/// On-disk shape: `{ name = "...", type = "float", value = 90.0 }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPropertyDescriptor {
    name: String,
    #[serde(rename = "type")]
    ty: PropertyType,
    value: RawValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vector([f64; 3]),
    Text(String),
}

impl TryFrom<RawPropertyDescriptor> for PropertyDescriptor {
    type Error = String;

    fn try_from(raw: RawPropertyDescriptor) -> Result<Self, Self::Error> {
        let mismatch = || {
            format!(
                "value of property '{}' does not match declared type {}",
                raw.name, raw.ty
            )
        };

        let value = match (raw.ty, &raw.value) {
            (PropertyType::Bool, RawValue::Bool(b)) => PropertyValue::Bool(*b),
            (PropertyType::Float, RawValue::Float(f)) => PropertyValue::Float(*f as f32),
            (PropertyType::Float, RawValue::Int(i)) => PropertyValue::Float(*i as f32),
            (PropertyType::Double, RawValue::Float(f)) => PropertyValue::Double(*f),
            (PropertyType::Double, RawValue::Int(i)) => PropertyValue::Double(*i as f64),
            (PropertyType::Int32, RawValue::Int(i)) => {
                PropertyValue::Int32(i32::try_from(*i).map_err(|_| mismatch())?)
            }
            (PropertyType::Uint64, RawValue::Int(i)) => {
                PropertyValue::Uint64(u64::try_from(*i).map_err(|_| mismatch())?)
            }
            (PropertyType::Vector3, RawValue::Vector([x, y, z])) => {
                PropertyValue::Vector3([*x as f32, *y as f32, *z as f32])
            }
            (PropertyType::String, RawValue::Text(s)) => PropertyValue::String(s.clone()),
            _ => return Err(mismatch()),
        };

        Ok(Self {
            name: raw.name,
            ty: raw.ty,
            value,
        })
    }
}

impl From<PropertyDescriptor> for RawPropertyDescriptor {
    fn from(desc: PropertyDescriptor) -> Self {
        let value = match desc.value {
            PropertyValue::Bool(b) => RawValue::Bool(b),
            PropertyValue::Float(f) => RawValue::Float(f as f64),
            PropertyValue::Int32(i) => RawValue::Int(i as i64),
            // Values above i64::MAX cannot be expressed in TOML; saturate
            PropertyValue::Uint64(u) => RawValue::Int(i64::try_from(u).unwrap_or(i64::MAX)),
            PropertyValue::Vector3([x, y, z]) => RawValue::Vector([x as f64, y as f64, z as f64]),
            PropertyValue::Double(d) => RawValue::Float(d),
            PropertyValue::String(s) => RawValue::Text(s),
        };

        Self {
            name: desc.name,
            ty: desc.ty,
            value,
        }
    }
}
