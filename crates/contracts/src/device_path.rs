//! DevicePath - Stable identity of a remotely tracked device
//!
//! Uses Arc<str> internally for O(1) clone operations. The numeric form
//! (`id()`) is what the streaming layer uses on the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Device path with cheap cloning.
///
/// Assigned once when a device adapter is constructed and never changes.
/// Motion samples, clock estimates and static property lookups are all
/// correlated through this value.
///
/// # Examples
/// ```
/// use contracts::DevicePath;
///
/// let head: DevicePath = "/user/head".into();
/// let again = head.clone();
/// assert_eq!(head, again);
/// assert_eq!(head.id(), DevicePath::from("/user/head").id());
/// ```
#[derive(Clone, Default)]
pub struct DevicePath(Arc<str>);

impl DevicePath {
    pub const HEAD: &'static str = "/user/head";
    pub const LEFT_HAND: &'static str = "/user/hand/left";
    pub const RIGHT_HAND: &'static str = "/user/hand/right";

    /// Create a new DevicePath from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying path.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Opaque 64-bit identifier (FNV-1a of the path).
    pub fn id(&self) -> u64 {
        self.0.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
        })
    }
}

impl Deref for DevicePath {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for DevicePath {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DevicePath {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DevicePath {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for DevicePath {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevicePath({:?})", self.0)
    }
}

impl PartialEq for DevicePath {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for DevicePath {}

impl PartialEq<str> for DevicePath {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for DevicePath {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Must agree with `Borrow<str>` so maps can be queried with `&str`
impl Hash for DevicePath {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for DevicePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DevicePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
