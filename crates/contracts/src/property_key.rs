//! Static property name -> host key table
//!
//! Built once per process and shared read-only by every device adapter.
//! Names follow the host's property identifiers with the type suffix folded
//! in (`Prop_DisplayFrequency_Float` -> `DisplayFrequencyFloat`).

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

use crate::PropertyType;

/// Host property key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey(pub u32);

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the key table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub key: PropertyKey,
    /// Type the host stores under this key
    pub ty: PropertyType,
}

macro_rules! property_table {
    ($($name:literal => $key:literal, $ty:ident;)*) => {
        &[$(PropertyInfo {
            name: $name,
            key: PropertyKey($key),
            ty: PropertyType::$ty,
        },)*]
    };
}

const PROPERTIES: &[PropertyInfo] = property_table! {
    // General
    "TrackingSystemNameString" => 1000, String;
    "ModelNumberString" => 1001, String;
    "SerialNumberString" => 1002, String;
    "RenderModelNameString" => 1003, String;
    "WillDriftInYawBool" => 1004, Bool;
    "ManufacturerNameString" => 1005, String;
    "TrackingFirmwareVersionString" => 1006, String;
    "HardwareRevisionString" => 1007, String;
    "AllWirelessDongleDescriptionsString" => 1008, String;
    "ConnectedWirelessDongleString" => 1009, String;
    "DeviceIsWirelessBool" => 1010, Bool;
    "DeviceIsChargingBool" => 1011, Bool;
    "DeviceBatteryPercentageFloat" => 1012, Float;
    "FirmwareUpdateAvailableBool" => 1014, Bool;
    "FirmwareManualUpdateBool" => 1015, Bool;
    "FirmwareManualUpdateURLString" => 1016, String;
    "HardwareRevisionUint64" => 1017, Uint64;
    "FirmwareVersionUint64" => 1018, Uint64;
    "FPGAVersionUint64" => 1019, Uint64;
    "VRCVersionUint64" => 1020, Uint64;
    "RadioVersionUint64" => 1021, Uint64;
    "DongleVersionUint64" => 1022, Uint64;
    "BlockServerShutdownBool" => 1023, Bool;
    "CanUnifyCoordinateSystemWithHmdBool" => 1024, Bool;
    "ContainsProximitySensorBool" => 1025, Bool;
    "DeviceProvidesBatteryStatusBool" => 1026, Bool;
    "DeviceCanPowerOffBool" => 1027, Bool;
    "FirmwareProgrammingTargetString" => 1028, String;
    "DeviceClassInt32" => 1029, Int32;
    "HasCameraBool" => 1030, Bool;
    "DriverVersionString" => 1031, String;
    "FirmwareForceUpdateRequiredBool" => 1032, Bool;
    "ViveSystemButtonFixRequiredBool" => 1033, Bool;
    "ParentDriverUint64" => 1034, Uint64;
    "ResourceRootString" => 1035, String;
    "RegisteredDeviceTypeString" => 1036, String;
    "InputProfilePathString" => 1037, String;
    "NeverTrackedBool" => 1038, Bool;
    "NumCamerasInt32" => 1039, Int32;
    "CameraFrameLayoutInt32" => 1040, Int32;
    "CameraStreamFormatInt32" => 1041, Int32;
    "AdditionalDeviceSettingsPathString" => 1042, String;
    "IdentifiableBool" => 1043, Bool;
    "BootloaderVersionUint64" => 1044, Uint64;
    "AdditionalSystemReportDataString" => 1045, String;
    "CompositeFirmwareVersionString" => 1046, String;
    "FirmwareRemindUpdateBool" => 1047, Bool;
    "PeripheralApplicationVersionUint64" => 1048, Uint64;
    "ManufacturerSerialNumberString" => 1049, String;
    "ComputedSerialNumberString" => 1050, String;
    "EstimatedDeviceFirstUseTimeInt32" => 1051, Int32;
    "DevicePowerUsageFloat" => 1052, Float;
    "IgnoreMotionForStandbyBool" => 1053, Bool;
    "ActualTrackingSystemNameString" => 1054, String;

    // Head-mounted display
    "ReportsTimeSinceVSyncBool" => 2000, Bool;
    "SecondsFromVsyncToPhotonsFloat" => 2001, Float;
    "DisplayFrequencyFloat" => 2002, Float;
    "UserIpdMetersFloat" => 2003, Float;
    "CurrentUniverseIdUint64" => 2004, Uint64;
    "PreviousUniverseIdUint64" => 2005, Uint64;
    "DisplayFirmwareVersionUint64" => 2006, Uint64;
    "IsOnDesktopBool" => 2007, Bool;
    "DisplayMCTypeInt32" => 2008, Int32;
    "DisplayMCOffsetFloat" => 2009, Float;
    "DisplayMCScaleFloat" => 2010, Float;
    "EdidVendorIDInt32" => 2011, Int32;
    "DisplayMCImageLeftString" => 2012, String;
    "DisplayMCImageRightString" => 2013, String;
    "DisplayGCBlackClampFloat" => 2014, Float;
    "EdidProductIDInt32" => 2015, Int32;
    "DisplayGCTypeInt32" => 2017, Int32;
    "DisplayGCOffsetFloat" => 2018, Float;
    "DisplayGCScaleFloat" => 2019, Float;
    "DisplayGCPrescaleFloat" => 2020, Float;
    "DisplayGCImageString" => 2021, String;
    "LensCenterLeftUFloat" => 2022, Float;
    "LensCenterLeftVFloat" => 2023, Float;
    "LensCenterRightUFloat" => 2024, Float;
    "LensCenterRightVFloat" => 2025, Float;
    "UserHeadToEyeDepthMetersFloat" => 2026, Float;
    "CameraFirmwareVersionUint64" => 2027, Uint64;
    "CameraFirmwareDescriptionString" => 2028, String;
    "DisplayFPGAVersionUint64" => 2029, Uint64;
    "DisplayBootloaderVersionUint64" => 2030, Uint64;
    "DisplayHardwareVersionUint64" => 2031, Uint64;
    "AudioFirmwareVersionUint64" => 2032, Uint64;
    "CameraCompatibilityModeInt32" => 2033, Int32;
    "ScreenshotHorizontalFieldOfViewDegreesFloat" => 2034, Float;
    "ScreenshotVerticalFieldOfViewDegreesFloat" => 2035, Float;
    "DisplaySuppressedBool" => 2036, Bool;
    "DisplayAllowNightModeBool" => 2037, Bool;
    "DisplayMCImageWidthInt32" => 2038, Int32;
    "DisplayMCImageHeightInt32" => 2039, Int32;
    "DisplayMCImageNumChannelsInt32" => 2040, Int32;
    "SecondsFromPhotonsToVblankFloat" => 2042, Float;
    "DriverDirectModeSendsVsyncEventsBool" => 2043, Bool;
    "DisplayDebugModeBool" => 2044, Bool;
    "GraphicsAdapterLuidUint64" => 2045, Uint64;
    "DriverProvidedChaperonePathString" => 2048, String;
    "ExpectedTrackingReferenceCountInt32" => 2049, Int32;
    "ExpectedControllerCountInt32" => 2050, Int32;
    "NamedIconPathControllerLeftDeviceOffString" => 2051, String;
    "NamedIconPathControllerRightDeviceOffString" => 2052, String;
    "NamedIconPathTrackingReferenceDeviceOffString" => 2053, String;
    "DoNotApplyPredictionBool" => 2054, Bool;
    "DriverIsDrawingControllersBool" => 2057, Bool;
    "DriverRequestsApplicationPauseBool" => 2058, Bool;
    "DriverRequestsReducedRenderingBool" => 2059, Bool;
    "MinimumIpdStepMetersFloat" => 2060, Float;
    "AudioBridgeFirmwareVersionUint64" => 2061, Uint64;
    "ImageBridgeFirmwareVersionUint64" => 2062, Uint64;
    "ImuFactoryGyroBiasVector3" => 2064, Vector3;
    "ImuFactoryGyroScaleVector3" => 2065, Vector3;
    "ImuFactoryAccelerometerBiasVector3" => 2066, Vector3;
    "ImuFactoryAccelerometerScaleVector3" => 2067, Vector3;
    "ConfigurationIncludesLighthouse20FeaturesBool" => 2069, Bool;
    "DisplaySupportsMultipleFrameratesBool" => 2081, Bool;
    "DashboardScaleFloat" => 2091, Float;
    "IpdUIRangeMinMetersFloat" => 2100, Float;
    "IpdUIRangeMaxMetersFloat" => 2101, Float;

    // Controllers
    "AttachedDeviceIdString" => 3000, String;
    "SupportedButtonsUint64" => 3001, Uint64;
    "Axis0TypeInt32" => 3002, Int32;
    "Axis1TypeInt32" => 3003, Int32;
    "Axis2TypeInt32" => 3004, Int32;
    "Axis3TypeInt32" => 3005, Int32;
    "Axis4TypeInt32" => 3006, Int32;
    "ControllerRoleHintInt32" => 3007, Int32;

    // Tracking references
    "FieldOfViewLeftDegreesFloat" => 4000, Float;
    "FieldOfViewRightDegreesFloat" => 4001, Float;
    "FieldOfViewTopDegreesFloat" => 4002, Float;
    "FieldOfViewBottomDegreesFloat" => 4003, Float;
    "TrackingRangeMinimumMetersFloat" => 4004, Float;
    "TrackingRangeMaximumMetersFloat" => 4005, Float;
    "ModeLabelString" => 4006, String;

    // UI and icons
    "IconPathNameString" => 5000, String;
    "NamedIconPathDeviceOffString" => 5001, String;
    "NamedIconPathDeviceSearchingString" => 5002, String;
    "NamedIconPathDeviceSearchingAlertString" => 5003, String;
    "NamedIconPathDeviceReadyString" => 5004, String;
    "NamedIconPathDeviceReadyAlertString" => 5005, String;
    "NamedIconPathDeviceNotReadyString" => 5006, String;
    "NamedIconPathDeviceStandbyString" => 5007, String;
    "NamedIconPathDeviceAlertLowString" => 5008, String;
    "NamedIconPathDeviceStandbyAlertString" => 5009, String;

    // Components
    "HasDisplayComponentBool" => 6002, Bool;
    "HasControllerComponentBool" => 6003, Bool;
    "HasCameraComponentBool" => 6004, Bool;
    "HasDriverDirectModeComponentBool" => 6005, Bool;
    "HasVirtualDisplayComponentBool" => 6006, Bool;
    "HasSpatialAnchorsSupportBool" => 6007, Bool;

    // Input
    "ControllerTypeString" => 7000, String;
    "ControllerHandSelectionPriorityInt32" => 7002, Int32;
};

static BY_NAME: Lazy<HashMap<&'static str, PropertyInfo>> =
    Lazy::new(|| PROPERTIES.iter().map(|info| (info.name, *info)).collect());

/// Resolve a property name to its host key and stored type
pub fn lookup_property(name: &str) -> Option<PropertyInfo> {
    BY_NAME.get(name).copied()
}

/// Whole table, in key order
pub fn property_table() -> &'static [PropertyInfo] {
    PROPERTIES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_known_names() {
        let info = lookup_property("DisplayFrequencyFloat").unwrap();
        assert_eq!(info.key, PropertyKey(2002));
        assert_eq!(info.ty, PropertyType::Float);

        let info = lookup_property("ControllerRoleHintInt32").unwrap();
        assert_eq!(info.key, PropertyKey(3007));
        assert_eq!(info.ty, PropertyType::Int32);
    }

    #[test]
    fn test_lookup_unknown_name() {
        assert!(lookup_property("NotARealPropertyString").is_none());
        assert!(lookup_property("").is_none());
    }

    #[test]
    fn test_table_has_unique_names_and_keys() {
        let names: HashSet<_> = PROPERTIES.iter().map(|p| p.name).collect();
        let keys: HashSet<_> = PROPERTIES.iter().map(|p| p.key).collect();
        assert_eq!(names.len(), PROPERTIES.len());
        assert_eq!(keys.len(), PROPERTIES.len());
    }

    #[test]
    fn test_table_is_sorted_by_key() {
        assert!(PROPERTIES.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn test_name_suffix_matches_type() {
        for info in PROPERTIES {
            let suffix = match info.ty {
                PropertyType::Bool => "Bool",
                PropertyType::Float => "Float",
                PropertyType::Int32 => "Int32",
                PropertyType::Uint64 => "Uint64",
                PropertyType::Vector3 => "Vector3",
                PropertyType::Double => "Double",
                PropertyType::String => "String",
            };
            assert!(info.name.ends_with(suffix), "{} is not {:?}", info.name, info.ty);
        }
    }
}
