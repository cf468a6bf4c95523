//! Configuration validation
//!
//! Rules:
//! - device paths are non-empty, absolute and unique
//! - at most one enabled device per kind
//! - property names exist in the host key table
//! - property types match the type the host stores under that key
//! - property names are unique within a device
//! - clock filter noise terms are > 0

use std::collections::HashSet;

use contracts::{lookup_property, ContractError, DriverConfig};

/// Validate a DriverConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DriverConfig) -> Result<(), ContractError> {
    validate_device_paths(config)?;
    validate_device_kinds(config)?;
    validate_properties(config)?;
    validate_clock(config)?;
    Ok(())
}

fn validate_device_paths(config: &DriverConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, device) in config.devices.iter().enumerate() {
        if !device.path.starts_with('/') {
            return Err(ContractError::config_validation(
                format!("devices[{idx}].path"),
                format!("device path must be absolute, got '{}'", device.path),
            ));
        }
        if !seen.insert(device.path.as_str()) {
            return Err(ContractError::config_validation(
                format!("devices[path={}]", device.path),
                "duplicate device path",
            ));
        }
    }
    Ok(())
}

fn validate_device_kinds(config: &DriverConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for device in config.enabled_devices() {
        if !seen.insert(device.kind) {
            return Err(ContractError::config_validation(
                format!("devices[path={}].kind", device.path),
                format!("more than one enabled {:?} device", device.kind),
            ));
        }
    }
    Ok(())
}

fn validate_properties(config: &DriverConfig) -> Result<(), ContractError> {
    for device in &config.devices {
        let mut names = HashSet::new();
        for prop in &device.properties {
            let field = format!("devices[{}].properties[{}]", device.path, prop.name);

            let Some(info) = lookup_property(&prop.name) else {
                return Err(ContractError::config_validation(
                    field,
                    "unknown property name",
                ));
            };

            if info.ty != prop.ty {
                return Err(ContractError::config_validation(
                    field,
                    format!("property is stored as {}, configured as {}", info.ty, prop.ty),
                ));
            }

            if !names.insert(prop.name.as_str()) {
                return Err(ContractError::config_validation(
                    field,
                    "duplicate property name",
                ));
            }
        }
    }
    Ok(())
}

fn validate_clock(config: &DriverConfig) -> Result<(), ContractError> {
    let clock = &config.clock;
    if clock.process_noise <= 0.0 {
        return Err(ContractError::config_validation(
            "clock.process_noise",
            format!("process_noise must be > 0, got {}", clock.process_noise),
        ));
    }
    if clock.measurement_noise <= 0.0 {
        return Err(ContractError::config_validation(
            "clock.measurement_noise",
            format!(
                "measurement_noise must be > 0, got {}",
                clock.measurement_noise
            ),
        ));
    }
    if !clock.resync_threshold_ms.is_finite() || clock.resync_threshold_ms <= 0.0 {
        return Err(ContractError::config_validation(
            "clock.resync_threshold_ms",
            format!(
                "resync_threshold_ms must be > 0, got {}",
                clock.resync_threshold_ms
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ClockConfig, ConfigVersion, DeviceConfig, DeviceKind, DevicePath, PropertyDescriptor,
    };

    fn minimal_config() -> DriverConfig {
        DriverConfig {
            version: ConfigVersion::V1,
            clock: ClockConfig::default(),
            devices: vec![
                DeviceConfig {
                    path: DevicePath::new(DevicePath::HEAD),
                    kind: DeviceKind::Hmd,
                    enabled: true,
                    properties: vec![
                        PropertyDescriptor::float("DisplayFrequencyFloat", 90.0),
                        PropertyDescriptor::string("ModelNumberString", "Remote HMD"),
                    ],
                },
                DeviceConfig {
                    path: DevicePath::new(DevicePath::LEFT_HAND),
                    kind: DeviceKind::LeftController,
                    enabled: true,
                    properties: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_duplicate_device_path() {
        let mut config = minimal_config();
        let mut dup = config.devices[0].clone();
        dup.kind = DeviceKind::RightController;
        config.devices.push(dup);
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate device path"), "got: {err}");
    }

    #[test]
    fn test_relative_device_path() {
        let mut config = minimal_config();
        config.devices[1].path = DevicePath::new("user/hand/left");
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("must be absolute"), "got: {err}");
    }

    #[test]
    fn test_two_enabled_hmds() {
        let mut config = minimal_config();
        config.devices[1].kind = DeviceKind::Hmd;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("more than one enabled Hmd"), "got: {err}");
    }

    #[test]
    fn test_disabled_duplicate_kind_is_allowed() {
        let mut config = minimal_config();
        config.devices[1].kind = DeviceKind::Hmd;
        config.devices[1].enabled = false;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_property_name() {
        let mut config = minimal_config();
        config.devices[0]
            .properties
            .push(PropertyDescriptor::bool("MadeUpPropertyBool", true));
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("unknown property name"), "got: {err}");
    }

    #[test]
    fn test_property_type_mismatch() {
        let mut config = minimal_config();
        config.devices[0]
            .properties
            .push(PropertyDescriptor::double("UserIpdMetersFloat", 0.063));
        let err = validate(&config).unwrap_err().to_string();
        assert!(
            err.contains("stored as float, configured as double"),
            "got: {err}"
        );
    }

    #[test]
    fn test_duplicate_property_name() {
        let mut config = minimal_config();
        config.devices[0]
            .properties
            .push(PropertyDescriptor::float("DisplayFrequencyFloat", 120.0));
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate property name"), "got: {err}");
    }

    #[test]
    fn test_non_positive_clock_noise() {
        let mut config = minimal_config();
        config.clock.measurement_noise = 0.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("measurement_noise must be > 0"), "got: {err}");
    }

    #[test]
    fn test_non_positive_resync_threshold() {
        let mut config = minimal_config();
        config.clock.resync_threshold_ms = f64::NAN;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("resync_threshold_ms must be > 0"), "got: {err}");
    }
}
