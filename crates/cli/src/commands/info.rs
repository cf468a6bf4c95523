//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{property_table, DriverConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    clock: ClockInfo,
    devices: Vec<DeviceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    property_keys: Vec<KeyInfo>,
}

#[derive(Serialize)]
struct ClockInfo {
    process_noise: f64,
    measurement_noise: f64,
    resync_threshold_ms: f64,
}

#[derive(Serialize)]
struct DeviceInfo {
    path: String,
    kind: String,
    enabled: bool,
    property_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct KeyInfo {
    name: &'static str,
    key: u32,
    #[serde(rename = "type")]
    ty: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args)?;
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &DriverConfig, args: &InfoArgs) -> Result<ConfigInfo> {
    let mut devices = Vec::with_capacity(config.devices.len());
    for device in &config.devices {
        let properties = if args.properties {
            device
                .properties
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to serialize property")?
        } else {
            Vec::new()
        };

        devices.push(DeviceInfo {
            path: device.path.to_string(),
            kind: format!("{:?}", device.kind),
            enabled: device.enabled,
            property_count: device.properties.len(),
            properties,
        });
    }

    let property_keys = if args.keys {
        property_table()
            .iter()
            .map(|info| KeyInfo {
                name: info.name,
                key: info.key.0,
                ty: info.ty.to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(ConfigInfo {
        version: format!("{:?}", config.version),
        clock: ClockInfo {
            process_noise: config.clock.process_noise,
            measurement_noise: config.clock.measurement_noise,
            resync_threshold_ms: config.clock.resync_threshold_ms,
        },
        devices,
        property_keys,
    })
}

fn print_config_info(config: &DriverConfig, args: &InfoArgs) {
    println!("=== Tracker Bridge Configuration ===\n");

    println!("Clock");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Process noise: {:e}", config.clock.process_noise);
    println!("   ├─ Measurement noise: {:e}", config.clock.measurement_noise);
    println!("   └─ Resync threshold: {} ms", config.clock.resync_threshold_ms);

    println!("\nDevices ({})", config.devices.len());
    for (i, device) in config.devices.iter().enumerate() {
        let is_last = i == config.devices.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };
        let state = if device.enabled { "" } else { ", disabled" };

        println!("   {} {} ({:?}{})", prefix, device.path, device.kind, state);

        if args.properties && !device.properties.is_empty() {
            for (j, prop) in device.properties.iter().enumerate() {
                let prop_prefix = if j == device.properties.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {}  {} {}: {} = {:?}",
                    child_prefix, prop_prefix, prop.name, prop.ty, prop.value
                );
            }
        } else {
            println!(
                "   {}  └─ {} properties",
                child_prefix,
                device.properties.len()
            );
        }
    }

    if args.keys {
        let table = property_table();
        println!("\nProperty keys ({})", table.len());
        for info in table {
            println!("   {:>6}  {:<40} {}", info.key.0, info.name, info.ty);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> DriverConfig {
        config_loader::ConfigLoader::load_from_str(
            r#"
[[devices]]
path = "/user/head"
kind = "hmd"

[[devices.properties]]
name = "ModelNumberString"
type = "string"
value = "Remote HMD"
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap()
    }

    fn args(properties: bool, keys: bool) -> InfoArgs {
        InfoArgs {
            config: PathBuf::from("config.toml"),
            json: true,
            properties,
            keys,
        }
    }

    #[test]
    fn test_info_without_details() {
        let info = build_config_info(&config(), &args(false, false)).unwrap();
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["devices"][0]["path"], "/user/head");
        assert_eq!(json["devices"][0]["property_count"], 1);
        assert!(json["devices"][0].get("properties").is_none());
        assert!(json.get("property_keys").is_none());
    }

    #[test]
    fn test_info_with_properties_and_keys() {
        let info = build_config_info(&config(), &args(true, true)).unwrap();
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["devices"][0]["properties"][0]["name"], "ModelNumberString");
        let keys = json["property_keys"].as_array().unwrap();
        assert_eq!(keys.len(), property_table().len());
    }
}
