//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract sanity checks
//! - Config file to host delivery with mock and replayed motion
//! - Property binder behavior under host failures

#[cfg(test)]
mod contract_tests {
    use contracts::{property_table, DriverPose, TrackingResult};

    #[test]
    fn test_property_table_sorted_by_key() {
        let table = property_table();
        assert!(!table.is_empty());
        assert!(table.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn test_cleared_pose_is_floor_state() {
        let pose = DriverPose::cleared();
        assert_eq!(pose.tracking_result, TrackingResult::Uninitialized);
        assert!(!pose.is_live());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        DevicePath, DriverConfig, PropertyDescriptor, PropertyError, PropertyType, PropertyValue,
        TrackingResult,
    };
    use device_driver::{
        DeviceRegistry, InitError, MockDriverHost, MockHostConfig, TrackedDeviceDriver,
    };
    use motion_stream::{
        ClockEstimator, MockMotionConfig, MockMotionSource, ReplayConfig, ReplayMotionSource,
        TrackingRouter,
    };

    const CONFIG: &str = r#"
version = "V1"

[clock]
process_noise = 1e-4
measurement_noise = 1e-3

[[devices]]
path = "/user/head"
kind = "hmd"

[[devices.properties]]
name = "ModelNumberString"
type = "string"
value = "Remote HMD"

[[devices.properties]]
name = "DisplayFrequencyFloat"
type = "float"
value = 120.0

[[devices]]
path = "/user/hand/left"
kind = "left_controller"

[[devices.properties]]
name = "SerialNumberString"
type = "string"
value = "LHR-0001"

[[devices]]
path = "/user/hand/right"
kind = "right_controller"
enabled = false
"#;

    fn load_config() -> DriverConfig {
        ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap()
    }

    struct Bridge {
        host: Arc<MockDriverHost>,
        clock: Arc<ClockEstimator>,
        registry: DeviceRegistry,
    }

    fn bridge(config: &DriverConfig, host_config: MockHostConfig) -> Bridge {
        let host = Arc::new(MockDriverHost::with_config(host_config));
        let clock = Arc::new(ClockEstimator::new(config.clock.clone()));
        let registry = DeviceRegistry::from_config(
            config,
            host.clone(),
            Arc::new(config.clone()),
            clock.clone(),
        )
        .unwrap();
        Bridge {
            host,
            clock,
            registry,
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        condition()
    }

    /// Config file -> registry -> host activation -> mock motion -> host poses
    #[test]
    fn test_e2e_mock_motion() {
        let config = load_config();
        let bridge = bridge(&config, MockHostConfig::default());
        assert_eq!(bridge.registry.len(), 2);

        let head = bridge.registry.driver(DevicePath::HEAD).unwrap();
        let left = bridge.registry.driver(DevicePath::LEFT_HAND).unwrap();
        let head_index = bridge.host.add_device(head.as_ref()).unwrap();
        let left_index = bridge.host.add_device(left.as_ref()).unwrap();

        // Dashboard value overrides the HMD default
        assert_eq!(
            bridge.host.property_by_name(head_index, "DisplayFrequencyFloat"),
            Some(PropertyValue::Float(120.0))
        );
        assert_eq!(
            bridge.host.property_by_name(left_index, "SerialNumberString"),
            Some(PropertyValue::String("LHR-0001".into()))
        );

        let mut router = TrackingRouter::new(bridge.clock.clone());
        for path in [DevicePath::HEAD, DevicePath::LEFT_HAND] {
            let device = DevicePath::new(path);
            let source = MockMotionSource::new(
                device.clone(),
                MockMotionConfig {
                    rate_hz: 250.0,
                    ..MockMotionConfig::for_device(&device)
                },
            );
            router
                .register(
                    Box::new(source),
                    bridge.registry.require_pose_target(path).unwrap(),
                )
                .unwrap();
        }
        router.start_all();

        assert!(wait_for(|| {
            bridge.host.pose_count(head_index) >= 10 && bridge.host.pose_count(left_index) >= 10
        }));
        router.stop_all();

        let pose = bridge.host.latest_pose(head_index).unwrap();
        assert!(pose.is_live());
        assert_eq!(pose.tracking_result, TrackingResult::RunningOk);
        assert!((pose.position.y - 1.6).abs() < 0.1);
        // Estimated client clock keeps the offset near zero for a local source
        assert!(pose.time_offset.abs() < 0.5, "offset {}", pose.time_offset);

        let left_pose = bridge.host.latest_pose(left_index).unwrap();
        assert!(left_pose.position.x < 0.0);

        assert_eq!(bridge.clock.snapshot().len(), 2);
        assert!(router.metrics().snapshot().motion_received >= 20);

        bridge.registry.deactivate_all();
        assert!(!head.get_pose().is_live());
    }

    /// Tracking loss in the stream clears the host pose
    #[test]
    fn test_e2e_tracking_loss_clears_pose() {
        let config = load_config();
        let bridge = bridge(
            &config,
            MockHostConfig {
                record_pose_history: true,
                ..Default::default()
            },
        );
        let left = bridge.registry.driver(DevicePath::LEFT_HAND).unwrap();
        let index = bridge.host.add_device(left.as_ref()).unwrap();

        let device = DevicePath::new(DevicePath::LEFT_HAND);
        let mut router = TrackingRouter::new(bridge.clock.clone());
        router
            .register(
                Box::new(MockMotionSource::new(
                    device.clone(),
                    MockMotionConfig {
                        rate_hz: 250.0,
                        lost_every: Some(4),
                        ..MockMotionConfig::for_device(&device)
                    },
                )),
                bridge.registry.require_pose_target(DevicePath::LEFT_HAND).unwrap(),
            )
            .unwrap();
        router.start_all();

        assert!(wait_for(|| router.metrics().snapshot().tracking_lost >= 2));
        router.stop_all();

        let metrics = router.metrics().snapshot();
        assert!(metrics.motion_received >= 3 * metrics.tracking_lost);

        // Every fourth delivery is the cleared pose
        let history = bridge.host.pose_history(index);
        assert!(history.len() >= 8);
        assert!(history[..3].iter().all(|pose| pose.is_live()));
        assert!(!history[3].is_live());
        assert_eq!(history[3].tracking_result, TrackingResult::Uninitialized);
        assert!(history[4].is_live());
    }

    /// Host rejections are skipped, the rest of the properties still land
    #[test]
    fn test_e2e_host_rejection_is_not_fatal() {
        let config = load_config();
        let model = contracts::lookup_property("ModelNumberString").unwrap();
        let bridge = bridge(
            &config,
            MockHostConfig {
                reject_keys: vec![(model.key, PropertyError::PermissionDenied)],
                ..Default::default()
            },
        );

        let head = bridge.registry.driver(DevicePath::HEAD).unwrap();
        let index = bridge.host.add_device(head.as_ref()).unwrap();

        assert!(head.core().is_active());
        assert_eq!(bridge.host.property_by_name(index, "ModelNumberString"), None);
        assert_eq!(
            bridge.host.property_by_name(index, "DisplayFrequencyFloat"),
            Some(PropertyValue::Float(120.0))
        );

        let rejected: Vec<_> = bridge
            .host
            .setter_calls()
            .into_iter()
            .filter(|call| !call.accepted)
            .collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].key, model.key);
    }

    /// A descriptor whose tag the binder cannot dispatch aborts activation
    #[test]
    fn test_e2e_unrecognized_type_aborts_activation() {
        let mut config = load_config();
        config.devices[0].properties.push(PropertyDescriptor::tagged(
            "ManufacturerNameString",
            PropertyType::Bool,
            PropertyValue::String("Acme".into()),
        ));

        let bridge = bridge(&config, MockHostConfig::default());
        let head = bridge.registry.driver(DevicePath::HEAD).unwrap();

        let err = bridge.host.add_device(head.as_ref()).unwrap_err();
        assert!(matches!(err, InitError::PropertyConfig { .. }));
        assert!(!head.core().is_active());

        // The other device is unaffected
        let left = bridge.registry.driver(DevicePath::LEFT_HAND).unwrap();
        assert!(bridge.host.add_device(left.as_ref()).is_ok());
    }

    /// Recorded motion replayed into the head
    #[tokio::test]
    async fn test_e2e_replay() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        for i in 0..30u64 {
            writeln!(
                file,
                r#"{{"device": "/user/head", "timestamp_ns": {}, "position": [0, {}, 0], "orientation": [1, 0, 0, 0], "linear_velocity": [0, 0.1, 0], "angular_velocity": [0, 0, 0]}}"#,
                5_000_000_000 + i * 1_000_000,
                1.5 + i as f64 * 0.001
            )
            .unwrap();
        }
        writeln!(file, r#"{{"device": "/user/head", "timestamp_ns": 5030000000, "lost": true}}"#)
            .unwrap();

        let config = load_config();
        let bridge = bridge(&config, MockHostConfig {
            record_pose_history: true,
            ..Default::default()
        });
        let head = bridge.registry.driver(DevicePath::HEAD).unwrap();
        let index = bridge.host.add_device(head.as_ref()).unwrap();

        let source = ReplayMotionSource::load(
            file.path(),
            DevicePath::new(DevicePath::HEAD),
            ReplayConfig {
                speed_multiplier: 4.0,
                loop_playback: false,
            },
        )
        .unwrap();
        assert_eq!(source.len(), 31);

        let mut router = TrackingRouter::new(bridge.clock.clone());
        router
            .register(
                Box::new(source),
                bridge.registry.require_pose_target(DevicePath::HEAD).unwrap(),
            )
            .unwrap();
        router.start_all();

        for _ in 0..100 {
            if !router.is_listening(DevicePath::HEAD) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        router.stop_all();

        let history = bridge.host.pose_history(index);
        // 30 live poses followed by the cleared pose
        assert_eq!(history.len(), 31);
        assert!(history[..30].iter().all(|pose| pose.is_live()));
        assert!((history[29].position.y - 1.529).abs() < 1e-9);
        assert_eq!(history[29].velocity.y, 0.1);
        assert!(!history[30].is_live());
        assert!(!head.get_pose().is_live());

        let metrics = router.metrics().snapshot();
        assert_eq!(metrics.motion_received, 30);
        assert_eq!(metrics.with_velocity, 30);
        assert_eq!(metrics.tracking_lost, 1);
    }

    /// Devices feed the pose aggregator used by run summaries
    #[test]
    fn test_pose_aggregator_over_registry() {
        let config = load_config();
        let bridge = bridge(&config, MockHostConfig::default());
        for driver in bridge.registry.drivers() {
            bridge.host.add_device(driver.as_ref()).unwrap();
        }

        let mut aggregator = observability::PoseMetricsAggregator::new();
        for (path, pose) in bridge.registry.poses() {
            aggregator.update(&path, &pose);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.samples, 2);
        assert!(summary.devices.iter().all(|d| d.live == 0 && d.cleared == 1));
    }
}
