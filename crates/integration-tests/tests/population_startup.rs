//! Whole-population startup and teardown through the orchestrator.

use device_core::{DeviceType, Oid};
use device_fleet::{
    FleetStartup, LazyDevicePool, PoolConfig, SnmpQuery, StartupOptions, SyntheticProfiles,
};
use std::sync::Arc;

fn startup(max_devices: usize) -> FleetStartup {
    let pool = LazyDevicePool::new(
        PoolConfig {
            idle_timeout_ms: 60_000,
            max_devices,
            reaper_interval_ms: None,
        },
        Arc::new(SyntheticProfiles),
    );
    FleetStartup::new(pool)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_population_comes_up_and_answers() {
    let fleet = startup(10_000);
    let opts = StartupOptions::with_port_range(30_000, 30_199);

    let result = fleet.start_device_mix("medium_test", &opts).await.unwrap();
    assert_eq!(result.total_devices, 135);
    assert_eq!(result.per_type_created[&DeviceType::CableModem], 100);
    assert_eq!(result.per_type_created[&DeviceType::Mta], 20);
    assert_eq!(result.per_type_created[&DeviceType::Switch], 10);
    assert_eq!(result.per_type_created[&DeviceType::Router], 5);
    assert!(result.failures.is_empty());

    // The first modem and the first switch answer queries
    let modem = fleet.pool().get_or_create_device(30_000).await.unwrap();
    assert_eq!(modem.device_type(), DeviceType::CableModem);
    let reply = modem
        .handle_snmp(SnmpQuery::new([Oid::from("1.3.6.1.2.1.1.1.0")]))
        .await
        .unwrap();
    assert_eq!(
        reply.varbinds[0].value.as_ref().and_then(|v| v.as_text()),
        Some("DOCSIS 3.1 cable modem")
    );

    let switch = fleet.pool().get_or_create_device(30_120).await.unwrap();
    assert_eq!(switch.device_type(), DeviceType::Switch);

    // Re-creating an already-started device did not create a second actor
    assert_eq!(fleet.pool().get_stats().devices_created_total, 135);
}

#[tokio::test]
async fn status_tracks_population_lifecycle() {
    let fleet = startup(10_000);
    let opts = StartupOptions::with_port_range(31_000, 31_099);

    let before = fleet.get_startup_status();
    assert_eq!(before.active_devices, 0);
    assert!(before.started_at.is_none());

    fleet.start_device_mix("small_test", &opts).await.unwrap();
    let during = fleet.get_startup_status();
    assert_eq!(during.active_devices, 12);
    assert!(during.started_at.is_some());
    assert!(during.last_error.is_none());

    fleet.shutdown_device_population();
    let after = fleet.get_startup_status();
    assert_eq!(after.active_devices, 0);
    assert!(after.started_at.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn capped_pool_reports_incomplete_population() {
    let fleet = startup(20);
    let opts = StartupOptions::with_port_range(32_000, 32_099);

    let err = fleet
        .start_device_population(&[(DeviceType::CableModem, 100)], &opts)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        device_fleet::FleetError::PopulationIncomplete {
            created: 20,
            requested: 100,
        }
    ));

    // The devices that did come up stay usable
    let status = fleet.get_startup_status();
    assert_eq!(status.active_devices, 20);
    assert!(status.last_error.is_some());
}
