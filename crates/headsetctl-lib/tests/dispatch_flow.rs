//! Integration tests: discovery → batch → dispatch through the public API
//! against the in-memory HID stack.

use headsetctl_lib::batch::{BatchOptions, MULTIPLE_DEVICES_HINT, OverallStatus, run_batch};
use headsetctl_lib::capability::Capability;
use headsetctl_lib::config::{Config, Disambiguation};
use headsetctl_lib::discovery::discover;
use headsetctl_lib::dispatch::{FeatureParam, FeatureRequest, FeatureStatus};
use headsetctl_lib::error::ErrorKind;
use headsetctl_lib::hid::mock::{FakeBackend, entry};
use headsetctl_lib::params::parse_param;
use headsetctl_lib::registry;
use headsetctl_lib::result::BatteryStatus;

fn nova7() -> FakeBackend {
    FakeBackend::new(vec![
        entry(0x1038, 0x2202, 0, 0x000c, 0x0001),
        entry(0x1038, 0x2202, 3, 0xffc0, 0x0001),
    ])
}

/// Status reply: battery 3/4, discharging, game 50 %, chat 50 %.
fn status_reply() -> Vec<u8> {
    vec![0xb0, 0x00, 0x03, 0x02, 50, 50]
}

// ── Full pass on one headset ──

#[test]
fn status_and_set_on_one_headset() {
    let registry = registry::initialize();
    let backend = nova7();
    backend.state.queue_read(status_reply());
    backend.state.queue_read(status_reply());

    let headsets = discover(&backend, registry, &Config::default()).unwrap();
    assert_eq!(headsets.len(), 1);
    assert_eq!(headsets[0].name(), "SteelSeries Arctis Nova 7");

    let requests = [
        FeatureRequest::query(Capability::Battery),
        FeatureRequest::query(Capability::Chatmix),
        FeatureRequest::new(
            Capability::Sidetone,
            parse_param(Capability::Sidetone, "128").unwrap(),
        ),
    ];
    let reports = run_batch(&headsets, &backend, &requests, BatchOptions::default()).unwrap();
    let report = &reports[0];
    assert_eq!(report.status, OverallStatus::Success);

    let battery = &report.results[0];
    assert_eq!(battery.value, 75);
    assert_eq!(battery.battery_status(), Some(BatteryStatus::Available));

    assert_eq!(report.results[1].message, "Chat-Mix: 64");
    assert_eq!(report.results[2].value, 128);

    // every capability shares one routing detail → one handle
    assert_eq!(backend.state.opens(), 1);
    assert_eq!(backend.state.closes.get(), 1);

    let writes = backend.state.writes.borrow();
    assert_eq!(writes.len(), 3);
    let (path, sidetone) = &writes[2];
    assert_eq!(path, &backend.entries[1].path);
    assert_eq!(&sidetone[..2], &[0x00, 0x39]);
    assert_eq!(sidetone.len(), 64);
}

#[test]
fn offline_headset_yields_partial_report() {
    let registry = registry::initialize();
    let backend = nova7();
    backend.state.queue_read(vec![0xb0, 0x00, 0x00, 0x00, 0, 0]);

    let headsets = discover(&backend, registry, &Config::default()).unwrap();
    let requests = [
        FeatureRequest::query(Capability::Battery),
        FeatureRequest::new(Capability::InactiveTime, FeatureParam::Int(30)),
    ];
    let reports = run_batch(&headsets, &backend, &requests, BatchOptions::default()).unwrap();
    let report = &reports[0];
    assert_eq!(report.status, OverallStatus::Partial);
    assert_eq!(report.results[0].error_kind(), Some(ErrorKind::DeviceOffline));
    assert_eq!(
        report.results[0].battery_status(),
        Some(BatteryStatus::Unavailable)
    );
    assert!(report.results[1].is_success());
}

#[test]
fn equalizer_validation_reaches_the_device() {
    let registry = registry::initialize();
    let backend = nova7();
    let headsets = discover(&backend, registry, &Config::default()).unwrap();

    let requests = [FeatureRequest::new(
        Capability::Equalizer,
        parse_param(Capability::Equalizer, "1,2,3").unwrap(),
    )];
    let reports = run_batch(&headsets, &backend, &requests, BatchOptions::default()).unwrap();
    let r = &reports[0].results[0];
    assert_eq!(r.status, FeatureStatus::Error);
    assert_eq!(r.error_kind(), Some(ErrorKind::InvalidParameter));
    assert!(r.message.contains("exactly 10 equalizer bands"));
    assert!(backend.state.writes.borrow().is_empty());
}

// ── Several headsets ──

#[test]
fn test_device_and_real_headset_together() {
    let registry = registry::initialize();
    let backend = nova7();
    backend.state.queue_read(status_reply());
    let config = Config {
        test_device: true,
        test_profile: 2,
        ..Config::default()
    };
    let headsets = discover(&backend, registry, &config).unwrap();
    assert_eq!(headsets.len(), 2);

    let requests = [
        FeatureRequest::query(Capability::Battery),
        FeatureRequest::new(Capability::Lights, FeatureParam::Int(1)),
    ];
    let options = BatchOptions {
        dispatch: config.dispatch_options(),
        disambiguation: config.disambiguation,
        only_supported_info: true,
    };
    let reports = run_batch(&headsets, &backend, &requests, options).unwrap();

    let test = &reports[0];
    assert_eq!(
        test.results[0].battery_status(),
        Some(BatteryStatus::Charging)
    );
    assert_eq!(test.results[1].message, MULTIPLE_DEVICES_HINT);

    let nova = &reports[1];
    assert_eq!(nova.results[0].value, 75);
    assert_eq!(nova.results[1].status, FeatureStatus::NotProcessed);
    assert_eq!(nova.status, OverallStatus::Partial);
}

#[test]
fn error_policy_stops_before_io() {
    let registry = registry::initialize();
    let backend = nova7();
    let config = Config {
        test_device: true,
        disambiguation: Disambiguation::Error,
        ..Config::default()
    };
    let headsets = discover(&backend, registry, &config).unwrap();
    let requests = [FeatureRequest::new(Capability::Sidetone, FeatureParam::Int(1))];
    let options = BatchOptions {
        disambiguation: config.disambiguation,
        ..BatchOptions::default()
    };
    assert!(run_batch(&headsets, &backend, &requests, options).is_err());
    assert_eq!(backend.state.io_count(), 0);
}
