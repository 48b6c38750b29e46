//! `connected` subcommand: is a headset attached and powered on?

use serde::Serialize;

use super::{
    Capability, Config, Globals, HidBackend, Result, discover, load_config, open_backend,
    print_json, registry,
};
use headsetctl_lib::dispatch::{FeatureParam, execute};
use headsetctl_lib::result::BatteryStatus;

#[derive(Serialize)]
struct ConnectedOutput {
    connected: bool,
}

/// True when the first matching headset answers its battery query with a
/// usable level. Headsets without a battery query count when attached.
fn is_connected(backend: &dyn HidBackend, config: &Config) -> Result<bool> {
    let headsets = discover(backend, registry::initialize(), config)?;
    let Some(headset) = headsets.first() else {
        return Ok(false);
    };
    let mut instance = headset.instance(backend, config.dispatch_options());
    if !instance.supports(Capability::Battery) {
        return Ok(true);
    }
    let result = execute(&mut instance, Capability::Battery, &FeatureParam::None);
    Ok(matches!(
        result.battery_status(),
        Some(BatteryStatus::Available | BatteryStatus::Charging)
    ))
}

pub(super) fn cmd_connected(globals: &Globals) -> Result<()> {
    let config = load_config(globals)?;
    let backend = open_backend(&config)?;
    let connected = is_connected(backend.as_ref(), &config)?;
    if globals.json {
        return print_json(&ConnectedOutput { connected });
    }
    println!("{connected}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use headsetctl_lib::hid::mock::FakeBackend;

    fn test_config(profile: u8) -> Config {
        Config {
            test_device: true,
            test_profile: profile,
            ..Config::default()
        }
    }

    #[test]
    fn test_device_is_connected() {
        let backend = FakeBackend::new(vec![]);
        assert!(is_connected(&backend, &test_config(0)).unwrap());
        assert!(is_connected(&backend, &test_config(2)).unwrap());
    }

    #[test]
    fn offline_battery_means_disconnected() {
        let backend = FakeBackend::new(vec![]);
        assert!(!is_connected(&backend, &test_config(4)).unwrap());
        assert!(!is_connected(&backend, &test_config(1)).unwrap());
    }

    #[test]
    fn nothing_attached() {
        let backend = FakeBackend::new(vec![]);
        assert!(!is_connected(&backend, &Config::default()).unwrap());
    }
}
