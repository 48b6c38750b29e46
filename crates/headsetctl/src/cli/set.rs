//! `set` subcommand: apply one setting to the selected headsets.

use super::{
    Capability, CapabilityKind, Config, DeviceReport, FeatureRequest, FeatureStatus, Globals,
    HeadsetError, HidBackend, ReportJson, ReportsOutput, Result, batch, batch_options, discover,
    load_config, no_headset_error, open_backend, print_json, print_reports, registry,
};
use headsetctl_lib::params::parse_param;

/// Resolve the capability argument of `set`. Only actions are settable.
fn settable(name: &str) -> Result<Capability> {
    let cap = Capability::from_name(name).ok_or_else(|| {
        HeadsetError::Config(format!(
            "Unknown capability \"{name}\" (see `headsetctl capabilities`)"
        ))
    })?;
    if cap.kind() != CapabilityKind::Action {
        return Err(HeadsetError::Config(format!(
            "{} is read-only, use `headsetctl status`",
            cap.name()
        )));
    }
    Ok(cap)
}

fn apply(
    backend: &dyn HidBackend,
    config: &Config,
    cap: Capability,
    value: &str,
) -> Result<Vec<DeviceReport>> {
    let request = FeatureRequest::new(cap, parse_param(cap, value)?);
    let headsets = discover(backend, registry::initialize(), config)?;
    if headsets.is_empty() {
        return Err(no_headset_error(config));
    }
    batch::run_batch(&headsets, backend, &[request], batch_options(config, false))
}

/// Fails when any headset reported an error or none applied the setting.
fn outcome(reports: &[DeviceReport]) -> Result<()> {
    let results = || reports.iter().flat_map(|r| r.results.iter());
    let errors = results()
        .filter(|r| matches!(r.status, FeatureStatus::Error | FeatureStatus::DeviceFailedOpen))
        .count();
    if errors > 0 {
        return Err(HeadsetError::Request(format!(
            "setting failed on {errors} headset{}",
            if errors == 1 { "" } else { "s" }
        )));
    }
    if !results().any(|r| r.is_success()) {
        let hint = results()
            .map(|r| r.message.as_str())
            .find(|m| !m.is_empty())
            .unwrap_or("no headset applied the setting");
        return Err(HeadsetError::Request(hint.to_string()));
    }
    Ok(())
}

pub(super) fn cmd_set(globals: &Globals, capability: &str, value: &str) -> Result<()> {
    let cap = settable(capability)?;
    let config = load_config(globals)?;
    let backend = open_backend(&config)?;
    let reports = apply(backend.as_ref(), &config, cap, value)?;

    if globals.json {
        let output = ReportsOutput {
            version: env!("CARGO_PKG_VERSION"),
            device_count: reports.len(),
            devices: reports.iter().map(ReportJson::from_report).collect(),
        };
        print_json(&output)?;
    } else {
        print_reports(&reports);
    }
    outcome(&reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use headsetctl_lib::batch::MULTIPLE_DEVICES_HINT;
    use headsetctl_lib::hid::mock::{FakeBackend, entry};

    fn test_config(profile: u8) -> Config {
        Config {
            test_device: true,
            test_profile: profile,
            ..Config::default()
        }
    }

    #[test]
    fn settable_capabilities() {
        assert_eq!(settable("sidetone").unwrap(), Capability::Sidetone);
        assert_eq!(settable("s").unwrap(), Capability::Sidetone);
        assert!(settable("battery").unwrap_err().to_string().contains("read-only"));
        assert!(settable("volume").unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn set_on_test_device() {
        let backend = FakeBackend::new(vec![]);
        let reports = apply(&backend, &test_config(0), Capability::Sidetone, "64").unwrap();
        assert_eq!(reports[0].results[0].value, 64);
        assert!(outcome(&reports).is_ok());
    }

    #[test]
    fn bad_value_fails_before_discovery() {
        let backend = FakeBackend::new(vec![]);
        assert!(apply(&backend, &test_config(0), Capability::Sidetone, "loud").is_err());
    }

    #[test]
    fn device_error_fails_the_command() {
        let backend = FakeBackend::new(vec![]);
        let reports = apply(&backend, &test_config(1), Capability::Sidetone, "64").unwrap();
        assert!(outcome(&reports).is_err());
    }

    #[test]
    fn ambiguous_setting_reports_hint() {
        let backend = FakeBackend::new(vec![entry(0x046d, 0x0a66, 3, 0xff00, 0x0001)]);
        let reports = apply(&backend, &test_config(0), Capability::Sidetone, "64").unwrap();
        assert_eq!(reports.len(), 2);
        let err = outcome(&reports).unwrap_err();
        assert!(err.to_string().contains(MULTIPLE_DEVICES_HINT));
        assert_eq!(backend.state.io_count(), 0);
    }
}
