//! `status` subcommand: query every readable capability.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use super::{
    Capability, CapabilityKind, Config, DeviceReport, FeatureRequest, Globals, HeadsetError,
    HidBackend, OverallStatus, RUNNING, ReportJson, ReportsOutput, Result, batch, batch_options,
    discover, load_config, no_headset_error, open_backend, print_json, print_reports, registry,
};

/// One query per info capability.
fn status_requests() -> Vec<FeatureRequest> {
    Capability::ALL
        .into_iter()
        .filter(|c| c.kind() == CapabilityKind::Info)
        .map(FeatureRequest::query)
        .collect()
}

fn run_pass(backend: &dyn HidBackend, config: &Config) -> Result<Vec<DeviceReport>> {
    let headsets = discover(backend, registry::initialize(), config)?;
    if headsets.is_empty() {
        return Err(no_headset_error(config));
    }
    batch::run_batch(
        &headsets,
        backend,
        &status_requests(),
        batch_options(config, true),
    )
}

fn print_pass(reports: &[DeviceReport], json: bool) -> Result<()> {
    if json {
        let output = ReportsOutput {
            version: env!("CARGO_PKG_VERSION"),
            device_count: reports.len(),
            devices: reports.iter().map(ReportJson::from_report).collect(),
        };
        return print_json(&output);
    }
    print_reports(reports);
    Ok(())
}

fn failed_requests(reports: &[DeviceReport]) -> usize {
    reports
        .iter()
        .filter(|r| r.status != OverallStatus::Success)
        .flat_map(|r| r.processed())
        .filter(|r| !r.is_success())
        .count()
}

/// Sleep up to `interval`, returning early once Ctrl+C was pressed.
fn wait(interval: Duration) {
    let start = Instant::now();
    while RUNNING.load(Ordering::SeqCst) && start.elapsed() < interval {
        std::thread::sleep(Duration::from_millis(100).min(interval));
    }
}

pub(super) fn cmd_status(globals: &Globals, follow: Option<u64>) -> Result<()> {
    let config = load_config(globals)?;
    let backend = open_backend(&config)?;

    let Some(secs) = follow else {
        let reports = run_pass(backend.as_ref(), &config)?;
        print_pass(&reports, globals.json)?;
        return match failed_requests(&reports) {
            0 => Ok(()),
            n => Err(HeadsetError::Request(format!(
                "{n} request{} failed",
                if n == 1 { "" } else { "s" }
            ))),
        };
    };

    let secs = if secs == 0 {
        config.follow_interval_secs
    } else {
        secs
    };
    let interval = Duration::from_secs(secs);
    log::info!("following every {secs}s, press Ctrl+C to stop");

    let mut first = true;
    while RUNNING.load(Ordering::SeqCst) {
        if !first && !globals.json {
            println!();
        }
        first = false;
        match run_pass(backend.as_ref(), &config) {
            Ok(reports) => print_pass(&reports, globals.json)?,
            Err(e) => eprintln!("{e}"),
        }
        wait(interval);
    }
    Ok(())
}
