//! CLI subcommands: discovery, capability queries and settings.

mod capabilities;
mod config_cmd;
mod connected;
mod devices;
mod set;
mod status;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use headsetctl_lib::batch::{self, BatchOptions, DeviceReport, OverallStatus};
pub(super) use headsetctl_lib::capability::{Capability, CapabilityKind, Platforms};
pub(super) use headsetctl_lib::config::Config;
pub(super) use headsetctl_lib::discovery::{DiscoveredHeadset, discover};
pub(super) use headsetctl_lib::dispatch::{FeatureRequest, FeatureResult, FeatureStatus};
pub(super) use headsetctl_lib::error::{ErrorKind, HeadsetError, HeadsetResult as Result};
pub(super) use headsetctl_lib::hid::{EmptyBackend, HidBackend, HidapiBackend};
pub(super) use headsetctl_lib::registry;
pub(super) use headsetctl_lib::result::{BatteryResult, FeatureOutput, MicStatus};

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{key:<width$}{value}", width = w);
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| HeadsetError::Config(format!("JSON serialization failed: {e}")))?;
    println!("{json_str}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct DeviceJson {
    pub name: String,
    pub vendor: String,
    pub vendor_id: String,
    pub product_id: String,
    pub product: Option<String>,
    pub path: Option<String>,
    pub platforms: Platforms,
    pub capabilities: Vec<&'static str>,
}

impl DeviceJson {
    pub fn from_headset(h: &DiscoveredHeadset<'_>, capabilities: Vec<&'static str>) -> Self {
        DeviceJson {
            name: h.name().to_string(),
            vendor: h.vendor_name().to_string(),
            vendor_id: format!("{:04x}", h.vendor_id),
            product_id: format!("{:04x}", h.product_id),
            product: h.product_string().map(str::to_string),
            path: h.entry.as_ref().map(|e| e.path.clone()),
            platforms: h.device.platforms(),
            capabilities,
        }
    }
}

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub count: usize,
    pub devices: Vec<DeviceJson>,
}

#[derive(Serialize)]
pub(super) struct ErrorJson {
    pub kind: ErrorKind,
    pub message: String,
    pub details: String,
}

#[derive(Serialize)]
pub(super) struct ResultJson<'a> {
    pub capability: &'static str,
    pub status: FeatureStatus,
    pub value: i32,
    pub message: String,
    pub data: Option<&'a FeatureOutput>,
    pub error: Option<ErrorJson>,
}

impl<'a> ResultJson<'a> {
    pub fn from_result(r: &'a FeatureResult) -> Self {
        ResultJson {
            capability: r.capability.cli_name(),
            status: r.status,
            value: r.value,
            message: r.message.clone(),
            data: r.output.as_ref(),
            error: r.error.as_ref().map(|e| ErrorJson {
                kind: e.kind(),
                message: e.message().to_string(),
                details: e.details().to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
pub(super) struct ReportJson<'a> {
    pub device: &'a str,
    pub vendor_id: String,
    pub product_id: String,
    pub status: OverallStatus,
    pub results: Vec<ResultJson<'a>>,
}

impl<'a> ReportJson<'a> {
    pub fn from_report(r: &'a DeviceReport) -> Self {
        ReportJson {
            device: &r.device,
            vendor_id: format!("{:04x}", r.vendor_id),
            product_id: format!("{:04x}", r.product_id),
            status: r.status,
            results: r.results.iter().map(ResultJson::from_result).collect(),
        }
    }
}

#[derive(Serialize)]
pub(super) struct ReportsOutput<'a> {
    pub version: &'static str,
    pub device_count: usize,
    pub devices: Vec<ReportJson<'a>>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

// ── Shared setup ──

/// Global flags shared by every subcommand.
#[derive(Debug, Default)]
pub struct Globals {
    pub json: bool,
    pub device: Option<String>,
    pub test_device: Option<u8>,
    pub timeout_ms: Option<i32>,
    pub config_path: Option<PathBuf>,
}

impl Globals {
    pub(super) fn config_file(&self) -> Option<PathBuf> {
        self.config_path.clone().or_else(Config::path)
    }
}

/// Load the config file and apply command-line overrides.
pub(super) fn load_config(globals: &Globals) -> Result<Config> {
    let (mut config, warnings) = match &globals.config_path {
        Some(p) => Config::load_from(p),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    apply_overrides(&mut config, globals);
    config.validate().map_err(|errors| {
        let list: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        HeadsetError::Config(list.join("; "))
    })?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, globals: &Globals) {
    if let Some(device) = &globals.device {
        config.device = device.clone();
    }
    if let Some(profile) = globals.test_device {
        config.test_device = true;
        config.test_profile = profile;
    }
    if let Some(ms) = globals.timeout_ms {
        config.timeout_ms = ms;
    }
}

/// The host HID stack. Falls back to an empty backend when only the test
/// headset was asked for.
pub(super) fn open_backend(config: &Config) -> Result<Box<dyn HidBackend>> {
    match HidapiBackend::new() {
        Ok(b) => Ok(Box::new(b)),
        Err(e) if config.test_device => {
            log::warn!("HID stack unavailable ({e}), only the test device is usable");
            Ok(Box::new(EmptyBackend))
        }
        Err(e) => Err(e.into()),
    }
}

pub(super) fn batch_options(config: &Config, only_supported_info: bool) -> BatchOptions {
    BatchOptions {
        dispatch: config.dispatch_options(),
        disambiguation: config.disambiguation,
        only_supported_info,
    }
}

pub(super) fn no_headset_error(config: &Config) -> HeadsetError {
    match config.device_filter() {
        Ok(Some(f)) => HeadsetError::Discovery(format!("No supported headset found matching {f}")),
        _ => HeadsetError::Discovery("No supported headset found".into()),
    }
}

/// One-line human description of a capability result.
pub(super) fn describe_result(r: &FeatureResult) -> String {
    match r.status {
        FeatureStatus::Success | FeatureStatus::Info => match &r.output {
            Some(FeatureOutput::Battery(b)) => describe_battery(b),
            Some(FeatureOutput::Equalizer(_)) | Some(FeatureOutput::ParametricEqualizer(_)) => {
                "applied".to_string()
            }
            _ if !r.message.is_empty() => r.message.clone(),
            _ => r.value.to_string(),
        },
        FeatureStatus::NotProcessed if r.message.is_empty() => "not processed".to_string(),
        FeatureStatus::NotProcessed => format!("skipped ({})", r.message),
        FeatureStatus::Error | FeatureStatus::DeviceFailedOpen => format!("error: {}", r.message),
    }
}

fn describe_battery(b: &BatteryResult) -> String {
    let mut out = if b.level_percent >= 0 {
        format!("{}% ({})", b.level_percent, b.status)
    } else {
        b.status.to_string()
    };
    if let Some(mv) = b.voltage_mv {
        out.push_str(&format!(", {mv} mV"));
    }
    if let Some(m) = b.time_to_full_min {
        out.push_str(&format!(", {m} min to full"));
    }
    if let Some(m) = b.time_to_empty_min {
        out.push_str(&format!(", {m} min to empty"));
    }
    if b.mic_status == MicStatus::Up {
        out.push_str(", mic up");
    }
    out
}

/// Print reports as `Device:` blocks with one indented line per capability.
pub(super) fn print_reports(reports: &[DeviceReport]) {
    let keys: Vec<String> = reports
        .iter()
        .flat_map(|r| r.results.iter())
        .map(|r| format!("{}:", r.capability.cli_name()))
        .collect();
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let w = kv_width(&["Device:", "Status:"], &key_refs);

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!();
        }
        kv(
            "Device:",
            format_args!(
                "{} [{:04x}:{:04x}]",
                report.device, report.vendor_id, report.product_id
            ),
            w,
        );
        kv_indent("Status:", report.status, w);
        for r in &report.results {
            kv_indent(
                &format!("{}:", r.capability.cli_name()),
                describe_result(r),
                w,
            );
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// List connected headsets
    Devices,

    /// Show every capability and its accepted values
    Capabilities,

    /// Query battery, chat-mix and other readable state
    Status {
        /// Re-run every SECS seconds until Ctrl+C, e.g. `--follow=5` (default: from config)
        #[arg(
            long,
            value_name = "SECS",
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "0"
        )]
        follow: Option<u64>,
    },

    /// Change a setting, e.g. `set sidetone 64` or `set equalizer 0,1,2,...`
    Set {
        /// Capability name (see `capabilities`)
        capability: String,
        /// Value to apply
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print whether a headset is connected and powered on
    Connected,

    /// Show current configuration and file paths
    Config {
        /// Write the effective settings (file plus command-line flags) back
        /// to the config file
        #[arg(long)]
        save: bool,
    },
}

pub fn run(cmd: Command, globals: &Globals) -> Result<()> {
    registry::initialize();
    match cmd {
        Command::Devices => devices::cmd_devices(globals),
        Command::Capabilities => capabilities::cmd_capabilities(globals.json),
        Command::Status { follow } => status::cmd_status(globals, follow),
        Command::Set { capability, value } => set::cmd_set(globals, &capability, &value),
        Command::Connected => connected::cmd_connected(globals),
        Command::Config { save } => config_cmd::cmd_config(globals, save),
    }
}

/// Display form of a config file location.
pub(super) fn display_path(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.display().to_string())
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        let w = kv_width(&["A:"], &["parametric-equalizer:"]);
        // 21 + PADDING + 2 = 25
        assert_eq!(w, 25);
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }

    #[test]
    fn values_align_across_levels() {
        let w = kv_width(&["Device:"], &["battery:"]);
        let top = format_kv("Device:", "V", w);
        let indent = format!("  {:<width$}{}", "battery:", "V", width = w - 2);
        assert_eq!(top.find('V'), indent.find('V'));
    }

    #[test]
    fn format_kv_exact_width() {
        assert_eq!(format_kv("Key:", "value", 10), "Key:      value");
        assert_eq!(format_kv("ExactWidth:", "val", 10), "ExactWidth:val");
    }
}

#[cfg(test)]
mod describe_tests {
    use super::*;
    use headsetctl_lib::error::DeviceError;
    use headsetctl_lib::result::{BatteryStatus, ChatmixResult};

    #[test]
    fn battery_with_extras() {
        let b = BatteryResult {
            voltage_mv: Some(3800),
            time_to_full_min: Some(60),
            ..BatteryResult::new(50, BatteryStatus::Charging)
        };
        let r = FeatureResult::success(Capability::Battery, FeatureOutput::Battery(b));
        assert_eq!(
            describe_result(&r),
            "50% (BATTERY_CHARGING), 3800 mV, 60 min to full"
        );
    }

    #[test]
    fn unknown_level_shows_status_only() {
        let b = BatteryResult::new(-1, BatteryStatus::Charging);
        let r = FeatureResult::success(Capability::Battery, FeatureOutput::Battery(b));
        assert_eq!(describe_result(&r), "BATTERY_CHARGING");
    }

    #[test]
    fn raised_mic_is_mentioned() {
        let b = BatteryResult {
            mic_status: MicStatus::Up,
            ..BatteryResult::new(64, BatteryStatus::Available)
        };
        let r = FeatureResult::success(Capability::Battery, FeatureOutput::Battery(b));
        assert_eq!(describe_result(&r), "64% (BATTERY_AVAILABLE), mic up");
    }

    #[test]
    fn chatmix_uses_message() {
        let c = ChatmixResult {
            level: 64,
            game_volume_percent: 50,
            chat_volume_percent: 50,
        };
        let r = FeatureResult::success(Capability::Chatmix, FeatureOutput::Chatmix(c));
        assert_eq!(describe_result(&r), "Chat-Mix: 64");
    }

    #[test]
    fn errors_and_skips() {
        let r = FeatureResult::error(Capability::Sidetone, DeviceError::timeout("no reply"));
        assert_eq!(describe_result(&r), "error: Operation timed out: no reply");
        let r = FeatureResult::skipped(Capability::Sidetone, "Multiple devices, specify with -d");
        assert_eq!(
            describe_result(&r),
            "skipped (Multiple devices, specify with -d)"
        );
    }
}


#[cfg(test)]
mod json_struct_tests {
    use super::*;
    use headsetctl_lib::error::DeviceError;

    #[test]
    fn result_json_has_expected_fields() {
        let r = FeatureResult::error(Capability::Sidetone, DeviceError::timeout("no reply"));
        let json = serde_json::to_value(ResultJson::from_result(&r)).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        assert_eq!(json["capability"], "sidetone");
        assert_eq!(json["status"], "error");
        assert_eq!(json["value"], -1);
        assert_eq!(json["error"]["kind"], "timeout");
        assert!(json["data"].is_null());
    }
}
