//! Application configuration: TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::{DEFAULT_TIMEOUT_MS, DispatchOptions};
use crate::discovery::DeviceFilter;
use crate::error::{HeadsetError, HeadsetResult};

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# headsetctl configuration. Command-line flags override these values.\n\n";

pub const MAX_TIMEOUT_MS: i32 = 100_000;
pub const MAX_FOLLOW_INTERVAL_SECS: u64 = 3600;

/// What to do with action requests when several headsets are connected
/// and no `--device` filter was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disambiguation {
    /// Skip action requests with a hint; info requests run on every device.
    #[default]
    Warn,
    /// Send action requests to the first discovered headset only.
    First,
    /// Refuse to run anything.
    Error,
}

impl Disambiguation {
    pub fn as_str(self) -> &'static str {
        match self {
            Disambiguation::Warn => "warn",
            Disambiguation::First => "first",
            Disambiguation::Error => "error",
        }
    }
}

impl fmt::Display for Disambiguation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HID read timeout in milliseconds. Default: 5000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i32,

    /// Seconds between passes of `status --follow`. Default: 2.
    #[serde(default = "default_follow_interval")]
    pub follow_interval_secs: u64,

    /// Preferred headset as "vid:pid". Empty = every supported headset.
    #[serde(default)]
    pub device: String,

    /// Include the virtual test headset in discovery.
    #[serde(default)]
    pub test_device: bool,

    /// Behaviour profile of the test headset.
    #[serde(default)]
    pub test_profile: u8,

    #[serde(default)]
    pub disambiguation: Disambiguation,
}

fn default_timeout_ms() -> i32 {
    DEFAULT_TIMEOUT_MS
}
fn default_follow_interval() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timeout_ms: default_timeout_ms(),
            follow_interval_secs: default_follow_interval(),
            device: String::new(),
            test_device: false,
            test_profile: 0,
            disambiguation: Disambiguation::default(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    TimeoutOutOfRange(i32),
    FollowIntervalOutOfRange(u64),
    /// The `device` field is not a "vid:pid" pair.
    InvalidDevice(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TimeoutOutOfRange(v) => {
                write!(f, "timeout_ms must be between 0 and {MAX_TIMEOUT_MS} (got {v})")
            }
            ValidationError::FollowIntervalOutOfRange(v) => write!(
                f,
                "follow_interval_secs must be between 1 and {MAX_FOLLOW_INTERVAL_SECS} (got {v})"
            ),
            ValidationError::InvalidDevice(v) => {
                write!(f, "Invalid device \"{v}\", expected vendorid:productid")
            }
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("headsetctl"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Parsed `device` filter; `None` when the field is empty.
    pub fn device_filter(&self) -> HeadsetResult<Option<DeviceFilter>> {
        let s = self.device.trim();
        if s.is_empty() {
            return Ok(None);
        }
        s.parse::<DeviceFilter>().map(Some).map_err(|_| {
            HeadsetError::Config(ValidationError::InvalidDevice(s.to_string()).to_string())
        })
    }

    /// Per-call options handed to every device instance.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            timeout_ms: self.timeout_ms,
            test_profile: self.test_profile,
        }
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !(0..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            errors.push(ValidationError::TimeoutOutOfRange(self.timeout_ms));
        }
        if !(1..=MAX_FOLLOW_INTERVAL_SECS).contains(&self.follow_interval_secs) {
            errors.push(ValidationError::FollowIntervalOutOfRange(
                self.follow_interval_secs,
            ));
        }
        if self.device_filter().is_err() {
            errors.push(ValidationError::InvalidDevice(self.device.trim().to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
