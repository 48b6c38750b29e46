//! Error types for headsetctl-lib.
//!
//! [`DeviceError`] is the single error shape every capability call returns:
//! a closed [`ErrorKind`], a short message, optional details and the call
//! site that raised it. [`HeadsetError`] wraps it together with I/O and
//! configuration failures so `?` composes across module boundaries.

use std::fmt;
use std::panic::Location;

use serde::Serialize;

// ── Device errors ──

/// Closed set of failure kinds a device operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    DeviceOffline,
    /// Device replied, but the payload was unexpected or malformed.
    ProtocolError,
    InvalidParameter,
    NotSupported,
    /// The underlying HID call itself failed.
    HidError,
    /// A device-specific range check failed (e.g. preset index).
    OutOfBounds,
    PermissionDenied,
    UsbError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::DeviceOffline => "device_offline",
            ErrorKind::ProtocolError => "protocol_error",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::NotSupported => "not_supported",
            ErrorKind::HidError => "hid_error",
            ErrorKind::OutOfBounds => "out_of_bounds",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::UsbError => "usb_error",
            ErrorKind::Unknown => "unknown",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "Operation timed out",
            ErrorKind::DeviceOffline => "Device is offline or not responding",
            ErrorKind::ProtocolError => "Protocol error",
            ErrorKind::InvalidParameter => "Invalid parameter",
            ErrorKind::NotSupported => "Feature not supported by this device",
            ErrorKind::HidError => "HID communication error",
            ErrorKind::OutOfBounds => "Value out of bounds",
            ErrorKind::PermissionDenied => "Permission denied",
            ErrorKind::UsbError => "USB error",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a device operation.
///
/// Build one through the named factories ([`DeviceError::timeout`],
/// [`DeviceError::not_supported`], ...). Each factory is `#[track_caller]`,
/// so [`DeviceError::location`] points at the line that raised it.
#[derive(Debug, Clone)]
pub struct DeviceError {
    kind: ErrorKind,
    message: String,
    details: String,
    location: &'static Location<'static>,
}

impl DeviceError {
    #[track_caller]
    pub fn new(kind: ErrorKind, details: impl Into<String>) -> Self {
        DeviceError {
            kind,
            message: kind.default_message().to_string(),
            details: details.into(),
            location: Location::caller(),
        }
    }

    /// Like [`DeviceError::new`] but with a custom short message.
    #[track_caller]
    pub fn with_message(
        kind: ErrorKind,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        DeviceError {
            kind,
            message: message.into(),
            details: details.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn timeout(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, details)
    }

    #[track_caller]
    pub fn device_offline(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeviceOffline, details)
    }

    #[track_caller]
    pub fn protocol_error(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolError, details)
    }

    #[track_caller]
    pub fn invalid_parameter(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, details)
    }

    #[track_caller]
    pub fn not_supported(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, details)
    }

    #[track_caller]
    pub fn hid_error(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::HidError, details)
    }

    #[track_caller]
    pub fn out_of_bounds(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfBounds, details)
    }

    #[track_caller]
    pub fn permission_denied(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, details)
    }

    #[track_caller]
    pub fn usb_error(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::UsbError, details)
    }

    #[track_caller]
    pub fn unknown(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, details)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    /// Source location of the factory call that created this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// `message: details (at file:line)` for diagnostics.
    pub fn full_message(&self) -> String {
        format!(
            "{self} (at {}:{})",
            self.location.file(),
            self.location.line()
        )
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.details.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.message, self.details)
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<hidapi::HidError> for DeviceError {
    #[track_caller]
    fn from(e: hidapi::HidError) -> Self {
        let text = e.to_string();
        if text.contains("Permission denied") {
            DeviceError::permission_denied(text)
        } else {
            DeviceError::hid_error(text)
        }
    }
}

/// Result of a single device operation.
pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Crate-level error ──

/// Unified error type for headsetctl-lib operations outside a single
/// capability call (discovery, configuration, backend setup).
#[derive(Debug)]
pub enum HeadsetError {
    /// Device communication error.
    Device(DeviceError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration or argument error.
    Config(String),
    /// No usable headset, or no unambiguous one.
    Discovery(String),
    /// One or more capability requests failed.
    Request(String),
}

impl fmt::Display for HeadsetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadsetError::Device(e) => write!(f, "{e}"),
            HeadsetError::Io(e) => write!(f, "I/O error: {e}"),
            HeadsetError::Config(e) => write!(f, "Config error: {e}"),
            HeadsetError::Discovery(e) => write!(f, "{e}"),
            HeadsetError::Request(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HeadsetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeadsetError::Device(e) => Some(e),
            HeadsetError::Io(e) => Some(e),
            HeadsetError::Config(_) | HeadsetError::Discovery(_) | HeadsetError::Request(_) => None,
        }
    }
}

impl From<DeviceError> for HeadsetError {
    fn from(e: DeviceError) -> Self {
        HeadsetError::Device(e)
    }
}

impl From<std::io::Error> for HeadsetError {
    fn from(e: std::io::Error) -> Self {
        HeadsetError::Io(e)
    }
}

/// Crate-level Result alias using [`HeadsetError`].
pub type HeadsetResult<T> = std::result::Result<T, HeadsetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_set_kind_and_default_message() {
        let e = DeviceError::timeout("no reply");
        assert_eq!(e.kind(), ErrorKind::Timeout);
        assert_eq!(e.message(), "Operation timed out");
        assert_eq!(e.details(), "no reply");

        let e = DeviceError::not_supported("");
        assert_eq!(e.message(), "Feature not supported by this device");
        assert_eq!(DeviceError::hid_error("x").message(), "HID communication error");
        assert_eq!(
            DeviceError::device_offline("x").message(),
            "Device is offline or not responding"
        );
    }

    #[test]
    fn display_joins_message_and_details() {
        let e = DeviceError::protocol_error("short response");
        assert_eq!(e.to_string(), "Protocol error: short response");
    }

    #[test]
    fn display_without_details_is_message_only() {
        let e = DeviceError::invalid_parameter("");
        assert_eq!(e.to_string(), "Invalid parameter");
    }

    #[test]
    fn location_points_at_raising_line() {
        let line = line!() + 1;
        let e = DeviceError::out_of_bounds("preset 9");
        assert_eq!(e.location().line(), line);
        assert!(e.location().file().ends_with("error.rs"));
    }

    #[test]
    fn full_message_includes_location() {
        let e = DeviceError::usb_error("stall");
        let full = e.full_message();
        assert!(full.starts_with("USB error: stall (at "), "got: {full}");
        assert!(full.contains("error.rs:"));
    }

    #[test]
    fn with_message_overrides_default() {
        let e = DeviceError::with_message(ErrorKind::DeviceOffline, "Headset asleep", "");
        assert_eq!(e.to_string(), "Headset asleep");
        assert_eq!(e.kind(), ErrorKind::DeviceOffline);
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(ErrorKind::NotSupported.as_str(), "not_supported");
        assert_eq!(ErrorKind::HidError.to_string(), "hid_error");
    }

    #[test]
    fn from_device_error() {
        let e: HeadsetError = DeviceError::timeout("").into();
        assert!(matches!(e, HeadsetError::Device(_)));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: HeadsetError = io_err.into();
        assert!(matches!(e, HeadsetError::Io(_)));
        assert!(e.to_string().starts_with("I/O error"));
    }

    #[test]
    fn source_chains_device_error() {
        let e = HeadsetError::Device(DeviceError::hid_error("write failed"));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("write failed"));
    }

    #[test]
    fn source_none_for_config() {
        let e = HeadsetError::Config("bad".into());
        assert!(std::error::Error::source(&e).is_none());
        assert_eq!(e.to_string(), "Config error: bad");
    }

    #[test]
    fn question_mark_propagation_device_to_headset() {
        fn inner() -> Result<()> {
            Err(DeviceError::device_offline("gone"))
        }
        fn outer() -> HeadsetResult<()> {
            inner()?;
            Ok(())
        }
        let err = outer().unwrap_err();
        assert!(matches!(err, HeadsetError::Device(ref d) if d.kind() == ErrorKind::DeviceOffline));
    }
}
