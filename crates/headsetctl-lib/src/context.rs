//! Request context: what a device method gets to talk to its hardware.
//!
//! The HID read timeout and the test-device profile travel here as plain
//! values, threaded from [`Config`](crate::config::Config) through dispatch,
//! instead of living in process-wide globals.

use crate::error::Result;
use crate::hid::HidTransport;
use crate::params::hexdump;

/// Default HID read timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: i32 = 5000;

/// Per-run settings that influence every capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// HID read timeout in milliseconds.
    pub timeout_ms: i32,
    /// Selects the canned behaviour of the test device.
    pub test_profile: u8,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        DispatchOptions {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            test_profile: 0,
        }
    }
}

/// An open HID handle plus the options of the current run.
pub struct RequestContext<'a> {
    hid: &'a mut dyn HidTransport,
    pub timeout_ms: i32,
    pub test_profile: u8,
}

impl<'a> RequestContext<'a> {
    pub fn new(hid: &'a mut dyn HidTransport, options: &DispatchOptions) -> Self {
        RequestContext {
            hid,
            timeout_ms: options.timeout_ms,
            test_profile: options.test_profile,
        }
    }

    pub fn hid(&mut self) -> &mut dyn HidTransport {
        &mut *self.hid
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        trace_bytes("HID write", data);
        self.hid.write(data)
    }

    /// Write `data` zero-padded to exactly `size` bytes.
    pub fn write_padded(&mut self, data: &[u8], size: usize) -> Result<usize> {
        let mut buf = vec![0u8; size.max(data.len())];
        buf[..data.len()].copy_from_slice(data);
        buf.truncate(size);
        self.write(&buf)
    }

    /// Read with the configured timeout.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.hid.read_timeout(buf, self.timeout_ms)
    }

    pub fn read_with_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        self.hid.read_timeout(buf, timeout_ms)
    }

    pub fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        trace_bytes("HID feature report", data);
        self.hid.send_feature_report(data)
    }

    pub fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.hid.get_feature_report(buf)
    }

    /// Write `command`, then read one report of up to `response_len` bytes.
    pub fn request(&mut self, command: &[u8], response_len: usize) -> Result<Vec<u8>> {
        self.write(command)?;
        let mut response = vec![0u8; response_len];
        let n = self.read(&mut response)?;
        response.truncate(n);
        trace_bytes("HID reply", &response);
        Ok(response)
    }
}

fn trace_bytes(what: &str, data: &[u8]) {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("{what} ({} bytes): {}", data.len(), hexdump(data).trim_end());
    }
}
