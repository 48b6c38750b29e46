//! HID transport: trait plus hidapi backend.
//!
//! Device backends never see raw `hidapi` return codes. [`HidTransport`]
//! turns "no data before the timeout" into [`ErrorKind::Timeout`] and any
//! failed call into [`ErrorKind::HidError`] (or `PermissionDenied` when
//! hidapi reports an access failure).
//!
//! [`ErrorKind::Timeout`]: crate::error::ErrorKind::Timeout
//! [`ErrorKind::HidError`]: crate::error::ErrorKind::HidError

use std::ffi::CString;
use std::fmt;

use serde::Serialize;

use crate::error::{DeviceError, Result};

// ── Trait ──

/// One open HID sub-device.
pub trait HidTransport {
    /// Write an output report. Returns the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize>;
    /// Read an input report, waiting at most `timeout_ms` (-1 blocks).
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize>;
    fn send_feature_report(&mut self, data: &[u8]) -> Result<()>;
    /// Read a feature report. `buf[0]` holds the report id on entry.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// One HID sub-device reported by enumeration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HidDeviceEntry {
    pub vendor_id: u16,
    pub product_id: u16,
    pub path: String,
    pub interface_number: i32,
    pub usage_page: u16,
    pub usage_id: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
}

/// Enumeration and open primitives of the host HID stack.
pub trait HidBackend {
    fn enumerate_all(&self) -> Vec<HidDeviceEntry>;

    fn enumerate(&self, vendor_id: u16, product_id: u16) -> Vec<HidDeviceEntry> {
        self.enumerate_all()
            .into_iter()
            .filter(|e| e.vendor_id == vendor_id && e.product_id == product_id)
            .collect()
    }

    fn open(&self, path: &str) -> Result<Box<dyn HidTransport>>;
}

// ── hidapi backend ──

/// Translate a raw read result: zero bytes means the timeout elapsed.
/// Convert a hidapi failure, keeping its kind and prefixing `context`.
#[track_caller]
fn hid_failure(e: hidapi::HidError, context: impl fmt::Display) -> DeviceError {
    let err = DeviceError::from(e);
    DeviceError::with_message(
        err.kind(),
        err.message(),
        format!("{context}: {}", err.details()),
    )
}

fn check_read(res: hidapi::HidResult<usize>, timeout_ms: i32) -> Result<usize> {
    match res {
        Ok(0) => Err(DeviceError::timeout(format!(
            "HID read timeout after {timeout_ms}ms (no data)"
        ))),
        Ok(n) => Ok(n),
        Err(e) => Err(hid_failure(
            e,
            format_args!("HID read failed after {timeout_ms}ms timeout"),
        )),
    }
}

fn check_feature_read(res: hidapi::HidResult<usize>) -> Result<usize> {
    match res {
        Ok(0) => Err(DeviceError::timeout("feature report returned no data")),
        Ok(n) => Ok(n),
        Err(e) => Err(hid_failure(e, "get_feature_report")),
    }
}

pub struct HidapiBackend {
    api: hidapi::HidApi,
}

impl HidapiBackend {
    pub fn new() -> Result<Self> {
        let api = hidapi::HidApi::new()?;
        Ok(HidapiBackend { api })
    }
}

impl HidBackend for HidapiBackend {
    fn enumerate_all(&self) -> Vec<HidDeviceEntry> {
        self.api
            .device_list()
            .map(|info| HidDeviceEntry {
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                path: info.path().to_string_lossy().into_owned(),
                interface_number: info.interface_number(),
                usage_page: info.usage_page(),
                usage_id: info.usage(),
                manufacturer: info.manufacturer_string().map(str::to_string),
                product: info.product_string().map(str::to_string),
                serial: info.serial_number().map(str::to_string),
            })
            .collect()
    }

    fn open(&self, path: &str) -> Result<Box<dyn HidTransport>> {
        let cpath = CString::new(path)
            .map_err(|_| DeviceError::invalid_parameter(format!("bad HID path: {path:?}")))?;
        let device = self.api.open_path(&cpath).map_err(|e| {
            let err = DeviceError::from(e);
            DeviceError::with_message(
                err.kind(),
                "Failed to open device",
                format!("{path}: {}", err.details()),
            )
        })?;
        log::debug!("opened HID path {path}");
        Ok(Box::new(HidapiTransport {
            device,
            path: path.to_string(),
        }))
    }
}

/// Open hidapi device; closed when dropped.
pub struct HidapiTransport {
    device: hidapi::HidDevice,
    path: String,
}

impl HidTransport for HidapiTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.device
            .write(data)
            .map_err(|e| hid_failure(e, format_args!("write to {}", self.path)))
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        check_read(self.device.read_timeout(buf, timeout_ms), timeout_ms)
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .send_feature_report(data)
            .map_err(|e| hid_failure(e, "send_feature_report"))
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        check_feature_read(self.device.get_feature_report(buf))
    }
}

impl Drop for HidapiTransport {
    fn drop(&mut self) {
        log::debug!("closing HID path {}", self.path);
    }
}

/// Backend for hosts where the HID stack could not be initialized.
/// Enumerates nothing and refuses to open paths.
#[derive(Debug, Default)]
pub struct EmptyBackend;

impl HidBackend for EmptyBackend {
    fn enumerate_all(&self) -> Vec<HidDeviceEntry> {
        Vec::new()
    }

    fn open(&self, path: &str) -> Result<Box<dyn HidTransport>> {
        Err(DeviceError::device_offline(format!(
            "HID stack unavailable, cannot open {path}"
        )))
    }
}

// ── Null transport ──

/// Handle given to devices that do not talk to hardware (the test device).
#[derive(Debug, Default)]
pub struct NullTransport;

impl HidTransport for NullTransport {
    fn write(&mut self, _data: &[u8]) -> Result<usize> {
        Err(DeviceError::hid_error("no transport attached"))
    }
    fn read_timeout(&mut self, _buf: &mut [u8], _timeout_ms: i32) -> Result<usize> {
        Err(DeviceError::hid_error("no transport attached"))
    }
    fn send_feature_report(&mut self, _data: &[u8]) -> Result<()> {
        Err(DeviceError::hid_error("no transport attached"))
    }
    fn get_feature_report(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(DeviceError::hid_error("no transport attached"))
    }
}

// ── Fake HID stack for testing ──

/// In-memory HID stack for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// State shared by a [`FakeBackend`] and every [`FakeTransport`] it opens.
    #[derive(Default)]
    pub struct FakeHid {
        /// Paths passed to a successful `open`, in order.
        pub opened: RefCell<Vec<String>>,
        /// Number of transports dropped.
        pub closes: Cell<usize>,
        /// Recorded output reports: (path, bytes).
        pub writes: RefCell<Vec<(String, Vec<u8>)>>,
        /// Recorded feature reports sent: (path, bytes).
        pub feature_writes: RefCell<Vec<(String, Vec<u8>)>>,
        /// Number of read / get-feature calls.
        pub reads: Cell<usize>,
        /// Queued input reports. An empty report simulates a timeout.
        pub responses: RefCell<VecDeque<Vec<u8>>>,
        /// Queued feature report responses.
        pub feature_responses: RefCell<VecDeque<Vec<u8>>>,
        /// If true, `open` fails with a HID error.
        pub fail_open: Cell<bool>,
        /// If true, `write` fails with a HID error.
        pub fail_writes: Cell<bool>,
    }

    impl FakeHid {
        pub fn new() -> Rc<Self> {
            Rc::new(FakeHid::default())
        }

        pub fn queue_read(&self, data: Vec<u8>) {
            self.responses.borrow_mut().push_back(data);
        }

        pub fn queue_feature(&self, data: Vec<u8>) {
            self.feature_responses.borrow_mut().push_back(data);
        }

        pub fn opens(&self) -> usize {
            self.opened.borrow().len()
        }

        /// Total number of HID operations of any kind, including opens.
        pub fn io_count(&self) -> usize {
            self.opens()
                + self.writes.borrow().len()
                + self.feature_writes.borrow().len()
                + self.reads.get()
        }
    }

    pub struct FakeTransport {
        pub path: String,
        state: Rc<FakeHid>,
    }

    impl FakeTransport {
        pub fn new(path: impl Into<String>, state: Rc<FakeHid>) -> Self {
            FakeTransport {
                path: path.into(),
                state,
            }
        }
    }

    impl HidTransport for FakeTransport {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            if self.state.fail_writes.get() {
                return Err(DeviceError::hid_error("fake: write failure injected"));
            }
            self.state
                .writes
                .borrow_mut()
                .push((self.path.clone(), data.to_vec()));
            Ok(data.len())
        }

        fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
            self.state.reads.set(self.state.reads.get() + 1);
            let next = self.state.responses.borrow_mut().pop_front();
            let data = next.unwrap_or_default();
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
            check_read(Ok(n), timeout_ms)
        }

        fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
            self.state
                .feature_writes
                .borrow_mut()
                .push((self.path.clone(), data.to_vec()));
            Ok(())
        }

        fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.state.reads.set(self.state.reads.get() + 1);
            let next = self.state.feature_responses.borrow_mut().pop_front();
            let data = next.unwrap_or_default();
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
            check_feature_read(Ok(n))
        }
    }

    impl Drop for FakeTransport {
        fn drop(&mut self) {
            self.state.closes.set(self.state.closes.get() + 1);
        }
    }

    /// Backend serving a fixed list of entries.
    pub struct FakeBackend {
        pub entries: Vec<HidDeviceEntry>,
        pub state: Rc<FakeHid>,
    }

    impl FakeBackend {
        pub fn new(entries: Vec<HidDeviceEntry>) -> Self {
            FakeBackend {
                entries,
                state: FakeHid::new(),
            }
        }
    }

    impl HidBackend for FakeBackend {
        fn enumerate_all(&self) -> Vec<HidDeviceEntry> {
            self.entries.clone()
        }

        fn open(&self, path: &str) -> Result<Box<dyn HidTransport>> {
            if self.state.fail_open.get() {
                return Err(DeviceError::hid_error(format!("fake: cannot open {path}")));
            }
            self.state.opened.borrow_mut().push(path.to_string());
            Ok(Box::new(FakeTransport::new(path, Rc::clone(&self.state))))
        }
    }

    /// Entry helper: `(vid, pid, interface, usage_page, usage_id)` with a
    /// path derived from the interface and usage.
    pub fn entry(
        vendor_id: u16,
        product_id: u16,
        interface_number: i32,
        usage_page: u16,
        usage_id: u16,
    ) -> HidDeviceEntry {
        HidDeviceEntry {
            vendor_id,
            product_id,
            path: format!(
                "fake://{vendor_id:04x}:{product_id:04x}/if{interface_number}/{usage_page:04x}:{usage_id:04x}"
            ),
            interface_number,
            usage_page,
            usage_id,
            ..HidDeviceEntry::default()
        }
    }
}
