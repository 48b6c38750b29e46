//! Connection manager: opens and caches HID handles for one headset.
//!
//! A headset may expose several HID sub-devices (interfaces / usage pages),
//! and different capabilities may be served by different ones. Handles are
//! opened lazily on first use, cached by routing detail, and closed exactly
//! once when the [`DeviceInstance`] is dropped.

use std::collections::HashMap;

use crate::capability::{Capability, CapabilityDetail, CapabilitySet, Platforms};
use crate::context::{DispatchOptions, RequestContext};
use crate::device::HeadsetDevice;
use crate::error::{DeviceError, Result};
use crate::hid::{HidBackend, HidDeviceEntry, HidTransport, NullTransport};

/// Pick the HID path serving `detail` among the enumerated sub-devices of
/// one product.
///
/// On Windows a non-zero usage page *and* usage id are matched first.
/// Otherwise the first entry whose interface number equals
/// `detail.interface` wins; interface 0 accepts any entry. macOS always
/// behaves as if the interface were 0.
pub fn resolve_path(
    entries: &[HidDeviceEntry],
    detail: &CapabilityDetail,
    platform: Platforms,
) -> Option<String> {
    if platform == Platforms::WINDOWS && detail.usage_page != 0 && detail.usage_id != 0 {
        let by_usage = entries
            .iter()
            .find(|e| e.usage_page == detail.usage_page && e.usage_id == detail.usage_id);
        if let Some(e) = by_usage {
            return Some(e.path.clone());
        }
    }

    let interface = if platform == Platforms::MACOS {
        0
    } else {
        detail.interface
    };
    entries
        .iter()
        .find(|e| interface == 0 || e.interface_number == interface)
        .map(|e| e.path.clone())
}

/// One matched headset plus its open HID handles.
pub struct DeviceInstance<'a> {
    descriptor: &'a dyn HeadsetDevice,
    product_id: u16,
    backend: &'a dyn HidBackend,
    options: DispatchOptions,
    handles: HashMap<u64, Box<dyn HidTransport>>,
    null: NullTransport,
}

impl<'a> DeviceInstance<'a> {
    pub fn new(
        descriptor: &'a dyn HeadsetDevice,
        product_id: u16,
        backend: &'a dyn HidBackend,
        options: DispatchOptions,
    ) -> Self {
        DeviceInstance {
            descriptor,
            product_id,
            backend,
            options,
            handles: HashMap::new(),
            null: NullTransport,
        }
    }

    pub fn descriptor(&self) -> &'a dyn HeadsetDevice {
        self.descriptor
    }

    pub fn name(&self) -> &'a str {
        self.descriptor.name()
    }

    pub fn vendor_id(&self) -> u16 {
        self.descriptor.vendor_id()
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Capabilities in effect for this run.
    pub fn capabilities(&self) -> CapabilitySet {
        self.descriptor.active_capabilities(&self.options)
    }

    pub fn supports(&self, cap: Capability) -> bool {
        self.capabilities().contains(cap)
    }

    /// Handle serving `cap`, opened on first use and cached afterwards.
    ///
    /// The test device gets a [`NullTransport`] and never touches the
    /// backend.
    pub fn connection_for(&mut self, cap: Capability) -> Result<&mut dyn HidTransport> {
        if self.descriptor.is_test_device() {
            return Ok(&mut self.null);
        }

        let detail = self.descriptor.capability_detail(cap);
        let key = detail.cache_key();

        if self.handles.contains_key(&key) {
            log::debug!("{}: reusing handle for {}", self.name(), cap.name());
        } else {
            let vid = self.vendor_id();
            let pid = self.product_id;
            let entries = self.backend.enumerate(vid, pid);
            let path = resolve_path(&entries, &detail, Platforms::current()).ok_or_else(|| {
                DeviceError::device_offline(format!(
                    "Could not find a HID path for {vid:04x}:{pid:04x} (interface {}, usage {:04x}:{:04x})",
                    detail.interface, detail.usage_page, detail.usage_id
                ))
            })?;
            let handle = self.backend.open(&path)?;
            log::debug!("{}: opened {path} for {}", self.name(), cap.name());
            self.handles.insert(key, handle);
        }

        match self.handles.get_mut(&key) {
            Some(handle) => Ok(&mut **handle),
            None => Err(DeviceError::unknown("connection cache lost its handle")),
        }
    }

    /// Connect for `cap` and run `f` against the descriptor with a
    /// request context for this run.
    pub fn invoke<T>(
        &mut self,
        cap: Capability,
        f: impl FnOnce(&dyn HeadsetDevice, &mut RequestContext<'_>) -> Result<T>,
    ) -> Result<T> {
        let descriptor = self.descriptor;
        let options = self.options;
        let hid = self.connection_for(cap)?;
        let mut ctx = RequestContext::new(hid, &options);
        f(descriptor, &mut ctx)
    }

    /// Number of cached HID handles.
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// Close every cached handle now.
    pub fn release(self) {}
}

impl Drop for DeviceInstance<'_> {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            log::debug!(
                "{}: closing {} HID handle(s)",
                self.descriptor.name(),
                self.handles.len()
            );
        }
        self.handles.clear();
    }
}
