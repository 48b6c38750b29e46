//! Headset discovery: match enumerated HID devices against the registry.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::capability::Platforms;
use crate::config::Config;
use crate::connection::DeviceInstance;
use crate::context::DispatchOptions;
use crate::device::HeadsetDevice;
use crate::devices;
use crate::error::{HeadsetError, HeadsetResult};
use crate::hid::{HidBackend, HidDeviceEntry};
use crate::params::parse_two_ids;
use crate::registry::Registry;

/// Restrict discovery to one `vid:pid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceFilter {
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl FromStr for DeviceFilter {
    type Err = HeadsetError;

    fn from_str(s: &str) -> HeadsetResult<Self> {
        parse_two_ids(s)
            .map(|(vendor_id, product_id)| DeviceFilter {
                vendor_id,
                product_id,
            })
            .ok_or_else(|| {
                HeadsetError::Config(format!(
                    "Invalid device \"{}\", expected vendorid:productid",
                    s.trim()
                ))
            })
    }
}

impl fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// A connected headset with a matching implementation.
#[derive(Clone)]
pub struct DiscoveredHeadset<'r> {
    pub device: &'r dyn HeadsetDevice,
    pub vendor_id: u16,
    pub product_id: u16,
    /// First enumerated sub-device; `None` for the test device.
    pub entry: Option<HidDeviceEntry>,
}

impl<'r> DiscoveredHeadset<'r> {
    pub fn name(&self) -> &'r str {
        self.device.name()
    }

    pub fn vendor_name(&self) -> &'static str {
        devices::vendor_name(self.vendor_id).unwrap_or("Unknown")
    }

    pub fn product_string(&self) -> Option<&str> {
        self.entry.as_ref().and_then(|e| e.product.as_deref())
    }

    /// Open a connection scope for this headset.
    pub fn instance<'a>(
        &self,
        backend: &'a dyn HidBackend,
        options: DispatchOptions,
    ) -> DeviceInstance<'a>
    where
        'r: 'a,
    {
        DeviceInstance::new(self.device, self.product_id, backend, options)
    }
}

impl fmt::Debug for DiscoveredHeadset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveredHeadset")
            .field("name", &self.name())
            .field("vendor_id", &format_args!("{:#06x}", self.vendor_id))
            .field("product_id", &format_args!("{:#06x}", self.product_id))
            .finish()
    }
}

/// Every supported headset currently attached, in discovery order.
///
/// The test device comes first when `config.test_device` is set. Each
/// `vid:pid` appears once even when it exposes several HID interfaces.
/// Headsets whose backend doesn't run on this platform are left out.
/// Fails only when `config.device` is malformed.
pub fn discover<'r>(
    backend: &dyn HidBackend,
    registry: &'r Registry,
    config: &Config,
) -> HeadsetResult<Vec<DiscoveredHeadset<'r>>> {
    let filter = config.device_filter()?;
    let wanted = |vid, pid| filter.is_none_or(|f| f.matches(vid, pid));

    let mut found = Vec::new();
    let mut seen = HashSet::new();

    if config.test_device
        && let Some(test) = registry.test_device()
        && let Some(&pid) = test.product_ids().first()
        && wanted(test.vendor_id(), pid)
    {
        seen.insert((test.vendor_id(), pid));
        found.push(DiscoveredHeadset {
            device: test,
            vendor_id: test.vendor_id(),
            product_id: pid,
            entry: None,
        });
    }

    for entry in backend.enumerate_all() {
        let key = (entry.vendor_id, entry.product_id);
        if seen.contains(&key) || !wanted(key.0, key.1) {
            continue;
        }
        let Some(device) = registry.lookup(key.0, key.1) else {
            continue;
        };
        if device.is_test_device() {
            continue;
        }
        if !device.platforms().contains(Platforms::current()) {
            log::debug!(
                "{} [{:04x}:{:04x}] is not supported on this platform ({})",
                device.name(),
                key.0,
                key.1,
                device.platforms()
            );
            continue;
        }
        seen.insert(key);
        found.push(DiscoveredHeadset {
            device,
            vendor_id: key.0,
            product_id: key.1,
            entry: Some(entry),
        });
    }

    log::info!(
        "found {} supported headset{}",
        found.len(),
        if found.len() == 1 { "" } else { "s" }
    );
    Ok(found)
}
