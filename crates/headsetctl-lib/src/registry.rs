//! Registry of supported headsets.
//!
//! Built once per process with [`initialize`]; afterwards read-only and
//! shared freely between threads.

use std::sync::OnceLock;

use crate::device::HeadsetDevice;
use crate::devices;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Build the process-wide registry on first call and return it.
///
/// Idempotent and race-free: concurrent first callers all observe the
/// same instance, built exactly once.
pub fn initialize() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let registry = Registry::builtin();
        for (vid, pid, first, second) in registry.conflicts() {
            log::warn!(
                "{vid:04x}:{pid:04x} is claimed by both \"{first}\" and \"{second}\"; using \"{first}\""
            );
        }
        log::debug!("registered {} headset implementations", registry.len());
        registry
    })
}

/// Ordered list of device implementations.
pub struct Registry {
    devices: Vec<Box<dyn HeadsetDevice>>,
}

impl Registry {
    pub fn builtin() -> Self {
        Registry {
            devices: devices::builtin(),
        }
    }

    pub fn with_devices(devices: Vec<Box<dyn HeadsetDevice>>) -> Self {
        Registry { devices }
    }

    /// First implementation (in registration order) claiming `vid:pid`.
    pub fn lookup(&self, vendor_id: u16, product_id: u16) -> Option<&dyn HeadsetDevice> {
        self.devices
            .iter()
            .find(|d| d.matches(vendor_id, product_id))
            .map(|d| &**d)
    }

    pub fn devices(&self) -> impl Iterator<Item = &dyn HeadsetDevice> {
        self.devices.iter().map(|d| &**d)
    }

    /// The test device, if registered.
    pub fn test_device(&self) -> Option<&dyn HeadsetDevice> {
        self.devices().find(|d| d.is_test_device())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Product ids claimed by more than one implementation, as
    /// `(vid, pid, winner, shadowed)`.
    pub fn conflicts(&self) -> Vec<(u16, u16, String, String)> {
        let mut out = Vec::new();
        for (i, later) in self.devices.iter().enumerate() {
            for &pid in later.product_ids() {
                let earlier = self.devices[..i]
                    .iter()
                    .find(|d| d.matches(later.vendor_id(), pid));
                if let Some(earlier) = earlier {
                    out.push((
                        later.vendor_id(),
                        pid,
                        earlier.name().to_string(),
                        later.name().to_string(),
                    ));
                }
            }
        }
        out
    }
}
