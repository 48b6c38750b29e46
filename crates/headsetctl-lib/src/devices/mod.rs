//! Built-in headset implementations.

pub mod hidpp;
pub mod hyperx_cloud_flight;
pub mod logitech_g533;
pub mod steelseries_nova7;
pub mod test_device;

use crate::device::HeadsetDevice;

pub use hyperx_cloud_flight::HyperXCloudFlight;
pub use logitech_g533::LogitechG533;
pub use steelseries_nova7::SteelSeriesArctisNova7;
pub use test_device::TestDevice;

// ── Vendor ids ──

pub const VENDOR_LOGITECH: u16 = 0x046d;
pub const VENDOR_STEELSERIES: u16 = 0x1038;
pub const VENDOR_HYPERX: u16 = 0x0951;
pub const VENDOR_CORSAIR: u16 = 0x1b1c;
pub const VENDOR_ROCCAT: u16 = 0x1e7d;
pub const VENDOR_AUDEZE: u16 = 0x3329;
/// Virtual vendor of the test device.
pub const VENDOR_TEST: u16 = 0xF00B;

/// Every built-in implementation, in registration (and lookup) order.
pub fn builtin() -> Vec<Box<dyn HeadsetDevice>> {
    vec![
        Box::new(TestDevice),
        Box::new(LogitechG533),
        Box::new(SteelSeriesArctisNova7),
        Box::new(HyperXCloudFlight),
    ]
}

/// Human-readable vendor for known vendor ids.
pub fn vendor_name(vendor_id: u16) -> Option<&'static str> {
    match vendor_id {
        VENDOR_LOGITECH => Some("Logitech"),
        VENDOR_STEELSERIES => Some("SteelSeries"),
        VENDOR_HYPERX => Some("HyperX"),
        VENDOR_CORSAIR => Some("Corsair"),
        VENDOR_ROCCAT => Some("Roccat"),
        VENDOR_AUDEZE => Some("Audeze"),
        VENDOR_TEST => Some("HeadsetControl"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_order_starts_with_test_device() {
        let devices = builtin();
        assert_eq!(devices.len(), 4);
        assert!(devices[0].is_test_device());
        assert_eq!(devices[1].name(), "Logitech G533");
        assert!(devices[1..].iter().all(|d| !d.is_test_device()));
    }

    #[test]
    fn every_builtin_has_capabilities_and_ids() {
        for d in builtin() {
            assert!(!d.capabilities().is_empty(), "{}", d.name());
            assert!(!d.product_ids().is_empty(), "{}", d.name());
            assert!(vendor_name(d.vendor_id()).is_some(), "{}", d.name());
        }
    }

    #[test]
    fn unknown_vendor_has_no_name() {
        assert_eq!(vendor_name(0x0001), None);
        assert_eq!(vendor_name(VENDOR_CORSAIR), Some("Corsair"));
    }
}
