//! HyperX Cloud Flight Wireless.

use crate::battery::BatteryCurve;
use crate::capability::{Capability, CapabilitySet};
use crate::context::RequestContext;
use crate::device::HeadsetDevice;
use crate::error::{DeviceError, Result};
use crate::result::{BatteryResult, BatteryStatus};

use super::VENDOR_HYPERX;

pub const PRODUCT_IDS: [u16; 2] = [
    0x16C4, // Cloud Flight (old)
    0x1723, // Cloud Flight (new)
];

/// The dongle answers slowly; use a fixed timeout instead of the configured one.
const TIMEOUT_MS: i32 = 2000;
/// Voltages above this only show up while the cable is attached.
const VOLTAGE_CHARGING_THRESHOLD: u16 = 0x100B;

const BATTERY_REQUEST: [u8; 20] = {
    let mut r = [0u8; 20];
    r[0] = 0x21;
    r[1] = 0xff;
    r[2] = 0x05;
    r
};

/// Fitted discharge curve, lowest degree first. Valid between 3649 and 3975 mV.
static DISCHARGE_CURVE: [f64; 5] = [
    5452299.0,
    -5706.256,
    2.238321,
    -0.0003900299,
    0.00000002547505,
];
/// Near-empty region, linear.
static LOW_CURVE: [f64; 2] = [0.0, 0.00125];

pub fn estimate_level(voltage: u16) -> i32 {
    match voltage {
        v if v <= 3648 => BatteryCurve::Polynomial(&LOW_CURVE).estimate(i32::from(v)),
        v if v > 3975 => 100,
        v => BatteryCurve::Polynomial(&DISCHARGE_CURVE).estimate(i32::from(v)),
    }
}

pub struct HyperXCloudFlight;

impl HeadsetDevice for HyperXCloudFlight {
    fn vendor_id(&self) -> u16 {
        VENDOR_HYPERX
    }

    fn product_ids(&self) -> &[u16] {
        &PRODUCT_IDS
    }

    fn name(&self) -> &str {
        "HyperX Cloud Flight Wireless"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::EMPTY.with(Capability::Battery)
    }

    fn get_battery(&self, ctx: &mut RequestContext<'_>) -> Result<BatteryResult> {
        ctx.write(&BATTERY_REQUEST)?;
        let mut response = [0u8; 20];
        let n = ctx.read_with_timeout(&mut response, TIMEOUT_MS)?;
        if n != 0x0f && n != 0x14 {
            return Err(DeviceError::protocol_error(format!(
                "Unexpected response length ({n} bytes)"
            )));
        }

        let voltage = u16::from_be_bytes([response[3], response[4]]);
        if voltage > VOLTAGE_CHARGING_THRESHOLD {
            return Ok(BatteryResult::new(-1, BatteryStatus::Charging));
        }

        let mut result = BatteryResult::new(estimate_level(voltage), BatteryStatus::Available);
        result.voltage_mv = Some(i32::from(voltage));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DispatchOptions;
    use crate::error::ErrorKind;
    use crate::hid::mock::{FakeHid, FakeTransport};

    fn reply(voltage: u16, len: usize) -> Vec<u8> {
        let mut v = vec![0u8; len];
        v[..2].copy_from_slice(&[0x21, 0xff]);
        v[3..5].copy_from_slice(&voltage.to_be_bytes());
        v
    }

    fn battery(state: std::rc::Rc<FakeHid>) -> Result<BatteryResult> {
        let mut t = FakeTransport::new("fake://cloudflight", state);
        let mut ctx = RequestContext::new(&mut t, &DispatchOptions::default());
        HyperXCloudFlight.get_battery(&mut ctx)
    }

    #[test]
    fn estimate_regions() {
        assert_eq!(estimate_level(3648), 5);
        assert_eq!(estimate_level(3750), 36);
        assert_eq!(estimate_level(3800), 55);
        assert_eq!(estimate_level(3900), 82);
        assert_eq!(estimate_level(3976), 100);
        assert_eq!(estimate_level(0), 0);
    }

    #[test]
    fn battery_discharging() {
        let state = FakeHid::new();
        state.queue_read(reply(3800, 20));
        let b = battery(state.clone()).unwrap();
        assert_eq!(b.level_percent, 55);
        assert_eq!(b.status, BatteryStatus::Available);
        assert_eq!(b.voltage_mv, Some(3800));
        assert_eq!(&state.writes.borrow()[0].1[..3], &[0x21, 0xff, 0x05]);
    }

    #[test]
    fn battery_charging_has_unknown_level() {
        let state = FakeHid::new();
        state.queue_read(reply(0x1010, 15));
        let b = battery(state).unwrap();
        assert_eq!(b.level_percent, -1);
        assert_eq!(b.status, BatteryStatus::Charging);
    }

    #[test]
    fn unexpected_length_is_protocol_error() {
        let state = FakeHid::new();
        state.queue_read(reply(3800, 8));
        let err = battery(state).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
        assert!(err.details().starts_with("Unexpected response length"));
    }

    #[test]
    fn silent_dongle_times_out_after_fixed_delay() {
        let state = FakeHid::new();
        let err = battery(state).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.details().contains("2000ms"));
    }
}
