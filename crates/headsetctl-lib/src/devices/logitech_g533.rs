//! Logitech G533 Wireless.

use crate::battery::LOGITECH_G533;
use crate::capability::{Capability, CapabilityDetail, CapabilitySet};
use crate::context::RequestContext;
use crate::device::{HeadsetDevice, map_range};
use crate::error::Result;
use crate::result::{BatteryResult, InactiveTimeResult, SidetoneResult};

use super::{VENDOR_LOGITECH, hidpp};

pub const PRODUCT_G533: u16 = 0x0a66;

const SIDETONE_DEVICE_MIN: i32 = 200;
const SIDETONE_DEVICE_MAX: i32 = 255;

pub struct LogitechG533;

impl HeadsetDevice for LogitechG533 {
    fn vendor_id(&self) -> u16 {
        VENDOR_LOGITECH
    }

    fn product_ids(&self) -> &[u16] {
        &[PRODUCT_G533]
    }

    fn name(&self) -> &str {
        "Logitech G533"
    }

    fn capabilities(&self) -> CapabilitySet {
        [Capability::Sidetone, Capability::Battery, Capability::InactiveTime]
            .into_iter()
            .collect()
    }

    fn capability_detail(&self, cap: Capability) -> CapabilityDetail {
        match cap {
            Capability::Sidetone => CapabilityDetail::new(0xff00, 0x1, 3),
            Capability::Battery => CapabilityDetail::new(0xff43, 0x0202, 3),
            Capability::InactiveTime => CapabilityDetail::new(0xff43, 0x0202, 0),
            _ => CapabilityDetail::default(),
        }
    }

    fn get_battery(&self, ctx: &mut RequestContext<'_>) -> Result<BatteryResult> {
        hidpp::battery(ctx, &[0x07, 0x01], &LOGITECH_G533)
    }

    fn set_sidetone(&self, ctx: &mut RequestContext<'_>, level: u8) -> Result<SidetoneResult> {
        let mapped = map_range(
            i32::from(level),
            0,
            128,
            SIDETONE_DEVICE_MIN,
            SIDETONE_DEVICE_MAX,
        ) as u8;
        hidpp::feature(ctx, &[0x04, 0x0E, 0xFF, 0x05, 0x01, 0x04, 0x00, mapped])?;
        Ok(SidetoneResult {
            current: level,
            min: 0,
            max: 128,
            device_min: SIDETONE_DEVICE_MIN,
            device_max: SIDETONE_DEVICE_MAX,
        })
    }

    fn set_inactive_time(
        &self,
        ctx: &mut RequestContext<'_>,
        minutes: u8,
    ) -> Result<InactiveTimeResult> {
        hidpp::inactive_time(ctx, minutes)
    }
}
