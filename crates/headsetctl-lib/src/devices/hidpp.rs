//! Logitech HID++ framing shared by the Logitech wireless models.

use crate::battery::{self, BatteryCalibration};
use crate::context::RequestContext;
use crate::error::{DeviceError, Result};
use crate::result::{BatteryResult, BatteryStatus, InactiveTimeResult};

// ── Framing ──

/// Report id of a long (20-byte) HID++ message.
pub const LONG_MESSAGE: u8 = 0x11;
pub const LONG_MESSAGE_LENGTH: usize = 20;
/// Device index addressing the wireless receiver.
pub const DEVICE_RECEIVER: u8 = 0xff;

/// Length of a short HID++ reply.
pub const SHORT_REPLY_LENGTH: usize = 7;

/// Charging state byte in a battery reply.
const STATE_CHARGING: u8 = 0x03;

/// Wrap `command` in a long message addressed to the receiver.
pub fn frame(command: &[u8]) -> [u8; LONG_MESSAGE_LENGTH] {
    let mut packet = [0u8; LONG_MESSAGE_LENGTH];
    packet[0] = LONG_MESSAGE;
    packet[1] = DEVICE_RECEIVER;
    let n = command.len().min(LONG_MESSAGE_LENGTH - 2);
    packet[2..2 + n].copy_from_slice(&command[..n]);
    packet
}

/// Send `command` and read a reply of `response_len` bytes.
///
/// A reply with `0xFF` in byte 2 means the receiver has no headset paired
/// or the headset is switched off.
pub fn command(
    ctx: &mut RequestContext<'_>,
    command: &[u8],
    response_len: usize,
) -> Result<Vec<u8>> {
    let response = ctx.request(&frame(command), response_len)?;
    if response.len() > 2 && response[2] == 0xFF {
        return Err(DeviceError::device_offline(
            "Headset not connected or turned off",
        ));
    }
    Ok(response)
}

/// Fire-and-forget feature write (no reply expected).
pub fn feature(ctx: &mut RequestContext<'_>, command: &[u8]) -> Result<()> {
    ctx.write(&frame(command))?;
    Ok(())
}

// ── Common requests ──

/// Voltage-based battery request: big-endian millivolts in bytes 4-5,
/// charging state in byte 6.
pub fn battery(
    ctx: &mut RequestContext<'_>,
    feature_command: &[u8],
    calibration: &BatteryCalibration,
) -> Result<BatteryResult> {
    let response = command(ctx, feature_command, SHORT_REPLY_LENGTH)?;
    if response.len() < SHORT_REPLY_LENGTH {
        return Err(DeviceError::protocol_error(format!(
            "battery reply too short ({} bytes)",
            response.len()
        )));
    }

    let status = if response[6] == STATE_CHARGING {
        BatteryStatus::Charging
    } else {
        BatteryStatus::Available
    };
    let voltage = i32::from(u16::from_be_bytes([response[4], response[5]]));
    let level =
        battery::spline_battery_level(calibration.percentages, calibration.voltages, voltage);

    let mut result = BatteryResult::new(level, status);
    result.voltage_mv = Some(voltage);
    match status {
        BatteryStatus::Charging => result.time_to_full_min = battery::time_to_full_min(level),
        _ => result.time_to_empty_min = battery::time_to_empty_min(level),
    }
    Ok(result)
}

/// Auto power-off after `minutes` of inactivity (0 disables it).
pub fn inactive_time(ctx: &mut RequestContext<'_>, minutes: u8) -> Result<InactiveTimeResult> {
    command(ctx, &[0x07, 0x21, minutes], SHORT_REPLY_LENGTH)?;
    Ok(InactiveTimeResult {
        minutes,
        min: 0,
        max: 90,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DispatchOptions;
    use crate::error::ErrorKind;
    use crate::hid::mock::{FakeHid, FakeTransport};

    #[test]
    fn frame_prefixes_and_pads() {
        let p = frame(&[0x07, 0x01]);
        assert_eq!(&p[..4], &[0x11, 0xff, 0x07, 0x01]);
        assert!(p[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn frame_truncates_oversized_commands() {
        let p = frame(&[0xAB; 30]);
        assert_eq!(p.len(), 20);
        assert_eq!(p[19], 0xAB);
    }

    #[test]
    fn offline_marker_maps_to_device_offline() {
        let state = FakeHid::new();
        state.queue_read(vec![0x11, 0xff, 0xff, 0, 0, 0, 0]);
        let mut t = FakeTransport::new("fake://hidpp", state);
        let mut ctx = RequestContext::new(&mut t, &DispatchOptions::default());
        let err = command(&mut ctx, &[0x07, 0x01], 7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceOffline);
        assert_eq!(err.details(), "Headset not connected or turned off");
    }

    #[test]
    fn short_battery_reply_is_protocol_error() {
        let state = FakeHid::new();
        state.queue_read(vec![0x11, 0xff, 0x07]);
        let mut t = FakeTransport::new("fake://hidpp", state);
        let mut ctx = RequestContext::new(&mut t, &DispatchOptions::default());
        let err = battery(&mut ctx, &[0x07, 0x01], &crate::battery::LOGITECH_G533).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }
}
