//! SteelSeries Arctis Nova 7 family (wireless dongle).
//!
//! Nova devices take zero-padded 64-byte output reports and answer a
//! `0xb0` status request with battery and chat-mix state.

use crate::capability::{Capability, CapabilityDetail, CapabilitySet};
use crate::context::RequestContext;
use crate::device::{HeadsetDevice, map_range, map_to_discrete};
use crate::error::{DeviceError, Result};
use crate::result::*;

use super::VENDOR_STEELSERIES;

pub const PRODUCT_IDS: [u16; 7] = [
    0x2202, // Arctis Nova 7
    0x227e, // Arctis Nova 7 Wireless
    0x2206, // Arctis Nova 7x
    0x2258, // Arctis Nova 7x v2
    0x229e, // Arctis Nova 7x v2
    0x223a, // Arctis Nova 7 Diablo IV
    0x227a, // Arctis Nova 7 WoW Edition
];

// ── Protocol ──

const MSG_SIZE: usize = 64;
const STATUS_BUF_SIZE: usize = 128;
const STATUS_REQUEST: [u8; 2] = [0x00, 0xb0];
const SAVE_STATE: [u8; 2] = [0x06, 0x09];

const STATUS_OFFLINE: u8 = 0x00;
const STATUS_CHARGING: u8 = 0x01;

fn send_command(ctx: &mut RequestContext<'_>, command: &[u8]) -> Result<()> {
    ctx.write_padded(command, MSG_SIZE)?;
    Ok(())
}

fn read_status(ctx: &mut RequestContext<'_>) -> Result<Vec<u8>> {
    ctx.request(&STATUS_REQUEST, STATUS_BUF_SIZE)
}

// ── Equalizer ──

const EQ_BANDS: usize = 10;
const EQ_BAND_MIN: f32 = -10.0;
const EQ_BAND_MAX: f32 = 10.0;
const EQ_BAND_STEP: f32 = 0.5;
/// Wire value of a 0 dB band.
const EQ_BASELINE: u8 = 0x14;

const PRESETS: [(&str, [f32; EQ_BANDS]); 4] = [
    ("Flat", [0.0; EQ_BANDS]),
    ("Bass", [3.5, 5.5, 4.0, 1.0, -1.5, -1.5, -1.0, -1.0, -1.0, -1.0]),
    ("Focus", [-5.0, -3.5, -1.0, -3.5, -2.5, 4.0, 6.0, -3.5, 0.0, 0.0]),
    ("Smiley", [3.0, 3.5, 1.5, -1.5, -4.0, -4.0, -2.5, 1.5, 3.0, 4.0]),
];

/// Build the `0x33` equalizer packet, rejecting out-of-range gains.
fn equalizer_packet(bands: &[f32]) -> Result<Vec<u8>> {
    if bands.len() != EQ_BANDS {
        return Err(DeviceError::invalid_parameter(
            "Device requires exactly 10 equalizer bands",
        ));
    }
    let mut packet = vec![0x00, 0x33];
    for &gain in bands {
        if !(EQ_BAND_MIN..=EQ_BAND_MAX).contains(&gain) {
            return Err(DeviceError::invalid_parameter(
                "Gain values must be between -10 and +10",
            ));
        }
        packet.push((f32::from(EQ_BASELINE) + gain) as u8);
    }
    packet.push(0x00);
    Ok(packet)
}

pub struct SteelSeriesArctisNova7;

impl HeadsetDevice for SteelSeriesArctisNova7 {
    fn vendor_id(&self) -> u16 {
        VENDOR_STEELSERIES
    }

    fn product_ids(&self) -> &[u16] {
        &PRODUCT_IDS
    }

    fn name(&self) -> &str {
        "SteelSeries Arctis Nova 7"
    }

    fn capabilities(&self) -> CapabilitySet {
        [
            Capability::Sidetone,
            Capability::Battery,
            Capability::Chatmix,
            Capability::InactiveTime,
            Capability::Equalizer,
            Capability::EqualizerPreset,
            Capability::MicMuteLedBrightness,
            Capability::MicVolume,
            Capability::VolumeLimiter,
            Capability::BtWhenPoweredOn,
            Capability::BtCallVolume,
        ]
        .into_iter()
        .collect()
    }

    fn capability_detail(&self, _cap: Capability) -> CapabilityDetail {
        CapabilityDetail::new(0xffc0, 0x1, 3)
    }

    fn equalizer_info(&self) -> Option<EqualizerInfo> {
        Some(EqualizerInfo {
            bands_count: EQ_BANDS,
            baseline: 0,
            step: EQ_BAND_STEP,
            min: EQ_BAND_MIN as i32,
            max: EQ_BAND_MAX as i32,
        })
    }

    fn equalizer_presets_count(&self) -> u8 {
        PRESETS.len() as u8
    }

    fn equalizer_presets(&self) -> Vec<EqualizerPreset> {
        PRESETS
            .iter()
            .map(|(name, values)| EqualizerPreset {
                name: name.to_string(),
                values: values.to_vec(),
            })
            .collect()
    }

    fn get_battery(&self, ctx: &mut RequestContext<'_>) -> Result<BatteryResult> {
        let data = read_status(ctx)?;
        if data.len() < 4 {
            return Err(DeviceError::protocol_error("Response too short"));
        }
        if data[3] == STATUS_OFFLINE {
            return Err(DeviceError::device_offline("Headset not connected"));
        }
        let status = if data[3] == STATUS_CHARGING {
            BatteryStatus::Charging
        } else {
            BatteryStatus::Available
        };
        let level = map_range(i32::from(data[2]), 0, 4, 0, 100).min(100);
        Ok(BatteryResult::new(level, status))
    }

    fn set_sidetone(&self, ctx: &mut RequestContext<'_>, level: u8) -> Result<SidetoneResult> {
        send_command(ctx, &[0x00, 0x39, map_to_discrete(level, 4)])?;
        Ok(SidetoneResult {
            current: level,
            min: 0,
            max: 128,
            device_min: 0,
            device_max: 3,
        })
    }

    fn set_inactive_time(
        &self,
        ctx: &mut RequestContext<'_>,
        minutes: u8,
    ) -> Result<InactiveTimeResult> {
        send_command(ctx, &[0x00, 0xa3, minutes])?;
        Ok(InactiveTimeResult {
            minutes,
            min: 0,
            max: 255,
        })
    }

    fn get_chatmix(&self, ctx: &mut RequestContext<'_>) -> Result<ChatmixResult> {
        let data = read_status(ctx)?;
        if data.len() < 6 {
            return Err(DeviceError::protocol_error("Response too short for chatmix"));
        }
        let game_raw = i32::from(data[4]);
        let chat_raw = i32::from(data[5]);
        let game = map_range(game_raw, 0, 100, 0, 64);
        let chat = map_range(chat_raw, 0, 100, 0, -64);
        Ok(ChatmixResult {
            level: 64 - (chat + game),
            game_volume_percent: game_raw,
            chat_volume_percent: chat_raw,
        })
    }

    fn set_equalizer_preset(
        &self,
        ctx: &mut RequestContext<'_>,
        preset: u8,
    ) -> Result<EqualizerPresetResult> {
        let (_, values) = PRESETS
            .get(usize::from(preset))
            .ok_or_else(|| DeviceError::invalid_parameter("Device only supports presets 0-3"))?;
        self.set_equalizer(ctx, values)?;
        Ok(EqualizerPresetResult {
            preset,
            total_presets: self.equalizer_presets_count(),
        })
    }

    fn set_equalizer(&self, ctx: &mut RequestContext<'_>, bands: &[f32]) -> Result<EqualizerResult> {
        let packet = equalizer_packet(bands)?;
        send_command(ctx, &packet)?;
        Ok(EqualizerResult {})
    }

    fn set_mic_mute_led_brightness(
        &self,
        ctx: &mut RequestContext<'_>,
        brightness: u8,
    ) -> Result<LevelResult> {
        let brightness = brightness.min(3);
        send_command(ctx, &[0x00, 0xae, brightness])?;
        Ok(LevelResult {
            value: brightness,
            min: 0,
            max: 3,
        })
    }

    fn set_mic_volume(&self, ctx: &mut RequestContext<'_>, volume: u8) -> Result<LevelResult> {
        // eight steps; 128 lands on the top one
        let mapped = (volume / 16).min(7);
        send_command(ctx, &[0x00, 0x37, mapped])?;
        Ok(LevelResult {
            value: volume,
            min: 0,
            max: 128,
        })
    }

    fn set_volume_limiter(&self, ctx: &mut RequestContext<'_>, on: bool) -> Result<ToggleResult> {
        send_command(ctx, &[0x00, 0x3a, u8::from(on)])?;
        Ok(ToggleResult { enabled: on })
    }

    fn set_bt_when_powered_on(
        &self,
        ctx: &mut RequestContext<'_>,
        on: bool,
    ) -> Result<ToggleResult> {
        send_command(ctx, &[0x00, 0xb2, u8::from(on)])?;
        send_command(ctx, &SAVE_STATE)?;
        Ok(ToggleResult { enabled: on })
    }

    fn set_bt_call_volume(&self, ctx: &mut RequestContext<'_>, volume: u8) -> Result<LevelResult> {
        if volume > 2 {
            return Err(DeviceError::invalid_parameter(
                "Device only supports values 0-2",
            ));
        }
        send_command(ctx, &[0x00, 0xb3, volume])?;
        Ok(LevelResult {
            value: volume,
            min: 0,
            max: 2,
        })
    }
}
