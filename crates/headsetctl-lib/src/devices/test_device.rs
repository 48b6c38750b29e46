//! Virtual headset for exercising the stack without hardware.
//!
//! Every capability returns a canned result. The test profile
//! (`--test-device=PROFILE`) selects failure modes and battery states.

use crate::capability::{Capability, CapabilitySet};
use crate::context::{DispatchOptions, RequestContext};
use crate::device::HeadsetDevice;
use crate::error::{DeviceError, Result};
use crate::result::*;

use super::VENDOR_TEST;

pub const PRODUCT_TEST: u16 = 0xA00C;

/// Profile that fails most calls with a HID error.
pub const PROFILE_ERRORS: u8 = 1;
/// Profile that only exposes sidetone, lights and battery.
pub const PROFILE_LIMITED: u8 = 10;

pub struct TestDevice;

#[track_caller]
fn test_error() -> DeviceError {
    DeviceError::hid_error("Test error condition")
}

fn fail_on_error_profile(ctx: &RequestContext<'_>) -> Result<()> {
    if ctx.test_profile == PROFILE_ERRORS {
        return Err(test_error());
    }
    Ok(())
}

impl HeadsetDevice for TestDevice {
    fn vendor_id(&self) -> u16 {
        VENDOR_TEST
    }

    fn product_ids(&self) -> &[u16] {
        &[PRODUCT_TEST]
    }

    fn name(&self) -> &str {
        "HeadsetControl Test device"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
    }

    fn active_capabilities(&self, options: &DispatchOptions) -> CapabilitySet {
        if options.test_profile == PROFILE_LIMITED {
            return [Capability::Sidetone, Capability::Lights, Capability::Battery]
                .into_iter()
                .collect();
        }
        self.capabilities()
    }

    fn is_test_device(&self) -> bool {
        true
    }

    fn equalizer_info(&self) -> Option<EqualizerInfo> {
        Some(EqualizerInfo {
            bands_count: 10,
            baseline: 0,
            step: 0.5,
            min: -12,
            max: 12,
        })
    }

    fn equalizer_presets_count(&self) -> u8 {
        4
    }

    fn equalizer_presets(&self) -> Vec<EqualizerPreset> {
        ["Flat", "Bass", "Treble", "Vocal"]
            .iter()
            .enumerate()
            .map(|(i, name)| EqualizerPreset {
                name: name.to_string(),
                values: vec![i as f32; 10],
            })
            .collect()
    }

    fn parametric_equalizer_info(&self) -> Option<ParametricEqualizerInfo> {
        Some(ParametricEqualizerInfo {
            bands_count: 10,
            gain_base: 0.0,
            gain_step: 0.5,
            gain_min: -12.0,
            gain_max: 12.0,
            q_min: 0.2,
            q_max: 10.0,
            freq_min: 20,
            freq_max: 20000,
            filter_types: FilterTypes::all(),
        })
    }

    fn set_sidetone(&self, ctx: &mut RequestContext<'_>, level: u8) -> Result<SidetoneResult> {
        fail_on_error_profile(ctx)?;
        Ok(SidetoneResult {
            current: level,
            min: 0,
            max: 128,
            device_min: 0,
            device_max: 128,
        })
    }

    fn get_battery(&self, ctx: &mut RequestContext<'_>) -> Result<BatteryResult> {
        let with = |level, status, mv: i32| BatteryResult {
            voltage_mv: Some(mv),
            ..BatteryResult::new(level, status)
        };
        let result = match ctx.test_profile {
            0 => BatteryResult {
                time_to_empty_min: Some(42 * 720 / 100),
                ..with(42, BatteryStatus::Available, 3650)
            },
            1 => return Err(test_error()),
            2 => BatteryResult {
                time_to_full_min: Some((100 - 50) * 120 / 100),
                ..with(50, BatteryStatus::Charging, 3800)
            },
            3 => BatteryResult {
                mic_status: MicStatus::Up,
                ..BatteryResult::new(64, BatteryStatus::Available)
            },
            4 => return Err(DeviceError::device_offline("Test unavailable")),
            5 => return Err(DeviceError::timeout("Test timeout")),
            6 => BatteryResult {
                time_to_empty_min: Some(720),
                ..with(100, BatteryStatus::Available, 4200)
            },
            7 => BatteryResult {
                time_to_empty_min: Some(72),
                ..with(10, BatteryStatus::Available, 3400)
            },
            _ => BatteryResult::new(42, BatteryStatus::Available),
        };
        Ok(result)
    }

    fn notification_sound(
        &self,
        _ctx: &mut RequestContext<'_>,
        sound_id: u8,
    ) -> Result<NotificationSoundResult> {
        Ok(NotificationSoundResult { sound_id })
    }

    fn set_lights(&self, _ctx: &mut RequestContext<'_>, on: bool) -> Result<LightsResult> {
        Ok(LightsResult { enabled: on })
    }

    fn set_inactive_time(
        &self,
        _ctx: &mut RequestContext<'_>,
        minutes: u8,
    ) -> Result<InactiveTimeResult> {
        Ok(InactiveTimeResult {
            minutes,
            min: 0,
            max: 255,
        })
    }

    fn get_chatmix(&self, ctx: &mut RequestContext<'_>) -> Result<ChatmixResult> {
        fail_on_error_profile(ctx)?;
        Ok(ChatmixResult {
            level: 64,
            game_volume_percent: 50,
            chat_volume_percent: 50,
        })
    }

    fn set_voice_prompts(&self, ctx: &mut RequestContext<'_>, on: bool) -> Result<ToggleResult> {
        fail_on_error_profile(ctx)?;
        Ok(ToggleResult { enabled: on })
    }

    fn set_rotate_to_mute(&self, _ctx: &mut RequestContext<'_>, on: bool) -> Result<ToggleResult> {
        Ok(ToggleResult { enabled: on })
    }

    fn set_equalizer_preset(
        &self,
        ctx: &mut RequestContext<'_>,
        preset: u8,
    ) -> Result<EqualizerPresetResult> {
        fail_on_error_profile(ctx)?;
        Ok(EqualizerPresetResult {
            preset,
            total_presets: self.equalizer_presets_count(),
        })
    }

    fn set_equalizer(&self, ctx: &mut RequestContext<'_>, _bands: &[f32]) -> Result<EqualizerResult> {
        fail_on_error_profile(ctx)?;
        Ok(EqualizerResult {})
    }

    fn set_parametric_equalizer(
        &self,
        ctx: &mut RequestContext<'_>,
        _bands: &[ParametricBand],
    ) -> Result<ParametricEqualizerResult> {
        fail_on_error_profile(ctx)?;
        Ok(ParametricEqualizerResult {})
    }

    fn set_mic_mute_led_brightness(
        &self,
        _ctx: &mut RequestContext<'_>,
        brightness: u8,
    ) -> Result<LevelResult> {
        Ok(LevelResult {
            value: brightness,
            min: 0,
            max: 100,
        })
    }

    fn set_mic_volume(&self, _ctx: &mut RequestContext<'_>, volume: u8) -> Result<LevelResult> {
        Ok(LevelResult {
            value: volume,
            min: 0,
            max: 100,
        })
    }

    fn set_volume_limiter(&self, _ctx: &mut RequestContext<'_>, on: bool) -> Result<ToggleResult> {
        Ok(ToggleResult { enabled: on })
    }

    fn set_bt_when_powered_on(
        &self,
        _ctx: &mut RequestContext<'_>,
        on: bool,
    ) -> Result<ToggleResult> {
        Ok(ToggleResult { enabled: on })
    }

    fn set_bt_call_volume(&self, _ctx: &mut RequestContext<'_>, volume: u8) -> Result<LevelResult> {
        Ok(LevelResult {
            value: volume,
            min: 0,
            max: 100,
        })
    }
}
