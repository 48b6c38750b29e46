//! Device interface: one implementation per supported headset model.

use crate::capability::{Capability, CapabilityDetail, CapabilitySet, Platforms};
use crate::context::{DispatchOptions, RequestContext};
use crate::error::{DeviceError, Result};
use crate::result::*;

/// Static description and protocol of one headset model.
///
/// A descriptor holds no per-connection state: it is built once, shared
/// through the [`Registry`](crate::registry::Registry) and handed the open
/// HID handle on every call. Capability methods a model does not override
/// return `not_supported`, so callers never special-case missing features.
pub trait HeadsetDevice: Send + Sync {
    fn vendor_id(&self) -> u16;
    /// Product ids handled by this implementation (hardware revisions).
    fn product_ids(&self) -> &[u16];
    fn name(&self) -> &str;
    fn capabilities(&self) -> CapabilitySet;

    /// Capabilities in effect for a run. Only the test device narrows its
    /// set depending on the selected profile.
    fn active_capabilities(&self, _options: &DispatchOptions) -> CapabilitySet {
        self.capabilities()
    }

    fn platforms(&self) -> Platforms {
        Platforms::ALL
    }

    /// Which HID sub-device serves `cap`.
    fn capability_detail(&self, _cap: Capability) -> CapabilityDetail {
        CapabilityDetail::default()
    }

    /// Test devices skip connection setup and receive a null handle.
    fn is_test_device(&self) -> bool {
        false
    }

    fn supports(&self, cap: Capability) -> bool {
        self.capabilities().contains(cap)
    }

    fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id() == vendor_id && self.product_ids().contains(&product_id)
    }

    // ── Equalizer metadata ──

    fn equalizer_info(&self) -> Option<EqualizerInfo> {
        None
    }

    fn equalizer_presets_count(&self) -> u8 {
        0
    }

    fn equalizer_presets(&self) -> Vec<EqualizerPreset> {
        Vec::new()
    }

    fn parametric_equalizer_info(&self) -> Option<ParametricEqualizerInfo> {
        None
    }

    // ── Capabilities ──

    fn set_sidetone(&self, _ctx: &mut RequestContext<'_>, _level: u8) -> Result<SidetoneResult> {
        Err(unsupported(self.name(), Capability::Sidetone))
    }

    fn get_battery(&self, _ctx: &mut RequestContext<'_>) -> Result<BatteryResult> {
        Err(unsupported(self.name(), Capability::Battery))
    }

    fn notification_sound(
        &self,
        _ctx: &mut RequestContext<'_>,
        _sound_id: u8,
    ) -> Result<NotificationSoundResult> {
        Err(unsupported(self.name(), Capability::NotificationSound))
    }

    fn set_lights(&self, _ctx: &mut RequestContext<'_>, _on: bool) -> Result<LightsResult> {
        Err(unsupported(self.name(), Capability::Lights))
    }

    fn set_inactive_time(
        &self,
        _ctx: &mut RequestContext<'_>,
        _minutes: u8,
    ) -> Result<InactiveTimeResult> {
        Err(unsupported(self.name(), Capability::InactiveTime))
    }

    fn get_chatmix(&self, _ctx: &mut RequestContext<'_>) -> Result<ChatmixResult> {
        Err(unsupported(self.name(), Capability::Chatmix))
    }

    fn set_voice_prompts(&self, _ctx: &mut RequestContext<'_>, _on: bool) -> Result<ToggleResult> {
        Err(unsupported(self.name(), Capability::VoicePrompts))
    }

    fn set_rotate_to_mute(
        &self,
        _ctx: &mut RequestContext<'_>,
        _on: bool,
    ) -> Result<ToggleResult> {
        Err(unsupported(self.name(), Capability::RotateToMute))
    }

    fn set_equalizer_preset(
        &self,
        _ctx: &mut RequestContext<'_>,
        _preset: u8,
    ) -> Result<EqualizerPresetResult> {
        Err(unsupported(self.name(), Capability::EqualizerPreset))
    }

    fn set_equalizer(
        &self,
        _ctx: &mut RequestContext<'_>,
        _bands: &[f32],
    ) -> Result<EqualizerResult> {
        Err(unsupported(self.name(), Capability::Equalizer))
    }

    fn set_parametric_equalizer(
        &self,
        _ctx: &mut RequestContext<'_>,
        _bands: &[ParametricBand],
    ) -> Result<ParametricEqualizerResult> {
        Err(unsupported(self.name(), Capability::ParametricEqualizer))
    }

    fn set_mic_mute_led_brightness(
        &self,
        _ctx: &mut RequestContext<'_>,
        _brightness: u8,
    ) -> Result<LevelResult> {
        Err(unsupported(self.name(), Capability::MicMuteLedBrightness))
    }

    fn set_mic_volume(&self, _ctx: &mut RequestContext<'_>, _volume: u8) -> Result<LevelResult> {
        Err(unsupported(self.name(), Capability::MicVolume))
    }

    fn set_volume_limiter(
        &self,
        _ctx: &mut RequestContext<'_>,
        _on: bool,
    ) -> Result<ToggleResult> {
        Err(unsupported(self.name(), Capability::VolumeLimiter))
    }

    fn set_bt_when_powered_on(
        &self,
        _ctx: &mut RequestContext<'_>,
        _on: bool,
    ) -> Result<ToggleResult> {
        Err(unsupported(self.name(), Capability::BtWhenPoweredOn))
    }

    fn set_bt_call_volume(
        &self,
        _ctx: &mut RequestContext<'_>,
        _volume: u8,
    ) -> Result<LevelResult> {
        Err(unsupported(self.name(), Capability::BtCallVolume))
    }
}

#[track_caller]
fn unsupported(device: &str, cap: Capability) -> DeviceError {
    DeviceError::not_supported(format!("{device} does not implement {}", cap.name()))
}

/// Linear re-scale of `x` from `[in_min, in_max]` to `[out_min, out_max]`.
pub fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Map a 0-128 level onto `levels` discrete steps (`0..levels`).
pub fn map_to_discrete(level: u8, levels: u8) -> u8 {
    if level == 0 || levels <= 1 {
        return 0;
    }
    let step = 128 / u16::from(levels);
    for i in 1..u16::from(levels) {
        if u16::from(level) < step * i {
            return (i - 1) as u8;
        }
    }
    levels - 1
}
