//! Feature dispatch: validate, check support, connect, call, normalize.
//!
//! One handler per capability lives in [`HANDLERS`], indexed by
//! [`Capability::index`]. Adding a capability means adding one entry.

use serde::Serialize;

use crate::capability::{CAPABILITY_COUNT, Capability, CapabilityKind};
use crate::connection::DeviceInstance;
use crate::context::RequestContext;
use crate::device::HeadsetDevice;
use crate::error::{DeviceError, ErrorKind, Result};
use crate::result::*;

// ── Parameters ──

/// Typed parameter of a capability request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeatureParam {
    #[default]
    None,
    Int(i32),
    /// One gain per band.
    Equalizer(Vec<f32>),
    Parametric(Vec<ParametricBand>),
}

impl FeatureParam {
    fn shape(&self) -> &'static str {
        match self {
            FeatureParam::None => "no value",
            FeatureParam::Int(_) => "an integer",
            FeatureParam::Equalizer(_) => "an equalizer curve",
            FeatureParam::Parametric(_) => "parametric equalizer bands",
        }
    }
}

/// Check `param` against the capability's declared shape and range.
///
/// Runs before any connection is attempted.
pub fn validate_param(cap: Capability, param: &FeatureParam) -> Result<()> {
    let name = cap.name();

    if cap.kind() == CapabilityKind::Info {
        return match param {
            FeatureParam::None | FeatureParam::Int(_) => Ok(()),
            _ => Err(DeviceError::invalid_parameter(format!(
                "{name} doesn't take a parameter"
            ))),
        };
    }

    let shape_ok = match cap {
        Capability::Equalizer => matches!(param, FeatureParam::Equalizer(_)),
        Capability::ParametricEqualizer => matches!(param, FeatureParam::Parametric(_)),
        _ => matches!(param, FeatureParam::Int(_)),
    };
    if !shape_ok {
        let expected = match cap {
            Capability::Equalizer => "an equalizer curve",
            Capability::ParametricEqualizer => "parametric equalizer bands",
            _ => "an integer",
        };
        return Err(DeviceError::invalid_parameter(format!(
            "{name} expects {expected} (got {})",
            param.shape()
        )));
    }

    if let (FeatureParam::Int(v), Some(range)) = (param, cap.range()) {
        if *v < range.min {
            return Err(DeviceError::invalid_parameter(format!(
                "{name} must be >= {} (got {v})",
                range.min
            )));
        }
        if *v > range.max {
            return Err(DeviceError::invalid_parameter(format!(
                "{name} must be <= {} (got {v})",
                range.max
            )));
        }
    }
    Ok(())
}

fn int_param(cap: Capability, param: &FeatureParam) -> Result<i32> {
    match param {
        FeatureParam::Int(v) => Ok(*v),
        other => Err(DeviceError::invalid_parameter(format!(
            "{} expects an integer (got {})",
            cap.name(),
            other.shape()
        ))),
    }
}

fn u8_param(cap: Capability, param: &FeatureParam) -> Result<u8> {
    let v = int_param(cap, param)?;
    u8::try_from(v).map_err(|_| {
        DeviceError::out_of_bounds(format!("{} value {v} does not fit in a byte", cap.name()))
    })
}

fn bool_param(cap: Capability, param: &FeatureParam) -> Result<bool> {
    Ok(int_param(cap, param)? != 0)
}

// ── Handlers ──

type Handler = fn(&dyn HeadsetDevice, &mut RequestContext<'_>, &FeatureParam) -> Result<FeatureOutput>;

/// Handler per capability, in [`Capability::ALL`] order.
pub static HANDLERS: [Handler; CAPABILITY_COUNT] = [
    // sidetone
    |d, ctx, p| {
        let level = u8_param(Capability::Sidetone, p)?;
        d.set_sidetone(ctx, level).map(FeatureOutput::Sidetone)
    },
    // battery
    |d, ctx, _| d.get_battery(ctx).map(FeatureOutput::Battery),
    // notification sound
    |d, ctx, p| {
        let id = u8_param(Capability::NotificationSound, p)?;
        d.notification_sound(ctx, id)
            .map(FeatureOutput::NotificationSound)
    },
    // lights
    |d, ctx, p| {
        let on = bool_param(Capability::Lights, p)?;
        d.set_lights(ctx, on).map(FeatureOutput::Lights)
    },
    // inactive time
    |d, ctx, p| {
        let minutes = u8_param(Capability::InactiveTime, p)?;
        d.set_inactive_time(ctx, minutes)
            .map(FeatureOutput::InactiveTime)
    },
    // chatmix
    |d, ctx, _| d.get_chatmix(ctx).map(FeatureOutput::Chatmix),
    // voice prompts
    |d, ctx, p| {
        let on = bool_param(Capability::VoicePrompts, p)?;
        d.set_voice_prompts(ctx, on).map(FeatureOutput::Toggle)
    },
    // rotate to mute
    |d, ctx, p| {
        let on = bool_param(Capability::RotateToMute, p)?;
        d.set_rotate_to_mute(ctx, on).map(FeatureOutput::Toggle)
    },
    // equalizer preset
    |d, ctx, p| {
        let preset = u8_param(Capability::EqualizerPreset, p)?;
        d.set_equalizer_preset(ctx, preset)
            .map(FeatureOutput::EqualizerPreset)
    },
    // equalizer
    |d, ctx, p| match p {
        FeatureParam::Equalizer(bands) => d.set_equalizer(ctx, bands).map(FeatureOutput::Equalizer),
        other => Err(DeviceError::invalid_parameter(format!(
            "equalizer expects an equalizer curve (got {})",
            other.shape()
        ))),
    },
    // parametric equalizer
    |d, ctx, p| match p {
        FeatureParam::Parametric(bands) => d
            .set_parametric_equalizer(ctx, bands)
            .map(FeatureOutput::ParametricEqualizer),
        other => Err(DeviceError::invalid_parameter(format!(
            "parametric equalizer expects parametric equalizer bands (got {})",
            other.shape()
        ))),
    },
    // microphone mute led brightness
    |d, ctx, p| {
        let brightness = u8_param(Capability::MicMuteLedBrightness, p)?;
        d.set_mic_mute_led_brightness(ctx, brightness)
            .map(FeatureOutput::Level)
    },
    // microphone volume
    |d, ctx, p| {
        let volume = u8_param(Capability::MicVolume, p)?;
        d.set_mic_volume(ctx, volume).map(FeatureOutput::Level)
    },
    // volume limiter
    |d, ctx, p| {
        let on = bool_param(Capability::VolumeLimiter, p)?;
        d.set_volume_limiter(ctx, on).map(FeatureOutput::Toggle)
    },
    // bluetooth when powered on
    |d, ctx, p| {
        let on = bool_param(Capability::BtWhenPoweredOn, p)?;
        d.set_bt_when_powered_on(ctx, on).map(FeatureOutput::Toggle)
    },
    // bluetooth call volume
    |d, ctx, p| {
        let volume = u8_param(Capability::BtCallVolume, p)?;
        d.set_bt_call_volume(ctx, volume).map(FeatureOutput::Level)
    },
];

// ── Results ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Success,
    /// Validation, support check or device call failed.
    Error,
    /// No HID handle could be opened for the capability.
    DeviceFailedOpen,
    /// Informational outcome, neither success nor failure.
    Info,
    NotProcessed,
}

/// Outcome of one capability request against one device.
#[derive(Debug, Clone)]
pub struct FeatureResult {
    pub capability: Capability,
    pub status: FeatureStatus,
    /// Primary value (battery percent, sidetone level, ...), -1 on error.
    pub value: i32,
    pub message: String,
    pub output: Option<FeatureOutput>,
    pub error: Option<DeviceError>,
}

impl FeatureResult {
    pub fn not_processed(capability: Capability) -> Self {
        FeatureResult {
            capability,
            status: FeatureStatus::NotProcessed,
            value: 0,
            message: String::new(),
            output: None,
            error: None,
        }
    }

    /// Completed request. A charging or unavailable battery is reported as
    /// [`FeatureStatus::Info`].
    pub fn success(capability: Capability, output: FeatureOutput) -> Self {
        let status = match output.battery().map(|b| b.status) {
            Some(BatteryStatus::Charging | BatteryStatus::Unavailable) => FeatureStatus::Info,
            _ => FeatureStatus::Success,
        };
        FeatureResult {
            capability,
            status,
            value: output.value(),
            message: output.message(),
            output: Some(output),
            error: None,
        }
    }

    pub fn error(capability: Capability, error: DeviceError) -> Self {
        FeatureResult {
            capability,
            status: FeatureStatus::Error,
            value: -1,
            message: error.to_string(),
            output: None,
            error: Some(error),
        }
    }

    pub fn failed_open(capability: Capability, error: DeviceError) -> Self {
        FeatureResult {
            status: FeatureStatus::DeviceFailedOpen,
            message: format!("Could not open device: {error}"),
            ..FeatureResult::error(capability, error)
        }
    }

    /// Request skipped on purpose, with the reason in `message`.
    pub fn skipped(capability: Capability, reason: impl Into<String>) -> Self {
        FeatureResult {
            value: -1,
            message: reason.into(),
            ..FeatureResult::not_processed(capability)
        }
    }

    /// Completed without error, informational outcomes included.
    pub fn is_success(&self) -> bool {
        matches!(self.status, FeatureStatus::Success | FeatureStatus::Info)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(DeviceError::kind)
    }

    pub fn battery(&self) -> Option<&BatteryResult> {
        self.output.as_ref().and_then(FeatureOutput::battery)
    }

    /// Battery status to report. A failed battery query reads as
    /// unavailable, with the error kind refining it where possible.
    pub fn battery_status(&self) -> Option<BatteryStatus> {
        if let Some(b) = self.battery() {
            return Some(b.status);
        }
        if self.capability != Capability::Battery || self.error.is_none() {
            return None;
        }
        Some(match self.error_kind() {
            Some(ErrorKind::Timeout) => BatteryStatus::Timeout,
            Some(ErrorKind::HidError) => BatteryStatus::HidError,
            _ => BatteryStatus::Unavailable,
        })
    }
}

// ── Execution ──

/// Run one capability request. Every path yields a [`FeatureResult`].
pub fn execute(instance: &mut DeviceInstance<'_>, cap: Capability, param: &FeatureParam) -> FeatureResult {
    if let Err(e) = validate_param(cap, param) {
        return FeatureResult::error(cap, e);
    }

    if !instance.supports(cap) {
        return FeatureResult::error(
            cap,
            DeviceError::not_supported(format!("This headset doesn't support {}", cap.name())),
        );
    }

    let descriptor = instance.descriptor();
    let options = *instance.options();
    let hid = match instance.connection_for(cap) {
        Ok(hid) => hid,
        Err(e) => {
            log::debug!("{}: cannot connect for {}: {e}", descriptor.name(), cap.name());
            return FeatureResult::failed_open(cap, e);
        }
    };
    let mut ctx = RequestContext::new(hid, &options);

    match HANDLERS[cap.index()](descriptor, &mut ctx, param) {
        Ok(output) => FeatureResult::success(cap, output),
        Err(e) => {
            log::debug!("{}: {} failed: {}", descriptor.name(), cap.name(), e.full_message());
            FeatureResult::error(cap, e)
        }
    }
}

/// A capability request queued for a device.
#[derive(Debug, Clone)]
pub struct FeatureRequest {
    pub capability: Capability,
    pub kind: CapabilityKind,
    pub param: FeatureParam,
    pub should_process: bool,
    pub result: FeatureResult,
}

impl FeatureRequest {
    pub fn new(capability: Capability, param: FeatureParam) -> Self {
        FeatureRequest {
            capability,
            kind: capability.kind(),
            param,
            should_process: true,
            result: FeatureResult::not_processed(capability),
        }
    }

    /// Info request without a parameter.
    pub fn query(capability: Capability) -> Self {
        FeatureRequest::new(capability, FeatureParam::None)
    }
}

/// Execute every pending request in caller order.
///
/// Requests already carrying a result (e.g. skipped during
/// disambiguation) are left untouched.
pub fn process_requests(instance: &mut DeviceInstance<'_>, requests: &mut [FeatureRequest]) {
    for req in requests.iter_mut() {
        if req.should_process && req.result.status == FeatureStatus::NotProcessed {
            req.result = execute(instance, req.capability, &req.param);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DispatchOptions;
    use crate::devices::{LogitechG533, TestDevice, test_device};
    use crate::hid::mock::{FakeBackend, entry};

    fn g533_backend() -> FakeBackend {
        FakeBackend::new(vec![
            entry(0x046d, 0x0a66, 0, 0xff43, 0x0202),
            entry(0x046d, 0x0a66, 3, 0xff00, 0x0001),
            entry(0x046d, 0x0a66, 3, 0xff43, 0x0202),
        ])
    }

    #[test]
    fn handler_table_covers_every_capability() {
        assert_eq!(HANDLERS.len(), Capability::ALL.len());
    }

    #[test]
    fn validate_ranges_and_shapes() {
        assert!(validate_param(Capability::Sidetone, &FeatureParam::Int(128)).is_ok());
        let e = validate_param(Capability::Sidetone, &FeatureParam::Int(129)).unwrap_err();
        assert_eq!(e.details(), "sidetone must be <= 128 (got 129)");
        let e = validate_param(Capability::Sidetone, &FeatureParam::Int(-1)).unwrap_err();
        assert_eq!(e.details(), "sidetone must be >= 0 (got -1)");

        let e = validate_param(Capability::Battery, &FeatureParam::Equalizer(vec![])).unwrap_err();
        assert_eq!(e.details(), "battery doesn't take a parameter");
        assert!(validate_param(Capability::Battery, &FeatureParam::None).is_ok());

        let e = validate_param(Capability::Equalizer, &FeatureParam::Int(1)).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidParameter);
        assert!(validate_param(Capability::Lights, &FeatureParam::None).is_err());
        assert!(
            validate_param(Capability::ParametricEqualizer, &FeatureParam::Parametric(vec![]))
                .is_ok()
        );
    }

    #[test]
    fn unsupported_capability_does_no_io() {
        let backend = g533_backend();
        let dev = LogitechG533;
        let mut inst = DeviceInstance::new(&dev, 0x0a66, &backend, DispatchOptions::default());
        for cap in Capability::ALL {
            if dev.supports(cap) {
                continue;
            }
            let param = match cap {
                Capability::Equalizer => FeatureParam::Equalizer(vec![0.0; 10]),
                Capability::ParametricEqualizer => FeatureParam::Parametric(vec![]),
                c if c.is_action() => FeatureParam::Int(0),
                _ => FeatureParam::None,
            };
            let r = execute(&mut inst, cap, &param);
            assert_eq!(r.status, FeatureStatus::Error);
            assert_eq!(r.error_kind(), Some(ErrorKind::NotSupported));
            assert!(r.message.contains(cap.name()), "{}", r.message);
        }
        assert_eq!(backend.state.io_count(), 0);
    }

    #[test]
    fn invalid_parameter_fails_before_connecting() {
        let backend = g533_backend();
        let dev = LogitechG533;
        let mut inst = DeviceInstance::new(&dev, 0x0a66, &backend, DispatchOptions::default());
        let r = execute(&mut inst, Capability::Sidetone, &FeatureParam::Int(500));
        assert_eq!(r.error_kind(), Some(ErrorKind::InvalidParameter));
        assert_eq!(r.value, -1);
        assert_eq!(backend.state.io_count(), 0);
    }

    #[test]
    fn shared_routing_opens_once() {
        let backend = g533_backend();
        // battery replies twice
        backend
            .state
            .queue_read(vec![0x11, 0xff, 0x07, 0x01, 0x0F, 0x0A, 0x01]);
        backend
            .state
            .queue_read(vec![0x11, 0xff, 0x07, 0x01, 0x0F, 0x0A, 0x01]);
        let dev = LogitechG533;
        let mut inst = DeviceInstance::new(&dev, 0x0a66, &backend, DispatchOptions::default());
        assert!(execute(&mut inst, Capability::Battery, &FeatureParam::None).is_success());
        assert!(execute(&mut inst, Capability::Battery, &FeatureParam::None).is_success());
        assert_eq!(backend.state.opens(), 1);

        assert!(execute(&mut inst, Capability::Sidetone, &FeatureParam::Int(64)).is_success());
        assert_eq!(backend.state.opens(), 2);
    }

    #[test]
    fn open_failure_maps_to_device_failed_open() {
        let backend = g533_backend();
        backend.state.fail_open.set(true);
        let dev = LogitechG533;
        let mut inst = DeviceInstance::new(&dev, 0x0a66, &backend, DispatchOptions::default());
        let r = execute(&mut inst, Capability::Battery, &FeatureParam::None);
        assert_eq!(r.status, FeatureStatus::DeviceFailedOpen);
        assert!(r.message.starts_with("Could not open device"));
        assert_eq!(r.battery_status(), Some(BatteryStatus::HidError));
    }

    #[test]
    fn device_error_is_kept() {
        let backend = g533_backend();
        backend.state.queue_read(vec![0x11, 0xff, 0xff, 0, 0, 0, 0]);
        let dev = LogitechG533;
        let mut inst = DeviceInstance::new(&dev, 0x0a66, &backend, DispatchOptions::default());
        let r = execute(&mut inst, Capability::Battery, &FeatureParam::None);
        assert_eq!(r.status, FeatureStatus::Error);
        assert_eq!(r.error_kind(), Some(ErrorKind::DeviceOffline));
        assert_eq!(r.battery_status(), Some(BatteryStatus::Unavailable));
        drop(inst);
        assert_eq!(backend.state.closes.get(), 1);
    }

    #[test]
    fn equalizer_round_trip_on_test_device() {
        let backend = FakeBackend::new(vec![]);
        let dev = TestDevice;
        let mut inst = DeviceInstance::new(&dev, 0xA00C, &backend, DispatchOptions::default());
        assert!(inst.capabilities().contains(Capability::Equalizer));

        let mut reqs = [FeatureRequest::new(
            Capability::Equalizer,
            FeatureParam::Equalizer(vec![1.5; 10]),
        )];
        process_requests(&mut inst, &mut reqs);
        let r = &reqs[0].result;
        assert!(r.is_success());
        assert_eq!(r.output, Some(FeatureOutput::Equalizer(EqualizerResult {})));
    }

    #[test]
    fn process_requests_keeps_order_and_skips() {
        let backend = FakeBackend::new(vec![]);
        let dev = TestDevice;
        let mut inst = DeviceInstance::new(&dev, 0xA00C, &backend, DispatchOptions::default());
        let mut reqs = vec![
            FeatureRequest::query(Capability::Battery),
            FeatureRequest::new(Capability::Sidetone, FeatureParam::Int(10)),
            FeatureRequest::query(Capability::Chatmix),
        ];
        reqs[1].result = FeatureResult::skipped(Capability::Sidetone, "Multiple devices, specify with -d");
        reqs[2].should_process = false;
        process_requests(&mut inst, &mut reqs);

        assert_eq!(reqs[0].result.value, 42);
        assert_eq!(reqs[1].result.status, FeatureStatus::NotProcessed);
        assert_eq!(reqs[1].result.value, -1);
        assert_eq!(reqs[2].result.status, FeatureStatus::NotProcessed);
    }

    #[test]
    fn chatmix_message_and_profile_errors() {
        let backend = FakeBackend::new(vec![]);
        let dev = TestDevice;
        let mut inst = DeviceInstance::new(&dev, 0xA00C, &backend, DispatchOptions::default());
        let r = execute(&mut inst, Capability::Chatmix, &FeatureParam::None);
        assert_eq!(r.message, "Chat-Mix: 64");
        assert_eq!(r.value, 64);

        let opts = DispatchOptions {
            test_profile: test_device::PROFILE_LIMITED,
            ..DispatchOptions::default()
        };
        let mut inst = DeviceInstance::new(&dev, 0xA00C, &backend, opts);
        let r = execute(&mut inst, Capability::Chatmix, &FeatureParam::None);
        assert_eq!(r.error_kind(), Some(ErrorKind::NotSupported));
        assert_eq!(r.message, "Feature not supported by this device: This headset doesn't support chatmix");
    }

    #[test]
    fn battery_extras_flow_through() {
        let backend = FakeBackend::new(vec![]);
        let dev = TestDevice;
        let opts = DispatchOptions {
            test_profile: 2,
            ..DispatchOptions::default()
        };
        let mut inst = DeviceInstance::new(&dev, 0xA00C, &backend, opts);
        let r = execute(&mut inst, Capability::Battery, &FeatureParam::None);
        let b = r.battery().unwrap();
        assert_eq!(b.time_to_full_min, Some(60));
        assert_eq!(r.battery_status(), Some(BatteryStatus::Charging));
        assert_eq!(r.status, FeatureStatus::Info);
        assert_eq!(r.message, "Charging");
        assert!(r.is_success());

        let opts = DispatchOptions {
            test_profile: 5,
            ..DispatchOptions::default()
        };
        let mut inst = DeviceInstance::new(&dev, 0xA00C, &backend, opts);
        let r = execute(&mut inst, Capability::Battery, &FeatureParam::None);
        assert_eq!(r.battery_status(), Some(BatteryStatus::Timeout));
        assert_eq!(r.value, -1);
    }
}
