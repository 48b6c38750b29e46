//! Success payloads returned by capability calls.

use std::fmt;

use serde::Serialize;

// ── Battery ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatteryStatus {
    #[serde(rename = "BATTERY_UNAVAILABLE")]
    Unavailable,
    #[serde(rename = "BATTERY_CHARGING")]
    Charging,
    #[serde(rename = "BATTERY_AVAILABLE")]
    Available,
    #[serde(rename = "BATTERY_ERROR")]
    HidError,
    #[serde(rename = "BATTERY_TIMEOUT")]
    Timeout,
}

impl BatteryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatteryStatus::Unavailable => "BATTERY_UNAVAILABLE",
            BatteryStatus::Charging => "BATTERY_CHARGING",
            BatteryStatus::Available => "BATTERY_AVAILABLE",
            BatteryStatus::HidError => "BATTERY_ERROR",
            BatteryStatus::Timeout => "BATTERY_TIMEOUT",
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MicStatus {
    #[default]
    Unknown,
    /// Boom arm raised.
    Up,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryResult {
    /// Charge level, or -1 when the device cannot tell (e.g. while charging).
    pub level_percent: i32,
    pub status: BatteryStatus,
    pub mic_status: MicStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_mv: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_full_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_empty_min: Option<i32>,
}

impl BatteryResult {
    pub fn new(level_percent: i32, status: BatteryStatus) -> Self {
        BatteryResult {
            level_percent,
            status,
            mic_status: MicStatus::Unknown,
            voltage_mv: None,
            time_to_full_min: None,
            time_to_empty_min: None,
        }
    }
}

// ── Per-capability payloads ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidetoneResult {
    pub current: u8,
    pub min: u8,
    pub max: u8,
    /// Raw range the device actually accepts.
    pub device_min: i32,
    pub device_max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationSoundResult {
    pub sound_id: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightsResult {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InactiveTimeResult {
    pub minutes: u8,
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatmixResult {
    /// 0 = all chat, 64 = centred, 128 = all game.
    pub level: i32,
    pub game_volume_percent: i32,
    pub chat_volume_percent: i32,
}

/// On/off result shared by voice prompts, rotate-to-mute, the volume
/// limiter and bluetooth-when-powered-on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleResult {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqualizerPresetResult {
    pub preset: u8,
    pub total_presets: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EqualizerResult {}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParametricEqualizerResult {}

/// Level result shared by mute-LED brightness, microphone volume and
/// bluetooth call volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelResult {
    pub value: u8,
    pub min: u8,
    pub max: u8,
}

// ── Equalizer metadata ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqualizerInfo {
    pub bands_count: usize,
    pub baseline: i32,
    pub step: f32,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqualizerPreset {
    pub name: String,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    LowShelf,
    LowPass,
    Peaking,
    HighPass,
    HighShelf,
    Notch,
}

impl FilterType {
    pub const ALL: [FilterType; 6] = [
        FilterType::LowShelf,
        FilterType::LowPass,
        FilterType::Peaking,
        FilterType::HighPass,
        FilterType::HighShelf,
        FilterType::Notch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::LowShelf => "lowshelf",
            FilterType::LowPass => "lowpass",
            FilterType::Peaking => "peaking",
            FilterType::HighPass => "highpass",
            FilterType::HighShelf => "highshelf",
            FilterType::Notch => "notch",
        }
    }

    pub fn from_name(s: &str) -> Option<FilterType> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmap of supported [`FilterType`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterTypes(u32);

impl FilterTypes {
    pub fn all() -> Self {
        FilterType::ALL.into_iter().collect()
    }

    pub fn contains(self, t: FilterType) -> bool {
        self.0 & t.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = FilterType> {
        FilterType::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<FilterType> for FilterTypes {
    fn from_iter<I: IntoIterator<Item = FilterType>>(iter: I) -> Self {
        FilterTypes(iter.into_iter().fold(0, |acc, t| acc | t.bit()))
    }
}

impl Serialize for FilterTypes {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_seq(self.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParametricEqualizerInfo {
    pub bands_count: usize,
    pub gain_base: f32,
    pub gain_step: f32,
    pub gain_min: f32,
    pub gain_max: f32,
    pub q_min: f32,
    pub q_max: f32,
    pub freq_min: i32,
    pub freq_max: i32,
    pub filter_types: FilterTypes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParametricBand {
    pub frequency: f32,
    pub gain: f32,
    pub q_factor: f32,
    pub filter_type: FilterType,
}

impl ParametricBand {
    /// Peaking band with Q 1.0.
    pub fn new(frequency: f32, gain: f32) -> Self {
        ParametricBand {
            frequency,
            gain,
            q_factor: 1.0,
            filter_type: FilterType::Peaking,
        }
    }
}

// ── Normalized output ──

/// Any capability's success payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureOutput {
    Battery(BatteryResult),
    Sidetone(SidetoneResult),
    NotificationSound(NotificationSoundResult),
    Lights(LightsResult),
    InactiveTime(InactiveTimeResult),
    Chatmix(ChatmixResult),
    Toggle(ToggleResult),
    EqualizerPreset(EqualizerPresetResult),
    Equalizer(EqualizerResult),
    ParametricEqualizer(ParametricEqualizerResult),
    Level(LevelResult),
}

impl FeatureOutput {
    /// The primary integer value of the payload.
    pub fn value(&self) -> i32 {
        match self {
            FeatureOutput::Battery(b) => b.level_percent,
            FeatureOutput::Sidetone(s) => i32::from(s.current),
            FeatureOutput::NotificationSound(n) => i32::from(n.sound_id),
            FeatureOutput::Lights(l) => i32::from(l.enabled),
            FeatureOutput::InactiveTime(i) => i32::from(i.minutes),
            FeatureOutput::Chatmix(c) => c.level,
            FeatureOutput::Toggle(t) => i32::from(t.enabled),
            FeatureOutput::EqualizerPreset(p) => i32::from(p.preset),
            FeatureOutput::Equalizer(_) | FeatureOutput::ParametricEqualizer(_) => 0,
            FeatureOutput::Level(l) => i32::from(l.value),
        }
    }

    /// Short human-readable summary, empty when the value says it all.
    pub fn message(&self) -> String {
        match self {
            FeatureOutput::Chatmix(c) => format!("Chat-Mix: {}", c.level),
            FeatureOutput::Battery(b) => match b.status {
                BatteryStatus::Charging => "Charging".to_string(),
                BatteryStatus::Unavailable => "Battery status unavailable".to_string(),
                _ => String::new(),
            },
            _ => String::new(),
        }
    }

    pub fn battery(&self) -> Option<&BatteryResult> {
        match self {
            FeatureOutput::Battery(b) => Some(b),
            _ => None,
        }
    }
}
