//! Capability model: the closed set of headset features.
//!
//! [`CAPABILITIES`] is the one table consulted by validation, help text and
//! output formatting. Each [`Capability`] is a dense index into it, so a
//! device's supported features fit in a [`CapabilitySet`] bitmask.

use std::fmt;

use serde::{Serialize, Serializer};

/// Number of known capabilities.
pub const CAPABILITY_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Capability {
    Sidetone = 0,
    Battery = 1,
    NotificationSound = 2,
    Lights = 3,
    InactiveTime = 4,
    Chatmix = 5,
    VoicePrompts = 6,
    RotateToMute = 7,
    EqualizerPreset = 8,
    Equalizer = 9,
    ParametricEqualizer = 10,
    MicMuteLedBrightness = 11,
    MicVolume = 12,
    VolumeLimiter = 13,
    BtWhenPoweredOn = 14,
    BtCallVolume = 15,
}

/// Whether a capability mutates device state or only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Action,
    Info,
}

/// Inclusive integer range accepted by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueRange {
    pub min: i32,
    pub max: i32,
}

impl ValueRange {
    pub const fn new(min: i32, max: i32) -> Self {
        ValueRange { min, max }
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Static description of one capability.
#[derive(Debug)]
pub struct CapabilityInfo {
    pub capability: Capability,
    /// Stable identifier, e.g. `CAP_SIDETONE`.
    pub ident: &'static str,
    /// Human-readable name, e.g. `notification sound`.
    pub name: &'static str,
    /// Name used on the command line and in JSON, e.g. `notification-sound`.
    pub cli_name: &'static str,
    /// Single-letter shorthand. Capabilities added later have none.
    pub short: Option<char>,
    pub kind: CapabilityKind,
    pub range: Option<ValueRange>,
    pub description: &'static str,
    pub value_hint: &'static str,
}

pub static CAPABILITIES: [CapabilityInfo; CAPABILITY_COUNT] = [
    CapabilityInfo {
        capability: Capability::Sidetone,
        ident: "CAP_SIDETONE",
        name: "sidetone",
        cli_name: "sidetone",
        short: Some('s'),
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 128)),
        description: "Set sidetone level (hear your own voice)",
        value_hint: "0-128",
    },
    CapabilityInfo {
        capability: Capability::Battery,
        ident: "CAP_BATTERY_STATUS",
        name: "battery",
        cli_name: "battery",
        short: Some('b'),
        kind: CapabilityKind::Info,
        range: None,
        description: "Read battery level and charging state",
        value_hint: "",
    },
    CapabilityInfo {
        capability: Capability::NotificationSound,
        ident: "CAP_NOTIFICATION_SOUND",
        name: "notification sound",
        cli_name: "notification-sound",
        short: Some('n'),
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 1)),
        description: "Play a notification sound",
        value_hint: "0-1",
    },
    CapabilityInfo {
        capability: Capability::Lights,
        ident: "CAP_LIGHTS",
        name: "lights",
        cli_name: "lights",
        short: Some('l'),
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 1)),
        description: "Switch lights on or off",
        value_hint: "0|1",
    },
    CapabilityInfo {
        capability: Capability::InactiveTime,
        ident: "CAP_INACTIVE_TIME",
        name: "inactive time",
        cli_name: "inactive-time",
        short: Some('i'),
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 90)),
        description: "Minutes of inactivity before power off (0 = never)",
        value_hint: "0-90",
    },
    CapabilityInfo {
        capability: Capability::Chatmix,
        ident: "CAP_CHATMIX_STATUS",
        name: "chatmix",
        cli_name: "chatmix",
        short: Some('m'),
        kind: CapabilityKind::Info,
        range: None,
        description: "Read the game/chat balance",
        value_hint: "",
    },
    CapabilityInfo {
        capability: Capability::VoicePrompts,
        ident: "CAP_VOICE_PROMPTS",
        name: "voice prompts",
        cli_name: "voice-prompts",
        short: Some('v'),
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 1)),
        description: "Enable or disable voice prompts",
        value_hint: "0|1",
    },
    CapabilityInfo {
        capability: Capability::RotateToMute,
        ident: "CAP_ROTATE_TO_MUTE",
        name: "rotate to mute",
        cli_name: "rotate-to-mute",
        short: Some('r'),
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 1)),
        description: "Mute the microphone when the boom is raised",
        value_hint: "0|1",
    },
    CapabilityInfo {
        capability: Capability::EqualizerPreset,
        ident: "CAP_EQUALIZER_PRESET",
        name: "equalizer preset",
        cli_name: "equalizer-preset",
        short: Some('p'),
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 255)),
        description: "Select an equalizer preset",
        value_hint: "0-255",
    },
    CapabilityInfo {
        capability: Capability::Equalizer,
        ident: "CAP_EQUALIZER",
        name: "equalizer",
        cli_name: "equalizer",
        short: Some('e'),
        kind: CapabilityKind::Action,
        range: None,
        description: "Set a custom equalizer curve",
        value_hint: "GAIN[,GAIN...]",
    },
    CapabilityInfo {
        capability: Capability::ParametricEqualizer,
        ident: "CAP_PARAMETRIC_EQUALIZER",
        name: "parametric equalizer",
        cli_name: "parametric-equalizer",
        short: None,
        kind: CapabilityKind::Action,
        range: None,
        description: "Set parametric equalizer bands",
        value_hint: "FREQ,GAIN[,Q[,TYPE]][;...]|reset",
    },
    CapabilityInfo {
        capability: Capability::MicMuteLedBrightness,
        ident: "CAP_MICROPHONE_MUTE_LED_BRIGHTNESS",
        name: "microphone mute led brightness",
        cli_name: "microphone-mute-led-brightness",
        short: None,
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 3)),
        description: "Brightness of the microphone mute LED",
        value_hint: "0-3",
    },
    CapabilityInfo {
        capability: Capability::MicVolume,
        ident: "CAP_MICROPHONE_VOLUME",
        name: "microphone volume",
        cli_name: "microphone-volume",
        short: None,
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 128)),
        description: "Microphone gain",
        value_hint: "0-128",
    },
    CapabilityInfo {
        capability: Capability::VolumeLimiter,
        ident: "CAP_VOLUME_LIMITER",
        name: "volume limiter",
        cli_name: "volume-limiter",
        short: None,
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 1)),
        description: "Enable or disable the volume limiter",
        value_hint: "0|1",
    },
    CapabilityInfo {
        capability: Capability::BtWhenPoweredOn,
        ident: "CAP_BT_WHEN_POWERED_ON",
        name: "bluetooth when powered on",
        cli_name: "bt-when-powered-on",
        short: None,
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 1)),
        description: "Turn Bluetooth on when the headset powers on",
        value_hint: "0|1",
    },
    CapabilityInfo {
        capability: Capability::BtCallVolume,
        ident: "CAP_BT_CALL_VOLUME",
        name: "bluetooth call volume",
        cli_name: "bt-call-volume",
        short: None,
        kind: CapabilityKind::Action,
        range: Some(ValueRange::new(0, 100)),
        description: "Game volume behaviour during Bluetooth calls",
        value_hint: "0-100",
    },
];

impl Capability {
    /// All capabilities in index order.
    pub const ALL: [Capability; CAPABILITY_COUNT] = [
        Capability::Sidetone,
        Capability::Battery,
        Capability::NotificationSound,
        Capability::Lights,
        Capability::InactiveTime,
        Capability::Chatmix,
        Capability::VoicePrompts,
        Capability::RotateToMute,
        Capability::EqualizerPreset,
        Capability::Equalizer,
        Capability::ParametricEqualizer,
        Capability::MicMuteLedBrightness,
        Capability::MicVolume,
        Capability::VolumeLimiter,
        Capability::BtWhenPoweredOn,
        Capability::BtCallVolume,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Capability> {
        Self::ALL.get(index).copied()
    }

    pub fn info(self) -> &'static CapabilityInfo {
        &CAPABILITIES[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn cli_name(self) -> &'static str {
        self.info().cli_name
    }

    pub fn short(self) -> Option<char> {
        self.info().short
    }

    pub fn kind(self) -> CapabilityKind {
        self.info().kind
    }

    pub fn range(self) -> Option<ValueRange> {
        self.info().range
    }

    pub fn is_action(self) -> bool {
        self.kind() == CapabilityKind::Action
    }

    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    /// Look a capability up by CLI name, identifier, display name or
    /// single-letter shorthand (case-insensitive).
    pub fn from_name(s: &str) -> Option<Capability> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return CAPABILITIES
                .iter()
                .find(|info| info.short == Some(c.to_ascii_lowercase()))
                .map(|info| info.capability);
        }
        let normalized = s.replace('_', "-");
        CAPABILITIES
            .iter()
            .find(|info| {
                info.cli_name.eq_ignore_ascii_case(&normalized)
                    || info.ident.eq_ignore_ascii_case(s)
                    || info.name.eq_ignore_ascii_case(s)
            })
            .map(|info| info.capability)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.cli_name())
    }
}

// ── Capability bitmask ──

/// Set of capabilities, one bit per [`Capability`] index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    pub const EMPTY: CapabilitySet = CapabilitySet(0);

    pub const fn from_bits(bits: u32) -> Self {
        CapabilitySet(bits & ((1 << CAPABILITY_COUNT) - 1))
    }

    pub fn all() -> Self {
        Self::from_bits(u32::MAX)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn with(mut self, cap: Capability) -> Self {
        self.insert(cap);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Capabilities in the set, in index order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::EMPTY;
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

// ── Platforms ──

/// Bitmask of operating systems a device backend works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platforms(u8);

impl Platforms {
    pub const LINUX: Platforms = Platforms(1);
    pub const MACOS: Platforms = Platforms(2);
    pub const WINDOWS: Platforms = Platforms(4);
    pub const ALL: Platforms = Platforms(7);

    pub const fn union(self, other: Platforms) -> Platforms {
        Platforms(self.0 | other.0)
    }

    pub fn contains(self, other: Platforms) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Names of the contained platforms, Linux first.
    pub fn names(self) -> Vec<&'static str> {
        [
            (Platforms::LINUX, "linux"),
            (Platforms::MACOS, "macos"),
            (Platforms::WINDOWS, "windows"),
        ]
        .into_iter()
        .filter(|(p, _)| self.contains(*p))
        .map(|(_, name)| name)
        .collect()
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Platforms {
        if cfg!(windows) {
            Platforms::WINDOWS
        } else if cfg!(target_os = "macos") {
            Platforms::MACOS
        } else {
            Platforms::LINUX
        }
    }
}

impl fmt::Display for Platforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Platforms::ALL {
            return f.write_str("all");
        }
        f.write_str(&self.names().join("/"))
    }
}

impl Serialize for Platforms {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

// ── Routing detail ──

/// Which HID sub-device serves a capability.
///
/// Linux and macOS select by interface number; Windows selects by usage
/// page / usage id when both are non-zero. All zeros means "first
/// enumerated sub-device".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CapabilityDetail {
    pub usage_page: u16,
    pub usage_id: u16,
    pub interface: i32,
}

impl CapabilityDetail {
    pub const fn new(usage_page: u16, usage_id: u16, interface: i32) -> Self {
        CapabilityDetail {
            usage_page,
            usage_id,
            interface,
        }
    }

    /// Connection cache key: interface in the high 32 bits, usage page and
    /// usage id below.
    pub fn cache_key(&self) -> u64 {
        (u64::from(self.interface as u32) << 32)
            | (u64::from(self.usage_page) << 16)
            | u64::from(self.usage_id)
    }
}
