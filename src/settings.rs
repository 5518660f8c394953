//! Photographic setting translation.
//!
//! Maps the human-readable setting strings stored in camera profiles
//! (`"2.8"`, `"1/125"`, `"ISO 100"`, `"Daylight"`) to the numeric property
//! codes understood by the camera, and back. Matching is exact; there is no
//! rounding to a neighbouring stop.
//!
//! Unknown strings encode to [`UNSUPPORTED`]. The camera clamps that code to
//! its nearest supported value, which is the behaviour operators rely on when
//! a profile was authored on a different body.

use crate::device::PropertyId;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Device code sent for any symbolic value missing from the tables.
pub const UNSUPPORTED: i64 = 0xFFFF_FFFF;

/// The four settings a camera profile carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    /// F-stop (Av)
    Aperture,
    /// Exposure time (Tv)
    ShutterSpeed,
    /// Sensitivity
    Iso,
    /// White balance mode
    WhiteBalance,
}

impl SettingKind {
    /// Every kind, in the order they are applied.
    pub const ALL: [SettingKind; 4] = [
        SettingKind::Aperture,
        SettingKind::ShutterSpeed,
        SettingKind::Iso,
        SettingKind::WhiteBalance,
    ];

    /// Camera property written when applying this setting.
    pub fn property(self) -> PropertyId {
        match self {
            SettingKind::Aperture => PropertyId::Aperture,
            SettingKind::ShutterSpeed => PropertyId::ShutterSpeed,
            SettingKind::Iso => PropertyId::Iso,
            SettingKind::WhiteBalance => PropertyId::WhiteBalance,
        }
    }

    /// Lowercase name used in logs and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKind::Aperture => "aperture",
            SettingKind::ShutterSpeed => "shutter-speed",
            SettingKind::Iso => "iso",
            SettingKind::WhiteBalance => "white-balance",
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aperture" | "fstop" | "av" => Ok(SettingKind::Aperture),
            "shutter-speed" | "shutter" | "exposure" | "tv" => Ok(SettingKind::ShutterSpeed),
            "iso" | "sensitivity" => Ok(SettingKind::Iso),
            "white-balance" | "whitebalance" | "wb" => Ok(SettingKind::WhiteBalance),
            other => Err(format!("Unknown setting kind '{}'", other)),
        }
    }
}

const APERTURE: &[(&str, i64)] = &[
    ("1", 0x08),
    ("1.1", 0x0B),
    ("1.2", 0x0C),
    ("1.2 (1/3)", 0x0D),
    ("1.4", 0x10),
    ("1.6", 0x13),
    ("1.8", 0x14),
    ("1.8 (1/3)", 0x15),
    ("2", 0x18),
    ("2.2", 0x1B),
    ("2.5", 0x1C),
    ("2.5 (1/3)", 0x1D),
    ("2.8", 0x20),
    ("3.2", 0x23),
    ("3.5", 0x24),
    ("3.5 (1/3)", 0x25),
    ("4", 0x28),
    ("4.5", 0x2B),
    ("4.5 (1/3)", 0x2C),
    ("5.0", 0x2D),
    ("5.6", 0x30),
    ("6.3", 0x33),
    ("6.7", 0x34),
    ("7.1", 0x35),
    ("8", 0x38),
    ("9", 0x3B),
    ("9.5", 0x3C),
    ("10", 0x3D),
    ("11", 0x40),
    ("13 (1/3)", 0x43),
    ("13", 0x44),
    ("14", 0x45),
    ("16", 0x48),
    ("18", 0x4B),
    ("19", 0x4C),
    ("20", 0x4D),
    ("22", 0x50),
    ("25", 0x53),
    ("27", 0x54),
    ("29", 0x55),
    ("32", 0x58),
    ("36", 0x5B),
    ("38", 0x5C),
    ("40", 0x5D),
    ("45", 0x60),
    ("51", 0x63),
    ("54", 0x64),
    ("57", 0x65),
    ("64", 0x68),
    ("72", 0x6B),
    ("76", 0x6C),
    ("80", 0x6D),
    ("91", 0x70),
];

const SHUTTER_SPEED: &[(&str, i64)] = &[
    ("30\"", 0x10),
    ("25\"", 0x13),
    ("20\"", 0x14),
    ("20\" (1/3)", 0x15),
    ("15\"", 0x18),
    ("13\"", 0x1B),
    ("10\"", 0x1C),
    ("10\" (1/3)", 0x1D),
    ("8\"", 0x20),
    ("6\" (1/3)", 0x23),
    ("6\"", 0x24),
    ("5\"", 0x25),
    ("4\"", 0x28),
    ("3\"2", 0x2B),
    ("3\"", 0x2C),
    ("2\"5", 0x2D),
    ("2\"", 0x30),
    ("1\"6", 0x33),
    ("1\"5", 0x34),
    ("1\"3", 0x35),
    ("1\"", 0x38),
    ("0\"8", 0x3B),
    ("0\"7", 0x3C),
    ("0\"6", 0x3D),
    ("0\"5", 0x40),
    ("0\"4", 0x43),
    ("0\"3", 0x44),
    ("0\"3 (1/3)", 0x45),
    ("1/4", 0x48),
    ("1/5", 0x4B),
    ("1/6", 0x4C),
    ("1/6 (1/3)", 0x4D),
    ("1/8", 0x50),
    ("1/10 (1/3)", 0x53),
    ("1/10", 0x54),
    ("1/13", 0x55),
    ("1/15", 0x58),
    ("1/20 (1/3)", 0x5B),
    ("1/20", 0x5C),
    ("1/25", 0x5D),
    ("1/30", 0x60),
    ("1/40", 0x63),
    ("1/45", 0x64),
    ("1/50", 0x65),
    ("1/60", 0x68),
    ("1/80", 0x6B),
    ("1/90", 0x6C),
    ("1/100", 0x6D),
    ("1/125", 0x70),
    ("1/160", 0x73),
    ("1/180", 0x74),
    ("1/200", 0x75),
    ("1/250", 0x78),
    ("1/320", 0x7B),
    ("1/350", 0x7C),
    ("1/400", 0x7D),
    ("1/500", 0x80),
    ("1/640", 0x83),
    ("1/750", 0x84),
    ("1/800", 0x85),
    ("1/1000", 0x88),
    ("1/1250", 0x8B),
    ("1/1500", 0x8C),
    ("1/1600", 0x8D),
    ("1/2000", 0x90),
    ("1/2500", 0x93),
    ("1/3000", 0x94),
    ("1/3200", 0x95),
    ("1/4000", 0x98),
    ("1/5000", 0x9B),
    ("1/6000", 0x9C),
    ("1/6400", 0x9D),
    ("1/8000", 0xA0),
];

const ISO: &[(&str, i64)] = &[
    ("ISO Auto", 0x00),
    ("ISO 50", 0x40),
    ("ISO 100", 0x48),
    ("ISO 125", 0x4B),
    ("ISO 160", 0x4D),
    ("ISO 200", 0x50),
    ("ISO 250", 0x53),
    ("ISO 320", 0x55),
    ("ISO 400", 0x58),
    ("ISO 500", 0x5B),
    ("ISO 640", 0x5D),
    ("ISO 800", 0x60),
    ("ISO 1000", 0x63),
    ("ISO 1250", 0x65),
    ("ISO 1600", 0x68),
    ("ISO 2000", 0x6B),
    ("ISO 2500", 0x6D),
    ("ISO 3200", 0x70),
    ("ISO 4000", 0x73),
    ("ISO 5000", 0x75),
    ("ISO 6400", 0x78),
    ("ISO 8000", 0x7B),
    ("ISO 10000", 0x7D),
    ("ISO 12800", 0x80),
    ("ISO 16000", 0x83),
    ("ISO 20000", 0x85),
    ("ISO 25600", 0x88),
    ("ISO 51200", 0x90),
    ("ISO 102400", 0x98),
];

const WHITE_BALANCE: &[(&str, i64)] = &[
    ("Pasted", -2),
    ("Click", -1),
    ("Auto", 0),
    ("Daylight", 1),
    ("Cloudy", 2),
    ("Tungsten", 3),
    ("Fluorescent", 4),
    ("Strobe", 5),
    ("WhitePaper", 6),
    ("Shade", 8),
    ("ColorTemperature", 9),
    ("PCSet1", 10),
    ("PCSet2", 11),
    ("PCSet3", 12),
    ("WhitePaper2", 15),
    ("WhitePaper3", 16),
    ("WhitePaper4", 18),
    ("WhitePaper5", 19),
    ("PCSet4", 20),
    ("PCSet5", 21),
];

struct SettingTable {
    entries: &'static [(&'static str, i64)],
    by_name: HashMap<&'static str, i64>,
    by_code: HashMap<i64, &'static str>,
}

impl SettingTable {
    fn build(entries: &'static [(&'static str, i64)]) -> Self {
        Self {
            entries,
            by_name: entries.iter().copied().collect(),
            by_code: entries.iter().map(|&(name, code)| (code, name)).collect(),
        }
    }
}

static APERTURE_TABLE: Lazy<SettingTable> = Lazy::new(|| SettingTable::build(APERTURE));
static SHUTTER_TABLE: Lazy<SettingTable> = Lazy::new(|| SettingTable::build(SHUTTER_SPEED));
static ISO_TABLE: Lazy<SettingTable> = Lazy::new(|| SettingTable::build(ISO));
static WHITE_BALANCE_TABLE: Lazy<SettingTable> = Lazy::new(|| SettingTable::build(WHITE_BALANCE));

fn table(kind: SettingKind) -> &'static SettingTable {
    match kind {
        SettingKind::Aperture => &APERTURE_TABLE,
        SettingKind::ShutterSpeed => &SHUTTER_TABLE,
        SettingKind::Iso => &ISO_TABLE,
        SettingKind::WhiteBalance => &WHITE_BALANCE_TABLE,
    }
}

/// Bidirectional lookup between symbolic settings and device codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingTranslator;

impl SettingTranslator {
    /// Device code for `value`, or [`UNSUPPORTED`] when the table has no exact match.
    pub fn encode(kind: SettingKind, value: &str) -> i64 {
        table(kind)
            .by_name
            .get(value)
            .copied()
            .unwrap_or(UNSUPPORTED)
    }

    /// Like [`encode`](Self::encode) but distinguishes a miss.
    pub fn try_encode(kind: SettingKind, value: &str) -> Option<i64> {
        table(kind).by_name.get(value).copied()
    }

    /// Symbolic value for a device code; `None` for codes outside the table.
    pub fn decode(kind: SettingKind, code: i64) -> Option<&'static str> {
        table(kind).by_code.get(&code).copied()
    }

    /// All table entries for `kind`, in ascending stop order.
    pub fn choices(kind: SettingKind) -> &'static [(&'static str, i64)] {
        table(kind).entries
    }
}
