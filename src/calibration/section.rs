//! Calibrated panel sections.
//!
//! Each display on the roaster panel sits at a fixed angle and distance from
//! the POWER display. Distances are expressed in multiples of the POWER
//! display height so the table holds across zoom levels.

use std::fmt;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// Roast phase indicated by one of the mode lamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoastMode {
    Preheat,
    Roast,
    Cool,
}

impl RoastMode {
    /// Label written to the result record.
    pub fn label(&self) -> &'static str {
        match self {
            RoastMode::Preheat => "PREHEAT",
            RoastMode::Roast => "ROAST",
            RoastMode::Cool => "COOL",
        }
    }
}

/// Which result field a section feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SectionKind {
    Temperature,
    Power,
    Fan,
    Time,
    Profile,
    Mode(RoastMode),
}

impl SectionKind {
    pub const ALL: [SectionKind; 8] = [
        SectionKind::Temperature,
        SectionKind::Profile,
        SectionKind::Power,
        SectionKind::Fan,
        SectionKind::Time,
        SectionKind::Mode(RoastMode::Preheat),
        SectionKind::Mode(RoastMode::Roast),
        SectionKind::Mode(RoastMode::Cool),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Temperature => "TEMPERATURE",
            SectionKind::Power => "POWER",
            SectionKind::Fan => "FAN",
            SectionKind::Time => "TIME",
            SectionKind::Profile => "PROFILE",
            SectionKind::Mode(RoastMode::Preheat) => "MODE_PREHEAT",
            SectionKind::Mode(RoastMode::Roast) => "MODE_ROAST",
            SectionKind::Mode(RoastMode::Cool) => "MODE_COOL",
        }
    }

    /// True for the three-digit numeric displays whose glyph boxes are the
    /// most reliable reference for the digit cell size.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SectionKind::Temperature | SectionKind::Power | SectionKind::Fan
        )
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for SectionKind {
    type Error = Error;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| anyhow!("unknown section name: {}", name))
    }
}

impl From<SectionKind> for String {
    fn from(kind: SectionKind) -> Self {
        kind.name().to_string()
    }
}

/// Calibration record for one display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "name")]
    pub kind: SectionKind,
    /// Direction from the anchor in degrees (image coordinates, y down).
    pub angle: f64,
    /// Distance from the anchor as a multiple of the anchor height.
    pub length: f64,
    /// Presence alone is meaningful; the digits are never decoded.
    #[serde(default)]
    pub skip_detect: bool,
}

impl Section {
    pub fn new(kind: SectionKind, angle: f64, length: f64) -> Self {
        Self {
            kind,
            angle,
            length,
            skip_detect: false,
        }
    }

    pub fn lamp(mode: RoastMode, angle: f64, length: f64) -> Self {
        Self {
            kind: SectionKind::Mode(mode),
            angle,
            length,
            skip_detect: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// True for the anchor section, which is found by centrality instead of projection.
    pub fn is_anchor(&self) -> bool {
        self.kind == SectionKind::Power
    }
}

/// Calibration measured on the reference panel footage.
pub fn default_sections() -> Vec<Section> {
    vec![
        Section::new(SectionKind::Temperature, -149.85, 4.91),
        Section::new(SectionKind::Profile, -51.16, 2.92),
        Section::new(SectionKind::Power, 0.0, 0.0),
        Section::new(SectionKind::Fan, 0.0, 4.67),
        Section::new(SectionKind::Time, 165.21, 4.48),
        Section::lamp(RoastMode::Preheat, 113.12, 4.24),
        Section::lamp(RoastMode::Roast, 84.61, 4.08),
        Section::lamp(RoastMode::Cool, 54.85, 4.77),
    ]
}
