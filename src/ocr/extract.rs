use anyhow::{anyhow, Context, Result};
use log::warn;
use regex::Regex;
use serde::Serialize;

use crate::calibration::SectionKind;

/// Four digit `MMSS` clock reading, colon already removed.
const TIME_PATTERN: &str = r"^[0-9]{4}$";

/// What the timer shows before a roast starts.
const TIME_PLACEHOLDER: &str = "----";

/// Values read from one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameResult {
    pub name: String,
    pub temperature: i32,
    pub profile: String,
    pub power: i32,
    pub fan: i32,
    /// Elapsed roast time in seconds.
    pub time: u32,
    pub mode: String,
}

impl FrameResult {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Parses a `MMSS` timer reading into seconds.
///
/// `"----"` is the idle timer and reads as zero.
pub fn parse_time(text: &str) -> Result<u32> {
    if text == TIME_PLACEHOLDER {
        return Ok(0);
    }
    let time_regex = Regex::new(TIME_PATTERN)?;
    if !time_regex.is_match(text) {
        return Err(anyhow!("invalid time '{}'", text));
    }

    let minutes: u32 = text[..2].parse()?;
    let seconds: u32 = text[2..].parse()?;

    if minutes >= 60 {
        return Err(anyhow!("invalid minutes {} in '{}'", minutes, text));
    }
    if seconds >= 60 {
        return Err(anyhow!("invalid seconds {} in '{}'", seconds, text));
    }

    Ok(minutes * 60 + seconds)
}

/// Parses a numeric display, ignoring surrounding blanks.
pub fn parse_number(text: &str) -> Result<i32> {
    let trimmed = text.trim();
    trimmed
        .parse::<i32>()
        .with_context(|| format!("not a number: '{}'", text))
}

/// Stores one display's text into the matching field.
///
/// Lamp sections only need to be present; their text is ignored.
pub fn apply_display(result: &mut FrameResult, kind: SectionKind, text: &str) -> Result<()> {
    match kind {
        SectionKind::Temperature => result.temperature = parse_number(text)?,
        SectionKind::Power => result.power = parse_number(text)?,
        SectionKind::Fan => result.fan = parse_number(text)?,
        SectionKind::Time => result.time = parse_time(&text.replace(':', ""))?,
        SectionKind::Profile => result.profile = text.to_string(),
        SectionKind::Mode(mode) => result.mode = mode.label().to_string(),
    }
    Ok(())
}

/// Builds the frame record from the decoded displays, in section table order.
///
/// A display that fails to convert is logged and its field keeps the default.
pub fn assemble(name: &str, displays: &[(SectionKind, String)]) -> FrameResult {
    let mut result = FrameResult::new(name);

    for (kind, text) in displays {
        if let Err(e) = apply_display(&mut result, *kind, text) {
            warn!("{} - {} failed to convert '{}': {:#}", name, kind, text, e);
        }
    }

    result
}
