//! Displays and their digit cells.
//!
//! A display starts as the member glyph boxes of one located area. Before
//! decoding, every cell is resized to a common digit box measured on the
//! numeric displays, and the TIME display gets its colon repaired: the colon
//! is often fused with a neighbouring digit, leaving too few glyph boxes.

use image::RgbImage;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::aoi::Aoi;
use super::preprocess::crop_region;
use super::segment::{decode_cell, DecoderConfig, Glyph};
use crate::calibration::{Section, SectionKind};
use crate::geometry::Rect;

/// Tuning of digit-cell normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerParams {
    /// Gap between a repaired cell and its left neighbour, as a fraction of the digit width.
    pub gap_ratio: f64,
    /// Pixels moved per step of the sliding search.
    pub sliding_step: i32,
    /// Members smaller than this fraction of the digit size in both dimensions are noise.
    pub noise_ratio: f64,
    /// A member at least this tall (fraction of digit height) is a full-height glyph.
    pub full_height_ratio: f64,
    /// A member at most this tall (fraction of digit height) is centered in its cell.
    pub short_ratio: f64,
    /// A full-height member at most this wide (fraction of digit width) is a "1".
    pub narrow_ratio: f64,
    /// Displays whose glyph boxes define the digit size.
    pub reliable: Vec<SectionKind>,
}

impl Default for NormalizerParams {
    fn default() -> Self {
        Self {
            gap_ratio: 0.2333,
            sliding_step: 2,
            noise_ratio: 0.5,
            full_height_ratio: 0.8,
            short_ratio: 0.5,
            narrow_ratio: 0.6,
            reliable: SectionKind::ALL
                .into_iter()
                .filter(SectionKind::is_numeric)
                .collect(),
        }
    }
}

/// Target size of every digit cell in a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitSize {
    pub width: i32,
    pub height: i32,
}

/// One character cell of a display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Digit {
    pub index: usize,
    pub rect: Rect,
    /// The cell may be shifted right until it decodes, as long as its
    /// right edge stays at or left of `max_x2`.
    pub sliding: bool,
    pub max_x2: i32,
    /// Known character; the cell is never decoded.
    pub fixed: Option<char>,
}

impl Digit {
    pub fn new(index: usize, rect: Rect) -> Self {
        Self {
            index,
            rect,
            sliding: false,
            max_x2: rect.x2(),
            fixed: None,
        }
    }

    fn sliding(rect: Rect, max_x2: i32) -> Self {
        Self {
            sliding: true,
            max_x2,
            ..Self::new(0, rect)
        }
    }

    fn colon(rect: Rect) -> Self {
        Self {
            fixed: Some(':'),
            ..Self::new(0, rect)
        }
    }
}

/// A located display and its cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Display {
    pub kind: SectionKind,
    pub rect: Rect,
    pub digits: Vec<Digit>,
    pub fix_colon: bool,
    pub skip_detect: bool,
}

impl Display {
    /// One cell per member box of the area.
    pub fn from_aoi(section: &Section, aoi: &Aoi) -> Self {
        let digits = aoi
            .items
            .iter()
            .enumerate()
            .map(|(i, rect)| Digit::new(i, *rect))
            .collect();

        Self {
            kind: section.kind,
            rect: aoi.rect,
            digits,
            fix_colon: section.kind == SectionKind::Time,
            skip_detect: section.skip_detect,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Largest member width and height.
    pub fn max_digit_size(&self) -> Option<DigitSize> {
        let width = self.digits.iter().map(|d| d.rect.w).max()?;
        let height = self.digits.iter().map(|d| d.rect.h).max()?;
        Some(DigitSize { width, height })
    }

    /// Repairs the colon if needed, then resizes every cell to `size`.
    ///
    /// Lamp displays are left untouched.
    pub fn normalize(&mut self, size: DigitSize, params: &NormalizerParams) {
        if self.skip_detect {
            return;
        }
        if self.fix_colon {
            self.digits = fix_colon(&self.digits, size, params);
        }

        for (index, digit) in self.digits.iter_mut().enumerate() {
            digit.index = index;
            if digit.fixed.is_none() {
                digit.rect = fix_size(&digit.rect, size, params);
            }
        }

        self.rect = self
            .digits
            .iter()
            .fold(self.rect, |acc, digit| acc.union(&digit.rect));
    }
}

/// Digit size measured on the reliable displays.
///
/// Falls back to every decodable display when none of the reliable ones is present.
pub fn digit_size(displays: &[Display], params: &NormalizerParams) -> Option<DigitSize> {
    let measure = |filter: &dyn Fn(&Display) -> bool| {
        displays
            .iter()
            .filter(|d| filter(d))
            .filter_map(Display::max_digit_size)
            .reduce(|a, b| DigitSize {
                width: a.width.max(b.width),
                height: a.height.max(b.height),
            })
    };

    measure(&|d| params.reliable.contains(&d.kind)).or_else(|| measure(&|d| !d.skip_detect))
}

/// Grows a glyph box to the digit size.
///
/// The right edge stays put, since glyphs without left strokes ("1", "7")
/// are missing their left side. Short glyphs ("-") are centered, and a
/// full-height narrow "1" is centered vertically only.
pub fn fix_size(rect: &Rect, size: DigitSize, params: &NormalizerParams) -> Rect {
    let (w, h) = (size.width, size.height);
    let mut x = rect.x - (w - rect.w);
    let mut y = rect.y;

    if rect.h as f64 <= params.short_ratio * h as f64 {
        x = rect.x - (w - rect.w) / 2;
        y = rect.y - (h - rect.h) / 2;
    } else if rect.h as f64 >= params.full_height_ratio * h as f64
        && rect.w as f64 <= params.narrow_ratio * w as f64
    {
        y = rect.y - (h - rect.h) / 2;
    }

    Rect::new(x, y, w, h)
}

fn is_noise(rect: &Rect, size: DigitSize, params: &NormalizerParams) -> bool {
    (rect.w as f64) < params.noise_ratio * size.width as f64
        && (rect.h as f64) < params.noise_ratio * size.height as f64
}

/// Sliding cell that replaces a member fused with the colon.
///
/// The cell may slide until it would overlap the last digit width of the
/// fused member.
fn split_cell(previous: &Rect, fused: &Rect, size: DigitSize, params: &NormalizerParams) -> Digit {
    let x = previous.x2() + (params.gap_ratio * size.width as f64) as i32;
    let mut y = fused.y;
    if fused.h as f64 >= params.full_height_ratio * size.height as f64
        && fused.w as f64 <= params.narrow_ratio * size.width as f64
    {
        y = fused.y - (size.height - fused.h) / 2;
    }

    Digit::sliding(
        Rect::new(x, y, size.width, size.height),
        fused.x2() - size.width,
    )
}

/// Colon cell spanning the gap between two cells.
fn colon_between(left: &Rect, right: &Rect) -> Digit {
    let x = left.x2().min(right.x);
    let w = (right.x - left.x2()).max(1);
    Digit::colon(Rect::new(x, left.y, w, left.h))
}

/// Rebuilds the `MM:SS` cells of a TIME display.
///
/// Noise members are dropped first. Three survivors mean the middle box is
/// `M:S` fused together; four with a full-height second member mean the colon
/// merged into the minute digit. Five members already have the colon in the
/// middle. Anything else (such as a `----` placeholder) is left alone.
pub fn fix_colon(digits: &[Digit], size: DigitSize, params: &NormalizerParams) -> Vec<Digit> {
    let kept: Vec<Digit> = digits
        .iter()
        .filter(|d| {
            let noise = d.fixed.is_none() && is_noise(&d.rect, size, params);
            if noise {
                trace!("drop noise member {}", d.rect);
            }
            !noise
        })
        .copied()
        .collect();

    match kept.len() {
        3 => {
            debug!("splitting fused time digit {}", kept[1].rect);
            let fused = kept[1].rect;
            let slide = split_cell(&kept[0].rect, &fused, size, params);
            let right = Digit::new(
                0,
                Rect::new(fused.x2() - size.width, fused.y, size.width, size.height),
            );
            let colon = colon_between(&slide.rect, &right.rect);
            vec![kept[0], slide, colon, right, kept[2]]
        }
        4 if kept[1].rect.h as f64 >= params.full_height_ratio * size.height as f64 => {
            debug!("fixing time digit width {}", kept[1].rect);
            let slide = split_cell(&kept[0].rect, &kept[1].rect, size, params);
            let colon = colon_between(&slide.rect, &kept[2].rect);
            vec![kept[0], slide, colon, kept[2], kept[3]]
        }
        5 => {
            let mut fixed = kept;
            fixed[2].fixed = Some(':');
            fixed
        }
        _ => kept,
    }
}

/// Decoded cell of a display.
#[derive(Clone, Debug, PartialEq)]
pub struct CellReading {
    pub index: usize,
    /// Cell position that produced `glyph`, after any sliding.
    pub rect: Rect,
    pub glyph: Glyph,
    pub pattern: Option<String>,
}

/// Decoded text of a display with the per-cell detail.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayReading {
    pub text: String,
    pub cells: Vec<CellReading>,
}

fn decode_at(frame: &RgbImage, rect: &Rect, decoder: &DecoderConfig) -> (Glyph, Option<String>) {
    match crop_region(frame, rect) {
        Some(cell) => {
            let reading = decode_cell(&cell, decoder);
            (reading.glyph, Some(reading.pattern))
        }
        None => (Glyph::Unknown, None),
    }
}

fn read_digit(
    frame: &RgbImage,
    digit: &Digit,
    decoder: &DecoderConfig,
    params: &NormalizerParams,
) -> CellReading {
    if let Some(c) = digit.fixed {
        return CellReading {
            index: digit.index,
            rect: digit.rect,
            glyph: Glyph::Char(c),
            pattern: None,
        };
    }

    let mut rect = digit.rect;
    let (mut glyph, mut pattern) = decode_at(frame, &rect, decoder);

    if digit.sliding && params.sliding_step > 0 {
        while glyph.as_char().is_none() {
            let next = Rect {
                x: rect.x + params.sliding_step,
                ..rect
            };
            if next.x2() > digit.max_x2 {
                break;
            }
            rect = next;
            (glyph, pattern) = decode_at(frame, &rect, decoder);
        }
        trace!("sliding digit {} settled at {} ({:?})", digit.index, rect, glyph);
    }

    CellReading {
        index: digit.index,
        rect,
        glyph,
        pattern,
    }
}

/// Decodes every cell of a normalized display.
///
/// Blank cells read as a space. A cell that lights segments but matches no
/// pattern reads as `'?'` once an earlier cell produced a character, and as a
/// space before that.
pub fn read_display(
    frame: &RgbImage,
    display: &Display,
    decoder: &DecoderConfig,
    params: &NormalizerParams,
) -> DisplayReading {
    let mut text = String::with_capacity(display.digits.len());
    let mut cells = Vec::with_capacity(display.digits.len());

    for digit in &display.digits {
        let cell = read_digit(frame, digit, decoder, params);
        let c = match cell.glyph {
            Glyph::Char(c) => c,
            Glyph::Unknown if !text.trim().is_empty() => '?',
            _ => ' ',
        };
        text.push(c);
        cells.push(cell);
    }

    DisplayReading { text, cells }
}
