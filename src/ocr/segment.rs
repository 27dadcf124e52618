//! Seven-segment decoding of a single digit cell.
//!
//! The cell is binarized, then each of the seven segment zones is cut out and
//! checked for a blob shaped like a lit stroke. The on/off states, in the fixed
//! order top, top-right, bottom-right, bottom, bottom-left, top-left, middle,
//! form a bit string that is looked up in [`SEGMENT_PATTERNS`].

use std::fmt;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use super::contours::contour_boxes;
use super::preprocess::{binarize_digit, crop_region, mask_polygon};
use crate::geometry::Rect;

/// Known segment patterns. `0000000` (all dark) is handled as a blank cell.
pub const SEGMENT_PATTERNS: [(&str, char); 15] = [
    ("1111110", '0'),
    ("0110000", '1'),
    ("1101101", '2'),
    ("1111001", '3'),
    ("0110011", '4'),
    ("1011011", '5'),
    ("1011111", '6'),
    ("1110000", '7'),
    ("1111111", '8'),
    ("1111011", '9'),
    ("1110111", 'A'),
    ("1000110", 'T'),
    ("1001110", 'C'),
    ("0001110", 'L'),
    ("0000001", '-'),
];

const BLANK_PATTERN: &str = "0000000";

/// The seven strokes of a digit, in canonical pattern order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoneKind {
    Top,
    TopRight,
    BottomRight,
    Bottom,
    BottomLeft,
    TopLeft,
    Middle,
}

impl ZoneKind {
    pub const ORDER: [ZoneKind; 7] = [
        ZoneKind::Top,
        ZoneKind::TopRight,
        ZoneKind::BottomRight,
        ZoneKind::Bottom,
        ZoneKind::BottomLeft,
        ZoneKind::TopLeft,
        ZoneKind::Middle,
    ];

    pub fn is_horizontal(&self) -> bool {
        matches!(self, ZoneKind::Top | ZoneKind::Bottom | ZoneKind::Middle)
    }
}

/// Region of a zone as fractions of the cell size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ZoneShape {
    /// Axis-aligned box `[x0, x1) x [y0, y1)`.
    Rect { x0: f32, y0: f32, x1: f32, y1: f32 },
    /// Quadrilateral mask, cropped to its bounding box; for slanted displays.
    Quad { points: [(f32, f32); 4] },
}

/// One segment zone and its stroke filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub kind: ZoneKind,
    #[serde(flatten)]
    pub shape: ZoneShape,
    /// Minimum stroke extent along the zone's long axis, as a fraction of the zone.
    ///
    /// Width for horizontal zones, height for vertical ones.
    #[serde(default = "default_extent_ratio")]
    pub min_extent_ratio: f32,
}

fn default_extent_ratio() -> f32 {
    0.5
}

impl Zone {
    fn rect(kind: ZoneKind, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            kind,
            shape: ZoneShape::Rect { x0, y0, x1, y1 },
            min_extent_ratio: default_extent_ratio(),
        }
    }

    /// Cuts this zone out of a binarized cell.
    pub fn extract(&self, cell: &GrayImage) -> Option<GrayImage> {
        let (w, h) = cell.dimensions();
        let (fw, fh) = (w as f32, h as f32);

        match &self.shape {
            ZoneShape::Rect { x0, y0, x1, y1 } => {
                let rect = Rect::from_corners(
                    (x0 * fw) as i32,
                    (y0 * fh) as i32,
                    (x1 * fw) as i32,
                    (y1 * fh) as i32,
                );
                if rect.w <= 0 || rect.h <= 0 {
                    return None;
                }
                crop_region(cell, &rect)
            }
            ZoneShape::Quad { points } => {
                let pixels: Vec<(i32, i32)> = points
                    .iter()
                    .map(|(x, y)| ((x * fw) as i32, (y * fh) as i32))
                    .collect();
                let x1 = pixels.iter().map(|p| p.0).min()?;
                let y1 = pixels.iter().map(|p| p.1).min()?;
                let x2 = pixels.iter().map(|p| p.0).max()? + 1;
                let y2 = pixels.iter().map(|p| p.1).max()? + 1;
                let masked = mask_polygon(cell, &pixels);
                crop_region(&masked, &Rect::from_corners(x1, y1, x2, y2))
            }
        }
    }
}

/// Parameters of the per-digit decoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Binary threshold applied to the grayscale cell.
    pub threshold: u8,
    /// Square dilation kernel, in pixels.
    pub dilate_kernel: u32,
    /// Square closing kernel, in pixels.
    pub close_kernel: u32,
    /// A horizontal zone is lit when a blob covers this fraction of the zone area.
    pub horizontal_area_ratio: f64,
    /// A vertical zone is lit when a blob covers this fraction of the zone area.
    pub vertical_area_ratio: f64,
    /// Zones in canonical pattern order.
    pub zones: Vec<Zone>,
}

/// Zone layout tuned on the panel footage.
pub fn default_zones() -> Vec<Zone> {
    vec![
        Zone::rect(ZoneKind::Top, 0.1, 0.0, 0.9, 0.3),
        Zone::rect(ZoneKind::TopRight, 0.7, 0.1, 1.0, 0.5),
        Zone::rect(ZoneKind::BottomRight, 0.7, 0.5, 1.0, 0.9),
        Zone::rect(ZoneKind::Bottom, 0.1, 0.7, 0.9, 1.0),
        Zone::rect(ZoneKind::BottomLeft, 0.0, 0.5, 0.3, 0.9),
        Zone::rect(ZoneKind::TopLeft, 0.0, 0.1, 0.3, 0.5),
        Zone::rect(ZoneKind::Middle, 0.1, 0.4, 0.9, 0.6),
    ]
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            threshold: 200,
            dilate_kernel: 3,
            close_kernel: 3,
            horizontal_area_ratio: 0.7,
            vertical_area_ratio: 0.5,
            zones: default_zones(),
        }
    }
}

/// Outcome of decoding one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Char(char),
    /// Every segment dark.
    Blank,
    /// Some segments lit, but not a known pattern.
    Unknown,
}

impl Glyph {
    pub fn as_char(&self) -> Option<char> {
        match self {
            Glyph::Char(c) => Some(*c),
            _ => None,
        }
    }
}

/// Segment states and the glyph they decode to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigitReading {
    pub pattern: String,
    pub glyph: Glyph,
}

impl fmt::Display for DigitReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.glyph {
            Glyph::Char(c) => write!(f, "{} -> '{}'", self.pattern, c),
            Glyph::Blank => write!(f, "{} -> blank", self.pattern),
            Glyph::Unknown => write!(f, "{} -> unknown", self.pattern),
        }
    }
}

/// Looks a bit string up in the pattern table.
pub fn lookup_pattern(pattern: &str) -> Glyph {
    if pattern == BLANK_PATTERN {
        return Glyph::Blank;
    }
    SEGMENT_PATTERNS
        .iter()
        .find(|(p, _)| *p == pattern)
        .map(|(_, c)| Glyph::Char(*c))
        .unwrap_or(Glyph::Unknown)
}

/// Renders zone states as a `'0'/'1'` string in zone order.
pub fn pattern_string(states: &[bool]) -> String {
    states.iter().map(|on| if *on { '1' } else { '0' }).collect()
}

fn zone_is_lit(zone: &Zone, zone_img: &GrayImage, config: &DecoderConfig) -> bool {
    let (zw, zh) = zone_img.dimensions();
    let zone_area = zw as f64 * zh as f64;
    let extent = zone.min_extent_ratio as f64;

    contour_boxes(zone_img).iter().any(|b| {
        let area = b.area() as f64;
        if zone.kind.is_horizontal() {
            b.w as f64 >= extent * zw as f64 || area >= config.horizontal_area_ratio * zone_area
        } else {
            b.h as f64 >= extent * zh as f64 || area >= config.vertical_area_ratio * zone_area
        }
    })
}

/// On/off state of every configured zone of an already binarized cell.
pub fn segment_states(binary: &GrayImage, config: &DecoderConfig) -> Vec<bool> {
    config
        .zones
        .iter()
        .map(|zone| match zone.extract(binary) {
            Some(zone_img) => zone_is_lit(zone, &zone_img, config),
            None => false,
        })
        .collect()
}

/// Decodes an already binarized cell.
pub fn decode_binary(binary: &GrayImage, config: &DecoderConfig) -> DigitReading {
    let pattern = pattern_string(&segment_states(binary, config));
    let glyph = lookup_pattern(&pattern);
    DigitReading { pattern, glyph }
}

/// Binarizes a color cell the way the decoder expects.
pub fn binarize_cell(cell: &RgbImage, config: &DecoderConfig) -> GrayImage {
    binarize_digit(cell, config.threshold, config.dilate_kernel, config.close_kernel)
}

/// Decodes a color digit cell.
pub fn decode_cell(cell: &RgbImage, config: &DecoderConfig) -> DigitReading {
    decode_binary(&binarize_cell(cell, config), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::testing::{digit_image, pattern_for};

    #[test]
    fn test_lookup_pattern() {
        assert_eq!(lookup_pattern("1111110"), Glyph::Char('0'));
        assert_eq!(lookup_pattern("0000001"), Glyph::Char('-'));
        assert_eq!(lookup_pattern("0000000"), Glyph::Blank);
        assert_eq!(lookup_pattern("1010101"), Glyph::Unknown);
    }

    #[test]
    fn test_pattern_table_is_unique() {
        for (i, (a, _)) in SEGMENT_PATTERNS.iter().enumerate() {
            assert_eq!(a.len(), 7);
            for (b, _) in SEGMENT_PATTERNS.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_every_pattern_decodes_from_synthetic_digit() {
        let config = DecoderConfig::default();
        for (pattern, expected) in SEGMENT_PATTERNS {
            let img = digit_image(40, 80, pattern);
            let reading = decode_cell(&img, &config);
            assert_eq!(reading.pattern, pattern, "zones for '{}'", expected);
            assert_eq!(reading.glyph, Glyph::Char(expected));
        }
    }

    #[test]
    fn test_strokes_on_zone_edges_are_lit() {
        // left, top and bottom strokes of these glyphs sit on their zone's crop edge
        let config = DecoderConfig::default();
        for (c, pattern) in [('0', "1111110"), ('4', "0110011"), ('8', "1111111")] {
            let reading = decode_cell(&digit_image(40, 80, pattern), &config);
            assert_eq!(reading.pattern, pattern);
            assert_eq!(reading.glyph, Glyph::Char(c));
        }
    }

    #[test]
    fn test_larger_cell_decodes() {
        let config = DecoderConfig::default();
        for c in ['2', '5', '7', 'A'] {
            let img = digit_image(60, 120, pattern_for(c));
            assert_eq!(decode_cell(&img, &config).glyph, Glyph::Char(c));
        }
    }

    #[test]
    fn test_dark_cell_is_blank() {
        let img = RgbImage::new(40, 80);
        let reading = decode_cell(&img, &DecoderConfig::default());
        assert_eq!(reading.pattern, "0000000");
        assert_eq!(reading.glyph, Glyph::Blank);
    }

    #[test]
    fn test_quad_zone_matches_rect_zone() {
        let mut config = DecoderConfig::default();
        config.zones[0] = Zone {
            kind: ZoneKind::Top,
            shape: ZoneShape::Quad {
                points: [(0.1, 0.0), (0.9, 0.0), (0.9, 0.3), (0.1, 0.3)],
            },
            min_extent_ratio: 0.5,
        };

        let img = digit_image(40, 80, pattern_for('7'));
        assert_eq!(decode_cell(&img, &config).glyph, Glyph::Char('7'));
    }

    #[test]
    fn test_zone_json() {
        let json = r#"{"kind": "top-right", "shape": "rect", "x0": 0.7, "y0": 0.1, "x1": 1.0, "y1": 0.5, "min_extent_ratio": 0.4}"#;
        let zone: Zone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.kind, ZoneKind::TopRight);
        assert_eq!(zone.min_extent_ratio, 0.4);
    }
}
