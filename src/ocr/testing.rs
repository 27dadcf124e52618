//! Synthetic seven-segment rasters for tests.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as DrawRect;

use super::segment::SEGMENT_PATTERNS;
use crate::geometry::Rect;

const LIT: Rgb<u8> = Rgb([255, 255, 255]);

/// Segment strokes as `(x0, y0, x1, y1)` fractions of the glyph cell, in pattern order.
const STROKES: [(f32, f32, f32, f32); 7] = [
    (0.2, 0.025, 0.8, 0.1),
    (0.8, 0.1, 0.95, 0.475),
    (0.8, 0.525, 0.95, 0.9),
    (0.2, 0.9, 0.8, 0.975),
    (0.05, 0.525, 0.2, 0.9),
    (0.05, 0.1, 0.2, 0.475),
    (0.2, 0.4625, 0.8, 0.5375),
];

/// Horizontal advance of a digit and of a colon slot.
pub const DIGIT_PITCH: i32 = 50;
pub const COLON_PITCH: i32 = 20;

/// Pattern string of a character from the decoder table.
pub fn pattern_for(c: char) -> &'static str {
    SEGMENT_PATTERNS
        .iter()
        .find(|(_, ch)| *ch == c)
        .map(|(p, _)| *p)
        .unwrap_or_else(|| panic!("no pattern for {:?}", c))
}

fn stroke_rect(index: usize, x: i32, y: i32, w: u32, h: u32) -> Rect {
    let (x0, y0, x1, y1) = STROKES[index];
    let (fw, fh) = (w as f32, h as f32);
    Rect::from_corners(
        x + (x0 * fw).round() as i32,
        y + (y0 * fh).round() as i32,
        x + (x1 * fw).round() as i32,
        y + (y1 * fh).round() as i32,
    )
}

fn fill(img: &mut RgbImage, r: &Rect) {
    draw_filled_rect_mut(
        img,
        DrawRect::at(r.x, r.y).of_size(r.w as u32, r.h as u32),
        LIT,
    );
}

/// Draws a glyph whose cell has its top-left at `(x, y)`.
pub fn draw_glyph(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, pattern: &str) {
    for (i, bit) in pattern.chars().enumerate() {
        if bit == '1' {
            fill(img, &stroke_rect(i, x, y, w, h));
        }
    }
}

/// A single dark cell with one lit glyph filling it.
pub fn digit_image(w: u32, h: u32, pattern: &str) -> RgbImage {
    let mut img = RgbImage::new(w, h);
    draw_glyph(&mut img, 0, 0, w, h, pattern);
    img
}

/// Lit pixel bounds of a glyph drawn at the origin.
pub fn glyph_bounds(pattern: &str, w: u32, h: u32) -> Option<Rect> {
    pattern
        .chars()
        .enumerate()
        .filter(|(_, bit)| *bit == '1')
        .map(|(i, _)| stroke_rect(i, 0, 0, w, h))
        .reduce(|a, b| a.union(&b))
}

fn colon_dots(x: i32, y: i32) -> [Rect; 2] {
    [Rect::new(x + 7, y + 25, 6, 6), Rect::new(x + 7, y + 49, 6, 6)]
}

/// Draws `text` with 40x80 glyphs; `':'` takes a narrow slot with two dots.
pub fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str) {
    let mut cursor = x;
    for c in text.chars() {
        if c == ':' {
            for dot in colon_dots(cursor, y) {
                fill(img, &dot);
            }
            cursor += COLON_PITCH;
        } else {
            draw_glyph(img, cursor, y, 40, 80, pattern_for(c));
            cursor += DIGIT_PITCH;
        }
    }
}

/// Lit bounds of `text` drawn at the origin with [`draw_text`].
pub fn text_bounds(text: &str) -> Option<Rect> {
    let mut cursor = 0;
    let mut bounds: Option<Rect> = None;
    for c in text.chars() {
        let lit: Vec<Rect> = if c == ':' {
            let dots = colon_dots(cursor, 0).to_vec();
            cursor += COLON_PITCH;
            dots
        } else {
            let glyph = glyph_bounds(pattern_for(c), 40, 80)
                .map(|r| Rect::new(r.x + cursor, r.y, r.w, r.h));
            cursor += DIGIT_PITCH;
            glyph.into_iter().collect()
        };
        for r in lit {
            bounds = Some(bounds.map_or(r, |b| b.union(&r)));
        }
    }
    bounds
}

fn grown(r: &Rect, radius: i32) -> Rect {
    Rect::new(r.x - radius, r.y - radius, r.w + 2 * radius, r.h + 2 * radius)
}

/// Draws `text` so that its dilated box has its projected center at `target`.
///
/// Returns the box the frame pipeline should find for it.
pub fn place_text(img: &mut RgbImage, target: (f64, f64), text: &str, radius: i32) -> Rect {
    let Some(bounds) = text_bounds(text) else {
        panic!("empty text");
    };
    let at_origin = grown(&bounds, radius);
    let (cx, cy) = at_origin.projected_center();
    let x = target.0.round() as i32 - cx;
    let y = target.1.round() as i32 - cy;

    draw_text(img, x, y, text);
    Rect::new(at_origin.x + x, at_origin.y + y, at_origin.w, at_origin.h)
}

/// Draws a lit square lamp whose dilated box has its projected center at `target`.
pub fn place_lamp(img: &mut RgbImage, target: (f64, f64), side: i32, radius: i32) -> Rect {
    let at_origin = grown(&Rect::new(0, 0, side, side), radius);
    let (cx, cy) = at_origin.projected_center();
    let x = target.0.round() as i32 - cx;
    let y = target.1.round() as i32 - cy;

    fill(img, &Rect::new(x, y, side, side));
    Rect::new(at_origin.x + x, at_origin.y + y, at_origin.w, at_origin.h)
}
