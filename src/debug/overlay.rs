//! Overlay rendering for the debug images.
//!
//! Each renderer returns a fresh RGB copy of the frame with one pipeline
//! stage drawn on top.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as DrawRect;

use crate::calibration::{PanelLayout, Section};
use crate::calibration::locator::projection_target;
use crate::geometry::Rect;
use crate::ocr::aoi::Aoi;
use crate::ocr::display::{Display, DisplayReading};

/// Color constants for overlay rendering.
pub const COLOR_BOX: Rgb<u8> = Rgb([0, 255, 0]); // Green
pub const COLOR_ROW: Rgb<u8> = Rgb([255, 255, 0]); // Yellow
pub const COLOR_AOI: Rgb<u8> = Rgb([0, 128, 255]); // Blue
pub const COLOR_ANCHOR: Rgb<u8> = Rgb([255, 0, 0]); // Red
pub const COLOR_TARGET: Rgb<u8> = Rgb([255, 0, 255]); // Magenta
pub const COLOR_PROJECTION: Rgb<u8> = Rgb([128, 128, 128]); // Gray
pub const COLOR_DIGIT: Rgb<u8> = Rgb([0, 255, 255]); // Cyan
pub const COLOR_FIXED: Rgb<u8> = Rgb([255, 128, 0]); // Orange

/// Draws a rectangle outline of the given thickness, clipped to the image.
pub fn draw_rect(img: &mut RgbImage, rect: &Rect, color: Rgb<u8>, thickness: i32) {
    for t in 0..thickness.min(rect.w).min(rect.h) {
        let (w, h) = (rect.w - 2 * t, rect.h - 2 * t);
        if w <= 0 || h <= 0 {
            break;
        }
        let outline = DrawRect::at(rect.x + t, rect.y + t).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(img, outline, color);
    }
}

/// Draws a crosshair centered at `(x, y)`.
pub fn draw_crosshair(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, arm_length: i32) {
    let (fx, fy, arm) = (x as f32, y as f32, arm_length as f32);
    draw_line_segment_mut(img, (fx - arm, fy), (fx + arm, fy), color);
    draw_line_segment_mut(img, (fx, fy - arm), (fx, fy + arm), color);
}

/// Binary image as RGB so overlays can be drawn in color.
pub fn gray_to_rgb(img: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(img.clone()).to_rgb8()
}

/// Raw contour boxes.
pub fn render_boxes(base: &RgbImage, boxes: &[Rect]) -> RgbImage {
    let mut img = base.clone();
    for b in boxes {
        draw_rect(&mut img, b, COLOR_BOX, 1);
    }
    img
}

/// Areas with their member boxes; `rows` are drawn first and thicker.
pub fn render_aois(base: &RgbImage, rows: &[Aoi], aois: &[Aoi]) -> RgbImage {
    let mut img = base.clone();
    for row in rows {
        draw_rect(&mut img, &row.rect, COLOR_ROW, 3);
    }
    for aoi in aois {
        draw_rect(&mut img, &aoi.rect, COLOR_AOI, 2);
        for item in &aoi.items {
            draw_rect(&mut img, item, COLOR_BOX, 1);
        }
    }
    img
}

/// Anchor, projected centers of every area, and every calibrated section target.
pub fn render_projection(base: &RgbImage, aois: &[Aoi], anchor: usize, sections: &[Section]) -> RgbImage {
    let mut img = base.clone();
    let Some(anchor_rect) = aois.get(anchor).map(|a| a.rect) else {
        return img;
    };

    let (ax, ay) = anchor_rect.projected_center();
    draw_rect(&mut img, &anchor_rect.projected(), COLOR_ANCHOR, 2);

    for aoi in aois {
        let (cx, cy) = aoi.rect.projected_center();
        draw_line_segment_mut(
            &mut img,
            (ax as f32, ay as f32),
            (cx as f32, cy as f32),
            COLOR_PROJECTION,
        );
        draw_crosshair(&mut img, cx, cy, COLOR_PROJECTION, 5);
    }

    for section in sections.iter().filter(|s| !s.is_anchor()) {
        let (tx, ty) = projection_target(&anchor_rect, section);
        draw_line_segment_mut(&mut img, (ax as f32, ay as f32), (tx as f32, ty as f32), COLOR_TARGET);
        draw_crosshair(&mut img, tx.round() as i32, ty.round() as i32, COLOR_TARGET, 10);
    }

    img
}

/// Located displays after size normalization, with the anchor highlighted.
pub fn render_displays(base: &RgbImage, layout: &PanelLayout, aois: &[Aoi], displays: &[Display]) -> RgbImage {
    let mut img = base.clone();
    if let Some(anchor) = aois.get(layout.anchor) {
        draw_rect(&mut img, &anchor.rect, COLOR_ANCHOR, 3);
    }
    for display in displays {
        draw_rect(&mut img, &display.rect, COLOR_AOI, 2);
        for digit in &display.digits {
            let color = if digit.fixed.is_some() { COLOR_FIXED } else { COLOR_DIGIT };
            draw_rect(&mut img, &digit.rect, color, 1);
        }
    }
    img
}

/// Cells at the positions that produced the decoded characters.
pub fn render_readings(base: &RgbImage, readings: &[DisplayReading]) -> RgbImage {
    let mut img = base.clone();
    for reading in readings {
        for cell in &reading.cells {
            let color = if cell.glyph.as_char().is_some() { COLOR_DIGIT } else { COLOR_ANCHOR };
            draw_rect(&mut img, &cell.rect, color, 1);
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    #[test]
    fn test_draw_rect() {
        let mut img = RgbImage::from_pixel(100, 100, BLACK);
        draw_rect(&mut img, &Rect::new(10, 10, 50, 30), COLOR_BOX, 2);

        assert_eq!(*img.get_pixel(10, 10), COLOR_BOX);
        assert_eq!(*img.get_pixel(59, 39), COLOR_BOX);
        assert_eq!(*img.get_pixel(11, 25), COLOR_BOX);
        assert_eq!(*img.get_pixel(35, 25), BLACK);
    }

    #[test]
    fn test_draw_rect_clips_outside() {
        let mut img = RgbImage::from_pixel(20, 20, BLACK);
        draw_rect(&mut img, &Rect::new(-10, -10, 25, 25), COLOR_BOX, 1);

        assert_eq!(*img.get_pixel(14, 5), COLOR_BOX);
        assert_eq!(*img.get_pixel(5, 14), COLOR_BOX);
        assert_eq!(*img.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn test_draw_crosshair() {
        let mut img = RgbImage::from_pixel(100, 100, BLACK);
        draw_crosshair(&mut img, 50, 50, COLOR_TARGET, 10);

        assert_eq!(*img.get_pixel(50, 50), COLOR_TARGET);
        assert_eq!(*img.get_pixel(58, 50), COLOR_TARGET);
        assert_eq!(*img.get_pixel(50, 41), COLOR_TARGET);
        assert_eq!(*img.get_pixel(55, 55), BLACK);
    }

    #[test]
    fn test_render_projection_marks_targets() {
        let base = RgbImage::from_pixel(400, 300, BLACK);
        let aois = vec![Aoi::new(Rect::new(100, 100, 40, 60))];
        let sections = vec![Section::new(crate::calibration::SectionKind::Fan, 0.0, 2.0)];

        let img = render_projection(&base, &aois, 0, &sections);

        // projected rect (20, 100, 120, 60), center (80, 130), target 120px to the right
        assert_eq!(*img.get_pixel(200, 130), COLOR_TARGET);
        assert_eq!(*img.get_pixel(80, 125), COLOR_PROJECTION);
    }
}
