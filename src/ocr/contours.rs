//! Contour extraction over binary images.
//!
//! Only top-level borders are used: a lit glyph is one blob, and holes inside
//! it (the counters of "0", "8", ...) carry no layout information. A blob
//! touching the image edge can come back typed as a hole, so the border type
//! is not used for filtering.

use image::GrayImage;
use imageproc::contours::{find_contours, Contour};
use imageproc::point::Point;

use crate::geometry::Rect;

/// Returns the borders of foreground blobs that are not nested in another blob.
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .collect()
}

/// Polygon area enclosed by the contour points (shoelace formula).
///
/// Border points are pixel centers, so a blob of `w x h` pixels has an
/// area of `(w - 1) * (h - 1)`; a single pixel or a one-pixel line has none.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area: i64 = 0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }

    twice_area.abs() as f64 / 2.0
}

/// Pixel-inclusive bounding box of a set of points.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(Rect::from_corners(min_x, min_y, max_x + 1, max_y + 1))
}

/// Bounding boxes of every external contour.
pub fn contour_boxes(binary: &GrayImage) -> Vec<Rect> {
    find_external_contours(binary)
        .iter()
        .filter_map(|c| bounding_rect(&c.points))
        .collect()
}

/// Bounding boxes of external contours whose area is above `min_area`.
///
/// Small specks (dust, reflections, the colon dots before dilation) are dropped here.
pub fn find_boxes(binary: &GrayImage, min_area: f64) -> Vec<Rect> {
    find_external_contours(binary)
        .iter()
        .filter(|c| contour_area(&c.points) > min_area)
        .filter_map(|c| bounding_rect(&c.points))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(img: &mut GrayImage, r: Rect) {
        for y in r.y..r.y2() {
            for x in r.x..r.x2() {
                img.put_pixel(x as u32, y as u32, Luma([255]));
            }
        }
    }

    #[test]
    fn test_contour_area_square() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(contour_area(&pts), 100.0);
        assert_eq!(contour_area(&pts[..2]), 0.0);
    }

    #[test]
    fn test_bounding_rect() {
        let pts = vec![Point::new(3, 4), Point::new(7, 4), Point::new(7, 9)];
        assert_eq!(bounding_rect(&pts), Some(Rect::new(3, 4, 5, 6)));
        assert_eq!(bounding_rect(&[]), None);
    }

    #[test]
    fn test_find_boxes_filters_small() {
        let mut img = GrayImage::new(100, 60);
        fill(&mut img, Rect::new(10, 10, 20, 30));
        fill(&mut img, Rect::new(60, 10, 3, 3));

        let boxes = find_boxes(&img, 50.0);

        assert_eq!(boxes, vec![Rect::new(10, 10, 20, 30)]);
        assert_eq!(contour_boxes(&img).len(), 2);
    }

    #[test]
    fn test_nested_blob_ignored() {
        // a ring with a blob inside its hole
        let mut img = GrayImage::new(60, 60);
        fill(&mut img, Rect::new(5, 5, 50, 50));
        for y in 10..50 {
            for x in 10..50 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        fill(&mut img, Rect::new(25, 25, 10, 10));

        let boxes = contour_boxes(&img);

        assert_eq!(boxes, vec![Rect::new(5, 5, 50, 50)]);
    }

    #[test]
    fn test_blob_touching_border() {
        let mut img = GrayImage::new(20, 20);
        fill(&mut img, Rect::new(0, 0, 5, 20));

        assert_eq!(contour_boxes(&img), vec![Rect::new(0, 0, 5, 20)]);
    }

    #[test]
    fn test_blobs_on_every_edge_kept() {
        let mut img = GrayImage::new(40, 40);
        fill(&mut img, Rect::new(0, 10, 6, 20));
        fill(&mut img, Rect::new(34, 10, 6, 20));
        fill(&mut img, Rect::new(10, 0, 20, 6));
        fill(&mut img, Rect::new(10, 34, 20, 6));

        let mut boxes = find_boxes(&img, 50.0);
        boxes.sort_by_key(|r| (r.x, r.y));

        assert_eq!(
            boxes,
            vec![
                Rect::new(0, 10, 6, 20),
                Rect::new(10, 0, 20, 6),
                Rect::new(10, 34, 20, 6),
                Rect::new(34, 10, 6, 20),
            ]
        );
    }
}
