//! Integer rectangle type shared by every stage of the panel reader.
//!
//! All coordinates are in pixels with the origin at the top-left of the frame.
//! Rectangles may sit partly (or entirely) outside the frame after digit cells
//! are grown; cropping clips them back to the image.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `(x, y, w, h)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Builds the rectangle spanning `[x1, x2) x [y1, y2)`.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn x2(&self) -> i32 {
        self.x + self.w
    }

    pub fn y2(&self) -> i32 {
        self.y + self.h
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Integer center, rounding toward the origin like the contour boxes it is computed from.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.x2().max(other.x2()),
            self.y2().max(other.y2()),
        )
    }

    /// Intersection area divided by the smaller of the two areas.
    ///
    /// Returns 0.0 when the rectangles do not intersect (touching edges count as disjoint).
    pub fn overlap_ratio(&self, other: &Rect) -> f64 {
        let left = self.x.max(other.x);
        let right = self.x2().min(other.x2());
        let top = self.y.max(other.y);
        let bottom = self.y2().min(other.y2());

        if right <= left || bottom <= top {
            return 0.0;
        }

        let smaller = self.area().min(other.area());
        if smaller <= 0 {
            return 0.0;
        }

        let intersection = (right - left) as i64 * (bottom - top) as i64;
        intersection as f64 / smaller as f64
    }

    /// Widens the rect to at least twice its height, keeping the right edge.
    ///
    /// A lone "1" glyph is much narrower than a full digit; projecting it to
    /// the canonical digit aspect makes its center comparable with wider displays.
    pub fn projected(&self) -> Rect {
        let width = self.w.max(self.h * 2);
        let x = (self.x2() - width).min(self.x);
        Rect::new(x, self.y, width, self.h)
    }

    /// Center of [`Rect::projected`].
    pub fn projected_center(&self) -> (i32, i32) {
        self.projected().center()
    }

    /// Clips the rect to an image of the given size.
    ///
    /// Returns `None` when nothing of the rect lies inside the image.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Rect> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.x2().min(width as i32);
        let y2 = self.y2().min(height as i32);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(Rect::from_corners(x1, y1, x2, y2))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {} {}x{}]", self.x, self.y, self.w, self.h)
    }
}

/// Euclidean distance between two points.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Angle of the segment `from -> to` in degrees, image coordinates (y down).
pub fn angle_degrees(from: (f64, f64), to: (f64, f64)) -> f64 {
    (to.1 - from.1).atan2(to.0 - from.0).to_degrees()
}
