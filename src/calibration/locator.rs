//! Anchor selection and projection of the calibrated sections.
//!
//! The POWER display is always lit and always the most central cluster on the
//! panel, so it is picked by centrality alone. Every other display is then
//! found by walking the calibrated angle and distance from the anchor and
//! taking the first area whose projected center lands close enough.

use log::trace;
use serde::{Deserialize, Serialize};

use super::section::Section;
use crate::geometry::{angle_degrees, distance, Rect};
use crate::ocr::aoi::Aoi;

/// Tolerance of the projection match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    /// A candidate matches when its projected center is within this many of its own heights.
    pub match_radius_factor: f64,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            match_radius_factor: 2.0,
        }
    }
}

/// A calibrated section together with the area it was matched to.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatedSection {
    pub section: Section,
    /// Index into the area list handed to [`locate`].
    pub aoi: usize,
}

/// Result of locating the panel in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelLayout {
    /// Index of the anchor (POWER) area.
    pub anchor: usize,
    /// Found sections in calibration table order, the anchor included.
    pub sections: Vec<LocatedSection>,
}

impl PanelLayout {
    pub fn find(&self, name: &str) -> Option<&LocatedSection> {
        self.sections.iter().find(|s| s.section.name() == name)
    }
}

/// Index of the rect whose center is closest to the centroid of all centers.
pub fn find_central_index(rects: &[Rect]) -> Option<usize> {
    if rects.is_empty() {
        return None;
    }

    let n = rects.len() as f64;
    let (sum_x, sum_y) = rects.iter().fold((0.0, 0.0), |(sx, sy), r| {
        let (cx, cy) = r.center();
        (sx + cx as f64, sy + cy as f64)
    });
    let centroid = (sum_x / n, sum_y / n);

    rects
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let (cx, cy) = r.center();
            (i, distance((cx as f64, cy as f64), centroid))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Point where `section` is expected, given the anchor rect.
pub fn projection_target(anchor: &Rect, section: &Section) -> (f64, f64) {
    let (px, py) = anchor.projected_center();
    let radians = section.angle.to_radians();
    let reach = anchor.h as f64 * section.length;
    (px as f64 + reach * radians.cos(), py as f64 + reach * radians.sin())
}

/// First rect whose projected center lies within `factor * rect.h` of `target`.
pub fn find_projected_index(target: (f64, f64), rects: &[Rect], factor: f64) -> Option<usize> {
    rects.iter().position(|r| {
        let (cx, cy) = r.projected_center();
        distance((cx as f64, cy as f64), target) <= factor * r.h as f64
    })
}

/// Where an area sits relative to the anchor, in section table units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bearing {
    /// Index into the area list.
    pub aoi: usize,
    /// Degrees from the anchor's projected center, y down.
    pub angle: f64,
    /// Distance between projected centers over the anchor height.
    pub length: f64,
    /// Area height over the anchor height.
    pub height_ratio: f64,
}

/// Measures every area against the anchor.
///
/// These are the numbers a section table entry is made of, so reading them
/// off a good frame is how the calibration is tuned.
pub fn measure_bearings(rects: &[Rect], anchor: usize) -> Vec<Bearing> {
    let Some(anchor_rect) = rects.get(anchor) else {
        return Vec::new();
    };
    if anchor_rect.h <= 0 {
        return Vec::new();
    }

    let (ax, ay) = anchor_rect.projected_center();
    let from = (ax as f64, ay as f64);
    let unit = anchor_rect.h as f64;

    rects
        .iter()
        .enumerate()
        .map(|(aoi, r)| {
            let (cx, cy) = r.projected_center();
            let to = (cx as f64, cy as f64);
            Bearing {
                aoi,
                angle: angle_degrees(from, to),
                length: distance(from, to) / unit,
                height_ratio: r.h as f64 / unit,
            }
        })
        .collect()
}

/// Picks the anchor and matches every calibrated section to an area.
///
/// Returns `None` only when there are no areas at all. Sections whose
/// projection hits nothing are simply left out of the layout.
pub fn locate(aois: &[Aoi], sections: &[Section], params: &LocatorParams) -> Option<PanelLayout> {
    let rects: Vec<Rect> = aois.iter().map(|a| a.rect).collect();
    let anchor = find_central_index(&rects)?;
    let anchor_rect = rects[anchor];

    let mut located = Vec::with_capacity(sections.len());
    for section in sections {
        if section.is_anchor() {
            located.push(LocatedSection {
                section: section.clone(),
                aoi: anchor,
            });
            continue;
        }

        let target = projection_target(&anchor_rect, section);
        match find_projected_index(target, &rects, params.match_radius_factor) {
            Some(aoi) => {
                trace!(
                    "{} matched {} near ({:.0}, {:.0})",
                    section.name(),
                    rects[aoi],
                    target.0,
                    target.1
                );
                located.push(LocatedSection {
                    section: section.clone(),
                    aoi,
                });
            }
            None => trace!(
                "{} not found near ({:.0}, {:.0})",
                section.name(),
                target.0,
                target.1
            ),
        }
    }

    Some(PanelLayout {
        anchor,
        sections: located,
    })
}
