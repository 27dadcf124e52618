//! Grouping of glyph boxes into display-sized areas of interest (AOIs).
//!
//! Boxes are first banded into rows by vertical overlap, then each row is split
//! into runs of horizontally adjacent boxes. Each run is one candidate display,
//! and keeps its member boxes so the display can later be cut into digit cells.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Thresholds for [`group_boxes`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingParams {
    /// Contours with an area at or below this are discarded before grouping.
    pub min_contour_area: f64,
    /// Maximum horizontal gap between a running area and the next box.
    pub x_threshold: i32,
    /// A box overlapping the running area by more than this ratio is a duplicate.
    pub overlap_skip_ratio: f64,
}

impl Default for GroupingParams {
    fn default() -> Self {
        Self {
            min_contour_area: 50.0,
            x_threshold: 100,
            overlap_skip_ratio: 0.8,
        }
    }
}

/// A merged cluster of glyph boxes believed to form one display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aoi {
    /// Union of all members.
    pub rect: Rect,
    /// Member boxes, sorted by x.
    pub items: Vec<Rect>,
}

impl Aoi {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            items: vec![rect],
        }
    }

    /// Grows the bounding rect to include `rect` and records it as a member.
    pub fn merge(&mut self, rect: Rect) {
        self.rect = self.rect.union(&rect);
        let pos = self.items.partition_point(|item| item.x <= rect.x);
        self.items.insert(pos, rect);
    }
}

fn is_same_row(row: &Rect, rect: &Rect) -> bool {
    (rect.y <= row.y && row.y <= rect.y2()) || (row.y <= rect.y && rect.y <= row.y2())
}

fn is_nearby_x(area: &Rect, rect: &Rect, threshold: i32) -> bool {
    (area.x2() - rect.x).abs() <= threshold || (rect.x2() - area.x).abs() <= threshold
}

/// Bands boxes into rows by vertical overlap with the growing row.
pub fn group_rows(boxes: &[Rect]) -> Vec<Aoi> {
    let mut sorted = boxes.to_vec();
    sorted.sort_by_key(|b| b.y);

    let mut rows: Vec<Aoi> = Vec::new();
    let mut current: Option<Aoi> = None;

    for rect in sorted {
        match current.as_mut() {
            Some(row) if is_same_row(&row.rect, &rect) => row.merge(rect),
            _ => {
                if let Some(row) = current.replace(Aoi::new(rect)) {
                    rows.push(row);
                }
            }
        }
    }

    rows.extend(current);
    rows
}

/// Splits one row into runs of horizontally adjacent boxes.
pub fn merge_row(row: &Aoi, params: &GroupingParams) -> Vec<Aoi> {
    let mut aois: Vec<Aoi> = Vec::new();
    let mut current: Option<Aoi> = None;

    // row members are kept x-sorted by Aoi::merge
    for &rect in &row.items {
        match current.as_mut() {
            Some(aoi) if is_nearby_x(&aoi.rect, &rect, params.x_threshold) => {
                let overlap = aoi.rect.overlap_ratio(&rect);
                if overlap > params.overlap_skip_ratio {
                    debug!("skip overlapped box {} (overlap {:.2} with {})", rect, overlap, aoi.rect);
                } else {
                    aoi.merge(rect);
                }
            }
            _ => {
                if let Some(aoi) = current.replace(Aoi::new(rect)) {
                    aois.push(aoi);
                }
            }
        }
    }

    aois.extend(current);
    aois
}

/// Groups raw glyph boxes into candidate display areas.
///
/// `boxes` should already exclude specks below the minimum contour area.
pub fn group_boxes(boxes: &[Rect], params: &GroupingParams) -> Vec<Aoi> {
    group_rows(boxes)
        .iter()
        .flat_map(|row| merge_row(row, params))
        .collect()
}
