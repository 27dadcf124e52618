//! Per-frame pipeline: binarize, group, locate, normalize, decode, assemble.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use image::imageops;
use image::RgbImage;
use log::{debug, log_enabled, trace, warn, Level};

use super::aoi::{group_rows, merge_row, Aoi};
use super::contours::find_boxes;
use super::display::{digit_size, read_display, Display, DisplayReading};
use super::extract::{assemble, FrameResult};
use super::preprocess::{binarize_frame, crop_region};
use super::segment::binarize_cell;
use crate::automation::config::ReaderConfig;
use crate::calibration::{locate, measure_bearings, PanelLayout, SectionKind};
use crate::debug::overlay;
use crate::debug::DebugSink;

/// Orientations to try on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Rotation {
    /// 0, 90, 180 and 270 degrees, in that order.
    #[default]
    Auto,
    /// Clockwise degrees, a multiple of 90.
    Fixed(u16),
}

impl Rotation {
    pub fn candidates(&self) -> Vec<u16> {
        match self {
            Rotation::Auto => vec![0, 90, 180, 270],
            Rotation::Fixed(degrees) => vec![*degrees],
        }
    }
}

impl FromStr for Rotation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Rotation::Auto);
        }
        let degrees: u16 = s
            .trim()
            .parse()
            .map_err(|_| anyhow!("rotation must be 'auto' or degrees, got '{}'", s))?;
        match degrees {
            0 | 90 | 180 | 270 => Ok(Rotation::Fixed(degrees)),
            _ => Err(anyhow!("rotation must be 0, 90, 180 or 270, got {}", degrees)),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::Auto => f.write_str("auto"),
            Rotation::Fixed(degrees) => write!(f, "{}", degrees),
        }
    }
}

/// Rotates clockwise by a multiple of 90 degrees.
pub fn rotate(img: &RgbImage, degrees: u16) -> RgbImage {
    match degrees % 360 {
        90 => imageops::rotate90(img),
        180 => imageops::rotate180(img),
        270 => imageops::rotate270(img),
        _ => img.clone(),
    }
}

/// Reads panel frames with one configuration.
pub struct PanelReader<'a> {
    config: &'a ReaderConfig,
    debug: Option<&'a dyn DebugSink>,
}

impl<'a> PanelReader<'a> {
    pub fn new(config: &'a ReaderConfig) -> Self {
        Self { config, debug: None }
    }

    pub fn with_debug(mut self, sink: Option<&'a dyn DebugSink>) -> Self {
        self.debug = sink;
        self
    }

    fn step(&self, frame: &str, step: &str, render: impl FnOnce() -> RgbImage) {
        if let Some(sink) = self.debug {
            sink.write_step(frame, step, &render());
        }
    }

    /// Tries each orientation of `rotation` until one yields a result.
    pub fn read_rotated(&self, name: &str, frame: &RgbImage, rotation: Rotation) -> Option<FrameResult> {
        for degrees in rotation.candidates() {
            let rotated = rotate(frame, degrees);
            if let Some(result) = self.read_frame(name, &rotated) {
                if degrees != 0 {
                    debug!("{} read with rotation {}", name, degrees);
                }
                return Some(result);
            }
            trace!("{} nothing found at rotation {}", name, degrees);
        }
        None
    }

    /// Reads one upright frame.
    ///
    /// Returns `None` when no anchor display can be found.
    pub fn read_frame(&self, name: &str, frame: &RgbImage) -> Option<FrameResult> {
        let config = self.config;

        let binary = binarize_frame(frame, config.frame.threshold, config.frame.dilate_kernel);
        self.step(name, "binary", || overlay::gray_to_rgb(&binary));

        let boxes = find_boxes(&binary, config.grouping.min_contour_area);
        self.step(name, "boxes", || overlay::render_boxes(frame, &boxes));

        let rows = group_rows(&boxes);
        let aois: Vec<Aoi> = rows
            .iter()
            .flat_map(|row| merge_row(row, &config.grouping))
            .collect();
        self.step(name, "aois", || overlay::render_aois(frame, &rows, &aois));

        let Some(layout) = locate(&aois, &config.sections, &config.locator) else {
            debug!("{} - no display found", name);
            return None;
        };
        self.step(name, "projection", || {
            overlay::render_projection(frame, &aois, layout.anchor, &config.sections)
        });

        if log_enabled!(Level::Debug) {
            log_bearings(name, &aois, &layout);
        }

        if layout.find(SectionKind::Power.name()).is_none() {
            debug!("{} - power display not found", name);
            return None;
        }

        let displays = self.build_displays(name, &layout, &aois);
        self.step(name, "displays", || {
            overlay::render_displays(frame, &layout, &aois, &displays)
        });

        let mut values = Vec::with_capacity(displays.len());
        let mut readings = Vec::with_capacity(displays.len());
        for display in &displays {
            if display.skip_detect {
                values.push((display.kind, String::new()));
                continue;
            }

            let reading = read_display(frame, display, &config.decoder, &config.normalizer);
            debug!("{} - {}: '{}'", name, display.name(), reading.text);
            self.write_cells(name, display, &reading, frame);

            values.push((display.kind, reading.text.clone()));
            readings.push(reading);
        }
        self.step(name, "readings", || overlay::render_readings(frame, &readings));

        Some(assemble(name, &values))
    }

    fn build_displays(&self, name: &str, layout: &PanelLayout, aois: &[Aoi]) -> Vec<Display> {
        let mut displays: Vec<Display> = layout
            .sections
            .iter()
            .map(|located| Display::from_aoi(&located.section, &aois[located.aoi]))
            .collect();

        match digit_size(&displays, &self.config.normalizer) {
            Some(size) => {
                trace!("{} - digit size {}x{}", name, size.width, size.height);
                for display in &mut displays {
                    display.normalize(size, &self.config.normalizer);
                }
            }
            None => warn!("{} - no digit size, cells left as found", name),
        }

        displays
    }

    fn write_cells(&self, name: &str, display: &Display, reading: &DisplayReading, frame: &RgbImage) {
        let Some(sink) = self.debug else {
            return;
        };

        for cell in reading.cells.iter().filter(|c| c.pattern.is_some()) {
            if let Some(img) = crop_region(frame, &cell.rect) {
                let binary = binarize_cell(&img, &self.config.decoder);
                let step = format!("{}-{}", display.name(), cell.index);
                sink.write_step(name, &step, &overlay::gray_to_rgb(&binary));
            }
        }
    }
}

/// Logs each area's angle, distance and height against the anchor, with the
/// section it matched.
fn log_bearings(name: &str, aois: &[Aoi], layout: &PanelLayout) {
    let rects: Vec<_> = aois.iter().map(|a| a.rect).collect();
    for bearing in measure_bearings(&rects, layout.anchor) {
        let section = layout
            .sections
            .iter()
            .find(|s| s.aoi == bearing.aoi)
            .map_or("-", |s| s.section.name());
        debug!(
            "{} - area {} {}: angle {:.2} length {:.2} height {:.2} ({})",
            name,
            bearing.aoi,
            rects[bearing.aoi],
            bearing.angle,
            bearing.length,
            bearing.height_ratio,
            section
        );
    }
}
