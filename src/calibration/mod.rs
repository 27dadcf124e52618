//! Panel calibration: the section table and the anchor-relative locator.
//!
//! The layout is specific to one roaster panel design. Angles and ratios are
//! loaded from configuration so a different camera mount only needs a new table.

pub mod locator;
pub mod section;

pub use locator::{locate, measure_bearings, Bearing, LocatedSection, LocatorParams, PanelLayout};
pub use section::{default_sections, RoastMode, Section, SectionKind};
