//! Seven-segment panel recognition.
//!
//! Raster primitives and contour boxes feed the grouping of glyphs into
//! display areas. Located displays are normalized into digit cells, each
//! cell is decoded segment by segment, and the display texts are assembled
//! into one record per frame.

pub mod aoi;
pub mod contours;
pub mod display;
pub mod extract;
pub mod preprocess;
pub mod reader;
pub mod segment;

#[cfg(test)]
pub mod testing;

pub use aoi::{group_boxes, Aoi, GroupingParams};
pub use display::{Digit, Display, NormalizerParams};
pub use extract::{parse_time, FrameResult};
pub use reader::{PanelReader, Rotation};
pub use segment::{DecoderConfig, Glyph, SEGMENT_PATTERNS};
