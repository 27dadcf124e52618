//! Frame acquisition.
//!
//! This module provides:
//! - Input discovery (`FrameSource::open`)
//! - Frame sampling by recording time (`FrameSource::sample`)

pub mod frames;

pub use frames::{is_image_file, FrameSource, SamplingOptions, IMAGE_EXTENSIONS};
