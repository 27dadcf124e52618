//! Reader for the seven-segment control panel of a coffee roaster.
//!
//! Frames of a roast recording are searched for the panel's displays, each
//! display is decoded digit by digit and the readings are assembled into one
//! record per frame.

pub mod automation;
pub mod calibration;
pub mod capture;
pub mod debug;
pub mod geometry;
pub mod logging;
pub mod ocr;
pub mod paths;
