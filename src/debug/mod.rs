//! Debug image output.
//!
//! The frame pipeline hands intermediate images to an optional sink. Results
//! never depend on whether a sink is attached.

pub mod overlay;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use image::RgbImage;
use log::warn;

/// Receiver of per-step debug images.
pub trait DebugSink: Send + Sync {
    fn write_step(&self, frame: &str, step: &str, image: &RgbImage);
}

/// Saves steps as `<root>/<frame>/<NN>-<step>.png`, numbered per frame.
pub struct DirectorySink {
    root: PathBuf,
    counters: Mutex<HashMap<String, u32>>,
}

impl DirectorySink {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create debug directory {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            counters: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn next_index(&self, frame: &str) -> u32 {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let counter = counters.entry(frame.to_string()).or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }

    fn save(&self, frame: &str, step: &str, image: &RgbImage) -> Result<PathBuf> {
        let dir = self.root.join(frame);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("{:02}-{}.png", self.next_index(frame), step));
        image
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        Ok(path)
    }
}

impl DebugSink for DirectorySink {
    fn write_step(&self, frame: &str, step: &str, image: &RgbImage) {
        if let Err(e) = self.save(frame, step, image) {
            warn!("{} - debug step {} not written: {:#}", frame, step, e);
        }
    }
}

/// Sink that keeps step names in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    pub steps: Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn step_names(&self) -> Vec<String> {
        self.steps
            .lock()
            .unwrap()
            .iter()
            .map(|(_, step)| step.clone())
            .collect()
    }
}

#[cfg(test)]
impl DebugSink for RecordingSink {
    fn write_step(&self, frame: &str, step: &str, _image: &RgbImage) {
        self.steps
            .lock()
            .unwrap()
            .push((frame.to_string(), step.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_directory_sink_numbers_steps_per_frame() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(&dir.path().join("debug")).unwrap();
        let img = RgbImage::new(4, 4);

        sink.write_step("frame_0", "boxes", &img);
        sink.write_step("frame_0", "aois", &img);
        sink.write_step("frame_30", "boxes", &img);

        let root = sink.root();
        assert!(root.join("frame_0").join("00-boxes.png").exists());
        assert!(root.join("frame_0").join("01-aois.png").exists());
        assert!(root.join("frame_30").join("00-boxes.png").exists());
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::default();
        sink.write_step("f", "a", &RgbImage::new(1, 1));
        sink.write_step("f", "b", &RgbImage::new(1, 1));
        assert_eq!(sink.step_names(), vec!["a", "b"]);
    }
}
