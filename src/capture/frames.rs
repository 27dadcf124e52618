//! Frame acquisition from extracted video frames.
//!
//! The input is either one image or a directory holding a recording's frames
//! as numbered image files. Frames are sampled every `interval` seconds of
//! recording, starting after `skip` seconds.

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::automation::queue::FrameWorkItem;

/// File extensions accepted as frames.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Which frames of the recording to read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplingOptions {
    /// Seconds skipped at the start.
    pub skip: u32,
    /// Frames to queue; 0 means all.
    pub count: u32,
    /// Seconds between sampled frames.
    pub interval: u32,
    /// Frame rate the sequence was extracted at.
    pub fps: f64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            skip: 0,
            count: 0,
            interval: 30,
            fps: 1.0,
        }
    }
}

impl SamplingOptions {
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(anyhow!("interval must be at least 1 second"));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(anyhow!("fps must be positive, got {}", self.fps));
        }
        Ok(())
    }

    /// Sequence index of the frame at `seconds`.
    pub fn frame_index(&self, seconds: u32) -> usize {
        (seconds as f64 * self.fps).round() as usize
    }
}

/// Returns true if the path has one of the [`IMAGE_EXTENSIONS`].
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// An opened input.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameSource {
    /// A single still image.
    Image(PathBuf),
    /// Frames of a recording, sorted by file name.
    Sequence(Vec<PathBuf>),
}

impl FrameSource {
    /// Opens an image file or a frame directory.
    ///
    /// A missing input, a file that is not an image, or a directory without
    /// frames is an error.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Input path does not exist: {}", path.display()));
        }

        if path.is_file() {
            if !is_image_file(path) {
                return Err(anyhow!("Unsupported input file: {}", path.display()));
            }
            info!("Reading single image {}", path.display());
            return Ok(FrameSource::Image(path.to_path_buf()));
        }

        let entries = fs::read_dir(path)
            .with_context(|| format!("Cannot open frame directory: {}", path.display()))?;

        let mut frames = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Cannot list {}", path.display()))?;
            let frame = entry.path();
            if frame.is_file() && is_image_file(&frame) {
                frames.push(frame);
            } else {
                debug!("Ignoring {}", frame.display());
            }
        }

        if frames.is_empty() {
            return Err(anyhow!("No frames found in {}", path.display()));
        }

        frames.sort();
        info!("Found {} frames in {}", frames.len(), path.display());
        Ok(FrameSource::Sequence(frames))
    }

    /// Frames to read, in recording order.
    pub fn sample(&self, options: SamplingOptions) -> Sampler<'_> {
        Sampler {
            source: self,
            options,
            seconds: options.skip,
            queued: 0,
            done: false,
        }
    }
}

/// Iterator over the sampled frames of a [`FrameSource`].
pub struct Sampler<'a> {
    source: &'a FrameSource,
    options: SamplingOptions,
    seconds: u32,
    queued: u32,
    done: bool,
}

impl Iterator for Sampler<'_> {
    type Item = FrameWorkItem;

    fn next(&mut self) -> Option<FrameWorkItem> {
        if self.done || (self.options.count > 0 && self.queued >= self.options.count) {
            return None;
        }

        let item = match self.source {
            FrameSource::Image(path) => {
                self.done = true;
                FrameWorkItem::new(self.seconds, path.clone())
            }
            FrameSource::Sequence(frames) => {
                let path = frames.get(self.options.frame_index(self.seconds))?;
                FrameWorkItem::new(self.seconds, path.clone())
            }
        };

        self.queued += 1;
        match self.seconds.checked_add(self.options.interval.max(1)) {
            Some(next) => self.seconds = next,
            None => self.done = true,
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_frames(dir: &Path, count: usize) {
        for i in 0..count {
            fs::write(dir.join(format!("{:04}.png", i)), b"").unwrap();
        }
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/0001.png")));
        assert!(is_image_file(Path::new("a/0001.JPG")));
        assert!(!is_image_file(Path::new("a/notes.txt")));
        assert!(!is_image_file(Path::new("a/png")));
    }

    #[test]
    fn test_open_errors() {
        let dir = tempdir().unwrap();
        assert!(FrameSource::open(&dir.path().join("missing")).is_err());
        // empty directory
        assert!(FrameSource::open(dir.path()).is_err());

        let text = dir.path().join("video.mp4");
        fs::write(&text, b"").unwrap();
        assert!(FrameSource::open(&text).is_err());
    }

    #[test]
    fn test_open_sorts_and_filters() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("0002.png"), b"").unwrap();
        fs::write(dir.path().join("0001.png"), b"").unwrap();
        fs::write(dir.path().join("readme.txt"), b"").unwrap();

        let source = FrameSource::open(dir.path()).unwrap();

        let FrameSource::Sequence(frames) = &source else {
            panic!("expected a sequence");
        };
        let names: Vec<_> = frames.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, vec!["0001.png", "0002.png"]);
    }

    #[test]
    fn test_sample_interval_and_skip() {
        let dir = tempdir().unwrap();
        make_frames(dir.path(), 100);
        let source = FrameSource::open(dir.path()).unwrap();

        let options = SamplingOptions {
            skip: 10,
            interval: 30,
            ..SamplingOptions::default()
        };
        let items: Vec<FrameWorkItem> = source.sample(options).collect();

        let seconds: Vec<u32> = items.iter().map(|i| i.seconds).collect();
        assert_eq!(seconds, vec![10, 40, 70]);
        assert_eq!(items[1].name, "frame_40");
        assert!(items[1].path.ends_with("0040.png"));
    }

    #[test]
    fn test_sample_count_and_fps() {
        let dir = tempdir().unwrap();
        make_frames(dir.path(), 300);
        let source = FrameSource::open(dir.path()).unwrap();

        let options = SamplingOptions {
            count: 2,
            interval: 30,
            fps: 2.5,
            ..SamplingOptions::default()
        };
        let items: Vec<FrameWorkItem> = source.sample(options).collect();

        assert_eq!(items.len(), 2);
        assert!(items[0].path.ends_with("0000.png"));
        assert!(items[1].path.ends_with("0075.png"));
    }

    #[test]
    fn test_single_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("panel.jpg");
        fs::write(&path, b"").unwrap();

        let source = FrameSource::open(&path).unwrap();
        let options = SamplingOptions {
            skip: 5,
            ..SamplingOptions::default()
        };
        let items: Vec<FrameWorkItem> = source.sample(options).collect();

        assert_eq!(items, vec![FrameWorkItem::new(5, path)]);
    }

    #[test]
    fn test_validate_options() {
        assert!(SamplingOptions::default().validate().is_ok());
        let zero = SamplingOptions {
            interval: 0,
            ..SamplingOptions::default()
        };
        assert!(zero.validate().is_err());
        let bad_fps = SamplingOptions {
            fps: 0.0,
            ..SamplingOptions::default()
        };
        assert!(bad_fps.validate().is_err());
    }
}
