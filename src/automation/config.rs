//! Configuration types for the panel reader.
//!
//! Every threshold of the pipeline and the calibrated section table live in
//! one JSON document. Missing fields fall back to the values tuned on the
//! reference panel, so a config file only needs the settings it changes.

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calibration::{default_sections, LocatorParams, Section};
use crate::ocr::aoi::GroupingParams;
use crate::ocr::display::NormalizerParams;
use crate::ocr::segment::{DecoderConfig, ZoneKind};

/// Whole-frame binarization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Pixels brighter than this are lit segments.
    #[serde(default = "default_frame_threshold")]
    pub threshold: u8,
    /// Square dilation kernel fusing the segments of one glyph, in pixels.
    #[serde(default = "default_frame_dilate_kernel")]
    pub dilate_kernel: u32,
}

fn default_frame_threshold() -> u8 {
    200
}

fn default_frame_dilate_kernel() -> u32 {
    10
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            threshold: default_frame_threshold(),
            dilate_kernel: default_frame_dilate_kernel(),
        }
    }
}

/// Complete reader configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub grouping: GroupingParams,
    #[serde(default)]
    pub locator: LocatorParams,
    #[serde(default)]
    pub normalizer: NormalizerParams,
    #[serde(default)]
    pub decoder: DecoderConfig,
    /// Calibrated displays, in the order their fields are filled.
    #[serde(default = "default_sections")]
    pub sections: Vec<Section>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            grouping: GroupingParams::default(),
            locator: LocatorParams::default(),
            normalizer: NormalizerParams::default(),
            decoder: DecoderConfig::default(),
            sections: default_sections(),
        }
    }
}

impl ReaderConfig {
    /// Parses and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: ReaderConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given and present, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                let config = Self::load(path)?;
                info!("Config loaded from {}", path.display());
                Ok(config)
            }
            Some(path) => {
                info!("{} not found. Using default config.", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("No config given. Using default config.");
                Ok(Self::default())
            }
        }
    }

    /// Writes the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Rejects settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let kinds: Vec<ZoneKind> = self.decoder.zones.iter().map(|z| z.kind).collect();
        if kinds != ZoneKind::ORDER {
            return Err(anyhow!(
                "decoder zones must list {:?} in that order, got {:?}",
                ZoneKind::ORDER,
                kinds
            ));
        }

        let anchors = self.sections.iter().filter(|s| s.is_anchor()).count();
        if anchors != 1 {
            return Err(anyhow!("expected exactly one POWER section, got {}", anchors));
        }

        if self.normalizer.sliding_step <= 0 {
            return Err(anyhow!(
                "sliding step must be positive, got {}",
                self.normalizer.sliding_step
            ));
        }

        Ok(())
    }
}
