// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. One immutable value per run, threaded through
// every stage.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::geometry::{CropGeometry, REFERENCE_DPI};
use crate::types::Stage;

/// Settings for one run of the digitizing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File-name prefix for every artifact and the output PDF.
    pub prefix: String,
    /// Working resolution in DPI for rasterization.
    pub resolution: u32,
    /// Rotation applied to each rasterized sheet, degrees counter-clockwise.
    pub rotation_degrees: f32,
    /// Crop rectangles at [`REFERENCE_DPI`].
    pub geometry: CropGeometry,
    /// Highlight and sharpening parameters.
    pub filter: FilterParameters,
    /// External tool behaviour.
    pub tools: ToolSettings,
    /// Stages to run. Empty means all.
    pub stages: BTreeSet<Stage>,
    /// 1-based positions to drop before assembly.
    pub remove_pages: Vec<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prefix: "MonLivre".into(),
            resolution: REFERENCE_DPI,
            rotation_degrees: -90.0,
            geometry: CropGeometry::default(),
            filter: FilterParameters::default(),
            tools: ToolSettings::default(),
            stages: BTreeSet::new(),
            remove_pages: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|err| {
            FolioError::InvalidConfig(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_slice(&data).map_err(|err| {
            FolioError::InvalidConfig(format!("{}: {}", path.display(), err))
        })?;
        Ok(config)
    }

    /// Reject configurations no stage could run with.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(FolioError::InvalidConfig("prefix must not be empty".into()));
        }
        if self.prefix.contains(['/', '\\']) {
            return Err(FolioError::InvalidConfig(format!(
                "prefix {:?} must not contain path separators",
                self.prefix
            )));
        }
        if self.resolution == 0 {
            return Err(FolioError::InvalidConfig("resolution must be positive".into()));
        }
        if !self.rotation_degrees.is_finite() {
            return Err(FolioError::InvalidConfig("rotation must be a finite number".into()));
        }
        for (name, rect) in [
            ("double-page", self.geometry.double_page),
            ("left", self.geometry.left),
            ("right", self.geometry.right),
        ] {
            if !rect.is_valid() {
                return Err(FolioError::InvalidCrop(format!("{name} {rect}")));
            }
        }
        if self.remove_pages.contains(&0) {
            return Err(FolioError::InvalidPageList("0".into()));
        }
        self.filter.validate()?;
        if self.tools.timeout_secs == 0 {
            return Err(FolioError::InvalidConfig("tool timeout must be positive".into()));
        }
        Ok(())
    }

    /// Crop geometry rescaled to the working resolution.
    pub fn resolved_geometry(&self) -> CropGeometry {
        self.geometry.at_resolution(self.resolution)
    }

    /// Whether `stage` takes part in this run.
    pub fn runs(&self, stage: Stage) -> bool {
        self.stages.is_empty() || self.stages.contains(&stage)
    }

    /// Selected stages in execution order.
    pub fn planned_stages(&self) -> Vec<Stage> {
        Stage::CANONICAL_ORDER
            .into_iter()
            .filter(|stage| self.runs(*stage))
            .collect()
    }
}

/// Parameters of the highlight-removal and sharpening filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    /// Pixels whose maximum channel is below this are kept as text.
    pub highlight_threshold: u8,
    /// Unsharp-mask radius (the blur sigma is `radius / 3`).
    pub sharpen_radius: f32,
    /// Unsharp-mask amount.
    pub sharpen_amount: f32,
    /// Unsharp-mask threshold.
    pub sharpen_threshold: f32,
    /// Gaussian standard deviation of the built-in high-pass filter.
    pub highpass_sigma: f32,
    /// Contrast multiplier applied after the built-in high-pass filter.
    pub highpass_contrast: f32,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            highlight_threshold: 85,
            sharpen_radius: 12.0,
            sharpen_amount: 0.6,
            sharpen_threshold: 0.3,
            highpass_sigma: 900.0,
            highpass_contrast: 4.5,
        }
    }
}

impl FilterParameters {
    /// Blur sigma handed to the unsharp mask.
    pub fn unsharp_sigma(&self) -> f32 {
        self.sharpen_radius / 3.0
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("filter radius", self.sharpen_radius),
            ("high-pass sigma", self.highpass_sigma),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FolioError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("filter amount", self.sharpen_amount),
            ("filter threshold", self.sharpen_threshold),
            ("high-pass contrast", self.highpass_contrast),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(FolioError::InvalidConfig(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// How external tools are located and supervised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Skip the external raster tool and always use the built-in algorithms.
    pub force_builtin: bool,
    /// ImageMagick entry point.
    pub imagemagick: String,
    /// Poppler rasterizer entry point.
    pub pdftoppm: String,
    /// Per-invocation time limit; expiry counts as a tool failure.
    pub timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            force_builtin: false,
            imagemagick: "convert".into(),
            pdftoppm: "pdftoppm".into(),
            timeout_secs: 120,
        }
    }
}
