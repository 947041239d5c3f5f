// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filter strategies — ImageMagick when it is usable, the built-in algorithms
// otherwise, and per-page fallback from the first to the second.

use std::fmt;
use std::path::Path;

use folio_core::config::{FilterParameters, ToolSettings};
use folio_core::error::{ErrorClass, Result};
use folio_core::types::Stage;
use folio_document::{ImageMagick, ImageProcessor, high_pass, remove_highlights};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which implementation processed a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ImageMagick,
    Builtin,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ImageMagick => "imagemagick",
            Self::Builtin => "builtin",
        })
    }
}

/// Common to every strategy.
pub trait Strategy {
    fn kind(&self) -> StrategyKind;
}

/// Highlight removal, file to file.
pub trait HighlightStrategy: Strategy {
    fn remove_highlights(&self, input: &Path, output: &Path, threshold: u8) -> Result<()>;
}

/// Sharpening, file to file.
pub trait SharpenStrategy: Strategy {
    fn sharpen(&self, input: &Path, output: &Path, params: &FilterParameters) -> Result<()>;
}

// -- ImageMagick --------------------------------------------------------------

impl Strategy for ImageMagick {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ImageMagick
    }
}

impl HighlightStrategy for ImageMagick {
    fn remove_highlights(&self, input: &Path, output: &Path, threshold: u8) -> Result<()> {
        ImageMagick::remove_highlights(self, input, output, threshold)
    }
}

impl SharpenStrategy for ImageMagick {
    fn sharpen(&self, input: &Path, output: &Path, params: &FilterParameters) -> Result<()> {
        self.unsharp(input, output, params)
    }
}

// -- Built-in -----------------------------------------------------------------

/// The pure-Rust filters from `folio_document::scan`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Builtin;

impl Strategy for Builtin {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Builtin
    }
}

impl HighlightStrategy for Builtin {
    fn remove_highlights(&self, input: &Path, output: &Path, threshold: u8) -> Result<()> {
        let page = ImageProcessor::open(input)?;
        let cleaned = remove_highlights(page.as_dynamic(), threshold);
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(cleaned)).save(output)
    }
}

impl SharpenStrategy for Builtin {
    fn sharpen(&self, input: &Path, output: &Path, params: &FilterParameters) -> Result<()> {
        let page = ImageProcessor::open(input)?;
        let filtered = high_pass(
            page.as_dynamic(),
            params.highpass_sigma,
            params.highpass_contrast,
        );
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(filtered)).save(output)
    }
}

// -- Selection ----------------------------------------------------------------

/// Probe for ImageMagick once per run.
///
/// `None` when the built-in algorithms are forced or the tool doesn't answer.
pub fn probe_imagemagick(settings: &ToolSettings) -> Option<ImageMagick> {
    if settings.force_builtin {
        info!("ImageMagick disabled; using built-in filters");
        return None;
    }
    let magick = ImageMagick::from_settings(settings);
    if magick.is_available() {
        info!(program = magick.program(), "ImageMagick available");
        Some(magick)
    } else {
        warn!(
            program = magick.program(),
            "ImageMagick not available; using built-in filters"
        );
        None
    }
}

/// A preferred strategy with the built-in one behind it.
pub struct Fallback<'a, S: ?Sized> {
    primary: Option<&'a S>,
    builtin: &'a S,
}

impl<'a, S: Strategy + ?Sized> Fallback<'a, S> {
    pub fn new(primary: Option<&'a S>, builtin: &'a S) -> Self {
        Self { primary, builtin }
    }

    /// The built-in strategy alone.
    pub fn builtin_only(builtin: &'a S) -> Self {
        Self::new(None, builtin)
    }

    /// Run `op` with the primary strategy, then with the built-in one if the
    /// primary is absent or fails. Returns whichever succeeded.
    pub fn apply(
        &self,
        stage: Stage,
        index: u32,
        op: impl Fn(&S) -> Result<()>,
    ) -> Result<StrategyKind> {
        if let Some(primary) = self.primary {
            match op(primary) {
                Ok(()) => return Ok(primary.kind()),
                Err(err) => {
                    let degraded = err.class() == ErrorClass::Degraded;
                    warn!(
                        stage = stage.number(),
                        index,
                        strategy = %primary.kind(),
                        error = %err,
                        degraded,
                        "Strategy failed; falling back to built-in"
                    );
                }
            }
        }
        op(self.builtin)?;
        Ok(self.builtin.kind())
    }
}
