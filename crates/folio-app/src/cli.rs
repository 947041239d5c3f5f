// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface. Flags override values from `--config`, which
// override the built-in defaults.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use folio_core::config::PipelineConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::{Rect, Stage, parse_page_list};

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    version,
    about = "Turn scanned double-page book spreads into a clean, page-ordered PDF"
)]
pub struct Cli {
    /// Source document (PDF, or a single PNG/JPEG/TIFF spread).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory; artifacts go to `<output>/images/`.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Stage to run (repeatable): 1 rasterize, 2 split, 3 remove highlights,
    /// 4 sharpen, 5 assemble, 6 remove pages. Default: all.
    #[arg(long = "step", value_name = "N", value_parser = clap::value_parser!(u8).range(1..=6))]
    pub steps: Vec<u8>,

    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Artifact and document name prefix [default: MonLivre].
    #[arg(long)]
    pub prefix: Option<String>,

    /// Working resolution in DPI [default: 200].
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Rotation in degrees, counter-clockwise positive [default: -90].
    #[arg(long, allow_negative_numbers = true)]
    pub rotation: Option<f32>,

    /// Double-page crop `x1,y1,x2,y2` at 200 DPI [default: 608,0,2288,1380].
    #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_rect)]
    pub crop_double: Option<Rect>,

    /// Left leaf crop within the double page [default: 10,10,830,1380].
    #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_rect)]
    pub crop_left: Option<Rect>,

    /// Right leaf crop within the double page [default: 850,10,1680,1380].
    #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_rect)]
    pub crop_right: Option<Rect>,

    /// Highlight threshold, 0-255 [default: 85].
    #[arg(long)]
    pub highlight_threshold: Option<u8>,

    /// Unsharp-mask radius [default: 12.0].
    #[arg(long)]
    pub filter_radius: Option<f32>,

    /// Unsharp-mask amount [default: 0.6].
    #[arg(long)]
    pub filter_amount: Option<f32>,

    /// Unsharp-mask threshold [default: 0.3].
    #[arg(long)]
    pub filter_threshold: Option<f32>,

    /// Never call ImageMagick; use the built-in filters.
    #[arg(long, default_value_t = false)]
    pub no_imagemagick: bool,

    /// 1-based positions to drop from the document, e.g. `1,3,5`.
    ///
    /// Applied only when step 6 runs together with step 5 (the default runs
    /// every step). With an explicit `--step` list that lacks 6, the list is
    /// ignored and a warning is logged.
    #[arg(long, value_name = "LIST", value_parser = parse_pages)]
    pub remove_pages: Option<PageList>,

    /// Seconds allowed per external tool call [default: 120].
    #[arg(long, value_name = "SECONDS")]
    pub tool_timeout: Option<u64>,
}

/// Parsed `--remove-pages` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageList(pub Vec<usize>);

fn parse_rect(value: &str) -> std::result::Result<Rect, String> {
    Rect::from_str(value).map_err(|err| err.to_string())
}

fn parse_pages(value: &str) -> std::result::Result<PageList, String> {
    parse_page_list(value)
        .map(PageList)
        .map_err(|err| err.to_string())
}

impl Cli {
    /// Defaults, then the config file, then flags.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if !self.steps.is_empty() {
            config.stages = self
                .steps
                .iter()
                .map(|n| Stage::try_from(*n))
                .collect::<std::result::Result<_, FolioError>>()?;
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(rotation) = self.rotation {
            config.rotation_degrees = rotation;
        }
        if let Some(rect) = self.crop_double {
            config.geometry.double_page = rect;
        }
        if let Some(rect) = self.crop_left {
            config.geometry.left = rect;
        }
        if let Some(rect) = self.crop_right {
            config.geometry.right = rect;
        }
        if let Some(threshold) = self.highlight_threshold {
            config.filter.highlight_threshold = threshold;
        }
        if let Some(radius) = self.filter_radius {
            config.filter.sharpen_radius = radius;
        }
        if let Some(amount) = self.filter_amount {
            config.filter.sharpen_amount = amount;
        }
        if let Some(threshold) = self.filter_threshold {
            config.filter.sharpen_threshold = threshold;
        }
        if self.no_imagemagick {
            config.tools.force_builtin = true;
        }
        if let Some(PageList(pages)) = &self.remove_pages {
            config.remove_pages = pages.clone();
        }
        if let Some(seconds) = self.tool_timeout {
            config.tools.timeout_secs = seconds;
        }

        config.validate()?;
        Ok(config)
    }
}
