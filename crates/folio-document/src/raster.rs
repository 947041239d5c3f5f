// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source rasterization — turns a source document into one image per sheet.
//
// PDFs go through Poppler's `pdftoppm` into a scratch directory that is
// removed once every sheet has been handed over. A source that is already a
// raster image is a one-sheet document.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use folio_core::config::ToolSettings;
use folio_core::error::{FolioError, Result};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::pdf::reader::PdfReader;
use crate::tools::command::run_with_timeout;

/// Receives each sheet as `(sheet_number, image)`, numbered from 1.
pub type SheetSink<'a> = dyn FnMut(u32, DynamicImage) -> Result<()> + 'a;

/// Turns a source document into raster sheets, in document order.
pub trait Rasterizer {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Render every sheet of `source` at `dpi`, passing each to `sink` in
    /// order. Returns the number of sheets delivered.
    fn rasterize(&self, source: &Path, dpi: u32, sink: &mut SheetSink<'_>) -> Result<u32>;
}

/// Source document formats Folio accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Png,
    Jpeg,
    Tiff,
}

impl SourceKind {
    /// Infer the source kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Pick the rasterizer for `source` from its extension.
pub fn rasterizer_for(source: &Path, tools: &ToolSettings) -> Result<Box<dyn Rasterizer>> {
    match SourceKind::from_path(source) {
        Some(SourceKind::Pdf) => Ok(Box::new(PdftoppmRasterizer::from_settings(tools))),
        Some(SourceKind::Png | SourceKind::Jpeg | SourceKind::Tiff) => {
            Ok(Box::new(ImageFileRasterizer))
        }
        None => Err(FolioError::UnsupportedSource(format!(
            "{} (expected .pdf, .png, .jpg or .tif)",
            source.display()
        ))),
    }
}

// -- pdftoppm -----------------------------------------------------------------

/// Rasterizes PDFs with Poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: String,
    /// Time allowed per source page.
    timeout_per_page: Duration,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<String>, timeout_per_page: Duration) -> Self {
        Self {
            program: program.into(),
            timeout_per_page,
        }
    }

    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self::new(
            settings.pdftoppm.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Limit for the whole pdftoppm call: the per-page limit times the page
    /// count (one page when unknown), saturating at [`Duration::MAX`].
    fn total_timeout(&self, pages: Option<usize>) -> Duration {
        let pages = u32::try_from(pages.unwrap_or(1).max(1)).unwrap_or(u32::MAX);
        self.timeout_per_page
            .checked_mul(pages)
            .unwrap_or(Duration::MAX)
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    #[instrument(skip_all, fields(source = %source.display(), dpi = dpi))]
    fn rasterize(&self, source: &Path, dpi: u32, sink: &mut SheetSink<'_>) -> Result<u32> {
        let expected_pages = match PdfReader::open(source) {
            Ok(reader) => Some(reader.page_count()),
            Err(err) => {
                warn!(error = %err, "Could not count source pages; continuing with pdftoppm");
                None
            }
        };

        let scratch = tempfile::Builder::new().prefix("folio-raster-").tempdir()?;
        let timeout = self.total_timeout(expected_pages);

        let mut command = Command::new(&self.program);
        command
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(source)
            .arg(scratch.path().join("page"));
        info!(?expected_pages, "Rasterizing with pdftoppm");
        run_with_timeout(command, &self.program, timeout).map_err(|err| match err {
            FolioError::ToolUnavailable(tool) => {
                FolioError::Rasterize(format!("{tool} is not installed"))
            }
            other => FolioError::Rasterize(other.to_string()),
        })?;

        let rasters = numbered_rasters(scratch.path())?;
        if rasters.is_empty() {
            return Err(FolioError::Rasterize(format!(
                "pdftoppm produced no images for {}",
                source.display()
            )));
        }
        if let Some(expected) = expected_pages {
            if expected != rasters.len() {
                warn!(
                    expected,
                    produced = rasters.len(),
                    "Sheet count differs from the PDF page count"
                );
            }
        }

        let mut delivered = 0u32;
        for path in rasters {
            let image = image::open(&path).map_err(|err| {
                FolioError::Rasterize(format!("unreadable raster {}: {}", path.display(), err))
            })?;
            delivered += 1;
            sink(delivered, image)?;
        }

        // `scratch` drops here and takes the raw rasters with it.
        Ok(delivered)
    }
}

/// PNGs written by pdftoppm (`page-1.png`, `page-01.png`, ...) in page order.
///
/// pdftoppm pads page numbers to the width of the largest one, so lexical
/// order already matches, but sorting numerically doesn't depend on that.
fn numbered_rasters(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let number = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|_| path.extension().is_some_and(|ext| ext == "png"))
            .and_then(|stem| stem.rsplit('-').next())
            .and_then(|digits| digits.parse::<u32>().ok());
        match number {
            Some(n) => numbered.push((n, path)),
            None => debug!(path = %path.display(), "Ignoring unexpected scratch file"),
        }
    }
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

// -- Image files --------------------------------------------------------------

/// Treats a PNG/JPEG/TIFF source as a single sheet. The DPI is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileRasterizer;

impl Rasterizer for ImageFileRasterizer {
    fn name(&self) -> &str {
        "image-file"
    }

    #[instrument(skip_all, fields(source = %source.display()))]
    fn rasterize(&self, source: &Path, _dpi: u32, sink: &mut SheetSink<'_>) -> Result<u32> {
        let image = image::open(source).map_err(|err| {
            FolioError::Rasterize(format!("failed to decode {}: {}", source.display(), err))
        })?;
        sink(1, image)?;
        Ok(1)
    }
}
