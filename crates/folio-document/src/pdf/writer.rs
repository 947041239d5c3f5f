// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — one page per raster image, each page sized to its image at
// the scan resolution, using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::io::Write;
use std::path::Path;

use folio_core::error::FolioError;
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

/// Builds multi-page image PDFs.
pub struct PdfWriter {
    /// Resolution the page images were scanned at; fixes the physical page size.
    dpi: f32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi: dpi.max(1) as f32,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Physical page size for an image of `width_px` x `height_px`.
    fn page_dimensions(&self, width_px: u32, height_px: u32) -> (Mm, Mm) {
        let to_mm = |px: u32| Mm(px as f32 / self.dpi * 25.4);
        (to_mm(width_px), to_mm(height_px))
    }

    /// Create a PDF with one full-bleed page per image, in iteration order.
    #[instrument(skip_all)]
    pub fn create_from_images(
        &self,
        images: impl IntoIterator<Item = DynamicImage>,
    ) -> Result<Vec<u8>, FolioError> {
        let title = self.title.as_deref().unwrap_or("Folio Document");
        let mut doc = PdfDocument::new(title);
        let mut pages: Vec<PdfPage> = Vec::new();

        for image in images {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let (page_w, page_h) = self.page_dimensions(width, height);
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];
            pages.push(PdfPage::new(page_w, page_h, ops));
            debug!(page = pages.len(), width, height, "Page added");
        }

        if pages.is_empty() {
            return Err(FolioError::PdfError("no pages to write".into()));
        }

        let page_count = pages.len();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        info!(pages = page_count, bytes = output.len(), title, "PDF built");
        Ok(output)
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), FolioError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".folio-")
        .suffix(".partial")
        .tempfile_in(parent)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| FolioError::Io(err.error))?;
    Ok(())
}
