// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage 5 — bind the pages into `{output}/{prefix}.pdf`.

use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use folio_core::types::ArtifactSet;
use folio_document::{ImageProcessor, PdfWriter, write_atomically};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

/// What assembly did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyOutcome {
    Written {
        path: PathBuf,
        pages: usize,
        /// Hex SHA-256 of the written document.
        sha256: String,
    },
    /// No pages; nothing written.
    Empty,
}

/// Write one PDF page per artifact in `pages`, sized for `dpi`.
#[instrument(skip_all, fields(pages = pages.len(), tier = %pages.tag(), path = %output.display()))]
pub fn assemble(
    pages: &ArtifactSet,
    dpi: u32,
    title: &str,
    output: &Path,
) -> Result<AssemblyOutcome> {
    if pages.is_empty() {
        warn!("No pages to assemble; no document written");
        return Ok(AssemblyOutcome::Empty);
    }

    let mut writer = PdfWriter::new(dpi);
    writer.set_title(title);

    // Decode lazily; the first unreadable page stops the stream and wins
    // over whatever the writer makes of the shortened input.
    let mut failure: Option<FolioError> = None;
    let images = pages.iter().map_while(|artifact| {
        match ImageProcessor::open(artifact.path()) {
            Ok(page) => Some(page.to_rgb().into_dynamic()),
            Err(err) => {
                failure = Some(err);
                None
            }
        }
    });
    let built = writer.create_from_images(images);
    if let Some(err) = failure {
        return Err(err);
    }
    let bytes = built?;

    write_atomically(output, &bytes)?;
    let sha256 = hex::encode(Sha256::digest(&bytes));
    info!(pages = pages.len(), bytes = bytes.len(), %sha256, "Document written");

    Ok(AssemblyOutcome::Written {
        path: output.to_path_buf(),
        pages: pages.len(),
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::types::{PageArtifact, StageTag};
    use folio_document::PdfReader;
    use image::{DynamicImage, Rgb, RgbImage};

    use crate::artifact::ArtifactStore;

    #[test]
    fn empty_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Book.pdf");
        let outcome = assemble(&ArtifactSet::empty(StageTag::Leaf), 200, "Book", &target).unwrap();
        assert_eq!(outcome, AssemblyOutcome::Empty);
        assert!(!target.exists());
    }

    #[test]
    fn pages_follow_set_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("images"), "Book").unwrap();
        store.ensure().unwrap();
        let widths = [100u32, 200, 300];
        let artifacts = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(*w, 50, Rgb([9, 9, 9])));
                store.write(i as u32 + 1, StageTag::Leaf, img).unwrap()
            })
            .collect();
        let set = ArtifactSet::new(StageTag::Leaf, artifacts);
        let target = dir.path().join("Book.pdf");

        let outcome = assemble(&set, 100, "Book", &target).unwrap();
        let AssemblyOutcome::Written { pages, sha256, .. } = outcome else {
            panic!("expected a document");
        };
        assert_eq!(pages, 3);
        assert_eq!(sha256.len(), 64);

        let reader = PdfReader::open(&target).unwrap();
        let sizes = reader.page_sizes().unwrap();
        // 100px at 100 DPI = 1 in = 72 pt.
        for ((width, _), px) in sizes.iter().zip(widths) {
            assert!((width - px as f32 * 0.72).abs() < 0.5, "{width} vs {px}px");
        }
    }

    #[test]
    fn unreadable_page_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("Book_001.png");
        std::fs::write(&bogus, b"not a png").unwrap();
        let set = ArtifactSet::new(
            StageTag::Leaf,
            vec![PageArtifact::new(1, StageTag::Leaf, bogus)],
        );
        let err = assemble(&set, 200, "Book", &dir.path().join("Book.pdf")).unwrap_err();
        assert!(matches!(err, FolioError::ImageError(_)));
    }
}
