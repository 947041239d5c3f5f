// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — page counts and page sizes of existing PDF documents, using
// the `lopdf` crate.

use std::path::Path;

use folio_core::error::FolioError;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, instrument};

/// Page-tree levels walked when looking for an inherited MediaBox.
const MAX_TREE_DEPTH: usize = 32;

/// Read-only view of a PDF file.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FolioError> {
        let path_ref = path.as_ref();
        let document = Document::load(path_ref).map_err(|err| {
            FolioError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// `(width, height)` of every page's MediaBox in points, in page order.
    ///
    /// A page without its own MediaBox inherits the nearest one up the page
    /// tree.
    pub fn page_sizes(&self) -> Result<Vec<(f32, f32)>, FolioError> {
        // get_pages() is keyed by 1-based page number, already in order.
        self.document
            .get_pages()
            .into_iter()
            .map(|(page_number, page_id)| {
                let media_box = self.media_box(page_id).ok_or_else(|| {
                    FolioError::PdfError(format!("page {page_number} has no MediaBox"))
                })?;

                let coords = media_box
                    .iter()
                    .map(Object::as_float)
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|err| {
                        FolioError::PdfError(format!("page {page_number} MediaBox: {err}"))
                    })?;

                match coords.as_slice() {
                    &[x1, y1, x2, y2] => Ok(((x2 - x1).abs(), (y2 - y1).abs())),
                    _ => Err(FolioError::PdfError(format!(
                        "page {page_number} MediaBox has {} entries",
                        coords.len()
                    ))),
                }
            })
            .collect()
    }

    fn media_box(&self, page_id: ObjectId) -> Option<&Vec<Object>> {
        let mut node = self.document.get_dictionary(page_id).ok()?;
        // Page trees are shallow; the bound only guards against cycles.
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(media_box) = node.get(b"MediaBox").and_then(|obj| self.resolve_array(obj)) {
                return Some(media_box);
            }
            let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve_array<'a>(&'a self, obj: &'a Object) -> lopdf::Result<&'a Vec<Object>> {
        match obj {
            Object::Reference(id) => self.document.get_object(*id)?.as_array(),
            other => other.as_array(),
        }
    }
}
