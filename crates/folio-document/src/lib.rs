// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — Image and document plumbing for the Folio book formatter.
//
// Provides source rasterization (pdftoppm or a plain image file), raster
// transforms (rotate, crop), the built-in highlight and high-pass filters,
// supervised ImageMagick calls, and PDF reading and writing.

pub mod image;
pub mod pdf;
pub mod raster;
pub mod scan;
pub mod tools;

// Re-export the primary structs so callers can use `folio_document::PdfWriter` etc.
pub use crate::image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::{PdfWriter, write_atomically};
pub use raster::{ImageFileRasterizer, PdftoppmRasterizer, Rasterizer, SourceKind, rasterizer_for};
pub use scan::{high_pass, remove_highlights};
pub use tools::ImageMagick;
