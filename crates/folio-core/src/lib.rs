// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — Core types, crop geometry, configuration, and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod types;

pub use config::{FilterParameters, PipelineConfig, ToolSettings};
pub use error::{ErrorClass, FolioError, Result};
pub use geometry::{CropGeometry, REFERENCE_DPI};
pub use types::*;
