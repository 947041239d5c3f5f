// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage 1 — rasterize every sheet, rotate it, and keep it as a `double`
// artifact numbered from 1 in document order.

use std::path::Path;

use folio_core::config::PipelineConfig;
use folio_core::error::Result;
use folio_core::types::{ArtifactSet, StageTag};
use folio_document::{ImageProcessor, Rasterizer};
use tracing::{info, instrument};

use crate::artifact::ArtifactStore;

#[instrument(skip_all, fields(source = %source.display(), rasterizer = rasterizer.name()))]
pub fn rasterize(
    source: &Path,
    config: &PipelineConfig,
    rasterizer: &dyn Rasterizer,
    store: &ArtifactStore,
) -> Result<ArtifactSet> {
    let mut doubles = Vec::new();
    let sheets = rasterizer.rasterize(source, config.resolution, &mut |sheet, image| {
        let rotated = ImageProcessor::from_dynamic(image).rotate(config.rotation_degrees);
        info!(
            sheet,
            width = rotated.width(),
            height = rotated.height(),
            "Sheet rasterized"
        );
        doubles.push(store.write(sheet, StageTag::Double, rotated.into_dynamic())?);
        Ok(())
    })?;

    info!(sheets, dpi = config.resolution, "Rasterization complete");
    Ok(ArtifactSet::new(StageTag::Double, doubles))
}
