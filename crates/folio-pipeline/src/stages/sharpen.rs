// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage 4 — sharpen the best available pages (`no_highlight`, else `leaf`).

use folio_core::config::FilterParameters;
use folio_core::error::Result;
use folio_core::types::{ArtifactSet, PageArtifact, Stage, StageTag};
use tracing::{info, instrument};

use super::FilterOutput;
use crate::artifact::ArtifactStore;
use crate::report::StrategyRecord;
use crate::strategy::{Fallback, SharpenStrategy};

#[instrument(skip_all, fields(pages = input.len(), input = %input.tag()))]
pub fn sharpen<S: SharpenStrategy + ?Sized>(
    input: &ArtifactSet,
    params: &FilterParameters,
    strategies: &Fallback<'_, S>,
    store: &ArtifactStore,
) -> Result<FilterOutput> {
    let mut pages = Vec::with_capacity(input.len());
    let mut records = Vec::with_capacity(input.len());

    for page in input {
        let output = store.path(page.index, StageTag::Filtered);
        let used = strategies.apply(Stage::Sharpen, page.index, |strategy| {
            strategy.sharpen(page.path(), &output, params)
        })?;
        info!(index = page.index, strategy = %used, "Page sharpened");
        records.push(StrategyRecord::new(Stage::Sharpen, page.index, used));
        pages.push(PageArtifact::new(page.index, StageTag::Filtered, output));
    }

    Ok(FilterOutput {
        pages: ArtifactSet::new(StageTag::Filtered, pages),
        strategies: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Builtin;
    use image::{DynamicImage, GrayImage, Luma};

    #[test]
    fn filtered_pages_keep_indices_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();
        let page = GrayImage::from_fn(24, 16, |x, y| Luma([((x * 7 + y * 3) % 200) as u8 + 20]));
        let written = store
            .write(5, StageTag::NoHighlight, DynamicImage::ImageLuma8(page))
            .unwrap();
        let input = ArtifactSet::new(StageTag::NoHighlight, vec![written]);

        let params = FilterParameters {
            highpass_sigma: 4.0,
            ..FilterParameters::default()
        };
        let builtin = Builtin;
        let chain = Fallback::builtin_only(&builtin);
        let out = sharpen(&input, &params, &chain, &store).unwrap();

        assert_eq!(out.pages.tag(), StageTag::Filtered);
        assert_eq!(out.pages.indices(), vec![5]);
        assert!(out.pages.as_slice()[0].path().ends_with("Book_005_filtered.png"));
        let filtered = image::open(out.pages.as_slice()[0].path()).unwrap();
        assert_eq!((filtered.width(), filtered.height()), (24, 16));
        assert_eq!(out.strategies[0].stage, Stage::Sharpen);
    }
}
