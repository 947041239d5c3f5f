// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage 3 — highlight removal on every leaf.

use folio_core::error::Result;
use folio_core::types::{ArtifactSet, PageArtifact, Stage, StageTag};
use tracing::{info, instrument};

use super::FilterOutput;
use crate::artifact::ArtifactStore;
use crate::report::StrategyRecord;
use crate::strategy::{Fallback, HighlightStrategy};

#[instrument(skip_all, fields(leaves = leaves.len(), threshold = threshold))]
pub fn remove_highlights<S: HighlightStrategy + ?Sized>(
    leaves: &ArtifactSet,
    threshold: u8,
    strategies: &Fallback<'_, S>,
    store: &ArtifactStore,
) -> Result<FilterOutput> {
    let mut pages = Vec::with_capacity(leaves.len());
    let mut records = Vec::with_capacity(leaves.len());

    for leaf in leaves {
        let output = store.path(leaf.index, StageTag::NoHighlight);
        let used = strategies.apply(Stage::RemoveHighlights, leaf.index, |strategy| {
            strategy.remove_highlights(leaf.path(), &output, threshold)
        })?;
        info!(index = leaf.index, strategy = %used, "Highlights removed");
        records.push(StrategyRecord::new(Stage::RemoveHighlights, leaf.index, used));
        pages.push(PageArtifact::new(leaf.index, StageTag::NoHighlight, output));
    }

    Ok(FilterOutput {
        pages: ArtifactSet::new(StageTag::NoHighlight, pages),
        strategies: records,
    })
}
