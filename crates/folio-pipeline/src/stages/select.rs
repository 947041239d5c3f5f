// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage 6 — drop pages by their 1-based position in the assembly order.

use std::collections::BTreeSet;

use folio_core::types::ArtifactSet;
use tracing::{debug, info};

/// `pages` without the given 1-based positions, order preserved.
///
/// Positions count from the first page of the sorted set, not artifact
/// indices. Positions outside `1..=pages.len()` are ignored.
pub fn remove_positions(pages: &ArtifactSet, positions: &[usize]) -> ArtifactSet {
    let drop: BTreeSet<usize> = positions.iter().copied().collect();
    for out_of_range in drop.iter().filter(|p| **p == 0 || **p > pages.len()) {
        debug!(
            position = out_of_range,
            pages = pages.len(),
            "Ignoring position outside the document"
        );
    }

    let kept: Vec<_> = pages
        .iter()
        .enumerate()
        .filter(|(i, _)| !drop.contains(&(i + 1)))
        .map(|(_, artifact)| artifact.clone())
        .collect();

    info!(before = pages.len(), after = kept.len(), "Pages removed");
    ArtifactSet::new(pages.tag(), kept)
}
