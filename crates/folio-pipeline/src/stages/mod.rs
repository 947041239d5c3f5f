// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline stages. Each one reads an artifact set and writes the next.

pub mod assemble;
pub mod highlight;
pub mod rasterize;
pub mod select;
pub mod sharpen;
pub mod split;

pub use assemble::{AssemblyOutcome, assemble};
pub use highlight::remove_highlights;
pub use rasterize::rasterize;
pub use select::remove_positions;
pub use sharpen::sharpen;
pub use split::{SplitOutput, leaf_indices, split};

use folio_core::types::ArtifactSet;

use crate::report::StrategyRecord;

/// Output of a filtering stage, with the strategy used for each page.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    pub pages: ArtifactSet,
    pub strategies: Vec<StrategyRecord>,
}
