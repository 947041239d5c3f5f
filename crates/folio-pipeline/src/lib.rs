// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-pipeline — Turns a scanned book into `{prefix}.pdf`.
//
// Six stages (rasterize, split, highlight removal, sharpening, page removal,
// assembly) exchange per-page PNG artifacts through `{output}/images/`, so a
// later run can pick up where an earlier one stopped.

pub mod artifact;
pub mod context;
pub mod pipeline;
pub mod report;
pub mod stages;
pub mod strategy;

pub use artifact::ArtifactStore;
pub use context::PipelineContext;
pub use pipeline::{ARTIFACT_DIR, Pipeline};
pub use report::{DocumentSummary, RunReport, StrategyRecord};
pub use stages::AssemblyOutcome;
pub use strategy::{Builtin, Fallback, HighlightStrategy, SharpenStrategy, StrategyKind};
