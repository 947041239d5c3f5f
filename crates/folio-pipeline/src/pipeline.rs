// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage orchestrator — checks preconditions, then runs the selected stages in
// canonical order, handing artifact sets from one stage to the next.

use std::path::Path;

use folio_core::config::PipelineConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::{ArtifactSet, Stage, StageTag};
use folio_document::{Rasterizer, rasterizer_for};
use tracing::{debug, info, instrument, warn};

use crate::artifact::ArtifactStore;
use crate::context::PipelineContext;
use crate::report::RunReport;
use crate::stages;
use crate::strategy::{Builtin, Fallback, HighlightStrategy, SharpenStrategy, probe_imagemagick};

/// Name of the artifact directory inside the output directory.
pub const ARTIFACT_DIR: &str = "images";

/// One configured pipeline, ready to run against a source document.
///
/// ```ignore
/// let report = Pipeline::new(&config).run("book.pdf".as_ref(), "out".as_ref())?;
/// ```
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    rasterizer: Option<Box<dyn Rasterizer + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            rasterizer: None,
        }
    }

    /// Use `rasterizer` for stage 1 instead of choosing one from the source
    /// file's extension.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer + 'a>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Run every selected stage. Artifacts go to `{output_dir}/images/`, the
    /// document to `{output_dir}/{prefix}.pdf`, the manifest beside it.
    #[instrument(skip(self), fields(prefix = %self.config.prefix))]
    pub fn run(&self, source: &Path, output_dir: &Path) -> Result<RunReport> {
        let config = self.config;

        // -- Preconditions ----------------------------------------------------
        if !source.exists() {
            return Err(FolioError::SourceNotFound(source.to_path_buf()));
        }
        config.validate()?;

        let plan = config.planned_stages();
        let chosen_rasterizer;
        let wants_raster = config.runs(Stage::Rasterize);
        let rasterizer: Option<&dyn Rasterizer> = match (&self.rasterizer, wants_raster) {
            (_, false) => None,
            (Some(given), true) => Some(given.as_ref()),
            (None, true) => {
                chosen_rasterizer = rasterizer_for(source, &config.tools)?;
                Some(chosen_rasterizer.as_ref())
            }
        };

        if config.runs(Stage::RemovePages) && !config.runs(Stage::Assemble) {
            warn!("Page removal only applies to an assembled document; stage 5 is not selected");
        }
        if !config.remove_pages.is_empty() && !config.runs(Stage::RemovePages) {
            warn!(
                positions = ?config.remove_pages,
                "Pages to remove were given but stage 6 is not selected; keeping every page"
            );
        }

        let store = ArtifactStore::new(output_dir.join(ARTIFACT_DIR), &config.prefix)?;
        store.ensure()?;

        let magick = if config.runs(Stage::RemoveHighlights) || config.runs(Stage::Sharpen) {
            probe_imagemagick(&config.tools)
        } else {
            None
        };

        let geometry = config.resolved_geometry();
        debug!(?geometry, dpi = config.resolution, "Crop geometry resolved");
        if geometry.left.overlaps(&geometry.right) {
            warn!(
                left = %geometry.left,
                right = %geometry.right,
                "Leaf rectangles overlap; adjacent leaves will share content"
            );
        }

        info!(
            source = %source.display(),
            output = %output_dir.display(),
            stages = ?plan.iter().map(|s| s.number()).collect::<Vec<_>>(),
            "Starting run"
        );

        // -- Stages -----------------------------------------------------------
        let mut report = RunReport::start(source, output_dir, store.dir(), &config.prefix);
        let mut ctx = PipelineContext::new();
        let mut selected: Option<ArtifactSet> = None;

        for stage in plan {
            info!(%stage, "Stage started");
            match stage {
                Stage::Rasterize => {
                    // Only `None` when stage 1 is not selected.
                    let Some(rasterizer) = rasterizer else { continue };
                    let doubles = stages::rasterize(source, config, rasterizer, &store)?;
                    report.count(StageTag::Double, doubles.len());
                    ctx.record(doubles);
                }
                Stage::Split => {
                    let doubles = ctx.resolve(stage, &[StageTag::Double], &store)?;
                    let out = stages::split(&doubles, &geometry, &store)?;
                    report.count(StageTag::DoubleCrop, out.double_crops.len());
                    report.count(StageTag::Leaf, out.leaves.len());
                    ctx.record(out.double_crops);
                    ctx.record(out.leaves);
                }
                Stage::RemoveHighlights => {
                    let leaves = ctx.resolve(stage, &[StageTag::Leaf], &store)?;
                    let primary = magick.as_ref().map(|m| m as &dyn HighlightStrategy);
                    let chain = Fallback::new(primary, &Builtin);
                    let threshold = config.filter.highlight_threshold;
                    let out = stages::remove_highlights(&leaves, threshold, &chain, &store)?;
                    report.count(StageTag::NoHighlight, out.pages.len());
                    report.strategies.extend(out.strategies);
                    ctx.record(out.pages);
                }
                Stage::Sharpen => {
                    let input = ctx.resolve(stage, &StageTag::SHARPEN_INPUTS, &store)?;
                    let primary = magick.as_ref().map(|m| m as &dyn SharpenStrategy);
                    let chain = Fallback::new(primary, &Builtin);
                    let out = stages::sharpen(&input, &config.filter, &chain, &store)?;
                    report.count(StageTag::Filtered, out.pages.len());
                    report.strategies.extend(out.strategies);
                    ctx.record(out.pages);
                }
                Stage::RemovePages => {
                    if !config.runs(Stage::Assemble) {
                        continue;
                    }
                    let pages = assembly_input(stage, &ctx, &store)?;
                    let kept = stages::remove_positions(&pages, &config.remove_pages);
                    report.removed_positions = config.remove_pages.clone();
                    selected = Some(kept);
                }
                Stage::Assemble => {
                    let pages = match selected.take() {
                        Some(pages) => pages,
                        None => assembly_input(stage, &ctx, &store)?,
                    };
                    let target = output_dir.join(format!("{}.pdf", config.prefix));
                    let outcome =
                        stages::assemble(&pages, config.resolution, &config.prefix, &target)?;
                    report.record_assembly(pages.tag(), &outcome);
                }
            }
            report.stages.push(stage);
            info!(%stage, "Stage finished");
        }

        report.finish()?;
        log_summary(&report);
        Ok(report)
    }
}

/// Pages for assembly: the single best tier, never mixed per index.
fn assembly_input(
    stage: Stage,
    ctx: &PipelineContext,
    store: &ArtifactStore,
) -> Result<ArtifactSet> {
    let pages = ctx.resolve(stage, &StageTag::TIERS, store)?;
    if pages.tag() != StageTag::Leaf {
        let leaves = match ctx.get(StageTag::Leaf) {
            Some(leaves) => leaves.clone(),
            None => store.discover(StageTag::Leaf)?,
        };
        if !leaves.is_empty() && leaves.indices() != pages.indices() {
            warn!(
                tier = %pages.tag(),
                tier_pages = pages.len(),
                leaves = leaves.len(),
                "Chosen tier does not cover the same pages as the leaves"
            );
        }
    }
    info!(tier = %pages.tag(), pages = pages.len(), "Assembly input selected");
    Ok(pages)
}

fn log_summary(report: &RunReport) {
    for (strategy, pages) in report.strategy_counts() {
        info!(%strategy, pages, "Filter strategy usage");
    }
    match &report.document {
        Some(doc) => info!(
            document = %doc.path.display(),
            pages = doc.pages,
            tier = %doc.tier,
            artifacts = %report.artifact_dir.display(),
            "Run complete"
        ),
        None => info!(
            artifacts = %report.artifact_dir.display(),
            "Run complete; no document written"
        ),
    }
}
