// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-run hand-off between stages, with the artifact directory as the
// fallback source when a stage's input was produced by an earlier run.

use std::collections::HashMap;

use folio_core::error::{FolioError, Result};
use folio_core::types::{ArtifactSet, Stage, StageTag, artifact_pattern};
use tracing::info;

use crate::artifact::ArtifactStore;

/// Artifact sets produced so far in this run, by tag.
#[derive(Debug, Default)]
pub struct PipelineContext {
    produced: HashMap<StageTag, ArtifactSet>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage's output, replacing any earlier set with the same tag.
    pub fn record(&mut self, set: ArtifactSet) {
        self.produced.insert(set.tag(), set);
    }

    /// The set produced in this run for `tag`, if it has anything in it.
    pub fn get(&self, tag: StageTag) -> Option<&ArtifactSet> {
        self.produced.get(&tag).filter(|set| !set.is_empty())
    }

    /// Input for `stage`: the first tag in `preference` produced in this run,
    /// otherwise the first one found on disk.
    pub fn resolve(
        &self,
        stage: Stage,
        preference: &[StageTag],
        store: &ArtifactStore,
    ) -> Result<ArtifactSet> {
        if let Some(set) = preference.iter().find_map(|tag| self.get(*tag)) {
            return Ok(set.clone());
        }
        if let Some(set) = store.discover_first(preference)? {
            info!(
                stage = stage.number(),
                tag = %set.tag(),
                count = set.len(),
                "Resuming from artifacts on disk"
            );
            return Ok(set);
        }
        let pattern = preference
            .iter()
            .map(|tag| artifact_pattern(store.prefix(), *tag))
            .collect::<Vec<_>>()
            .join(" or ");
        Err(FolioError::MissingArtifacts { stage, pattern })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::types::PageArtifact;

    fn set(tag: StageTag, indices: &[u32]) -> ArtifactSet {
        ArtifactSet::new(
            tag,
            indices
                .iter()
                .map(|i| PageArtifact::new(*i, tag, format!("/nowhere/{i}.png")))
                .collect(),
        )
    }

    #[test]
    fn in_run_output_beats_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Book_001_filtered.png"), b"").unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();

        let mut ctx = PipelineContext::new();
        ctx.record(set(StageTag::Leaf, &[1, 2]));

        let chosen = ctx.resolve(Stage::Assemble, &StageTag::TIERS, &store).unwrap();
        assert_eq!(chosen.tag(), StageTag::Leaf);
        assert_eq!(chosen.indices(), vec![1, 2]);
    }

    #[test]
    fn falls_back_to_disk_then_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();
        let ctx = PipelineContext::new();

        let err = ctx.resolve(Stage::Split, &[StageTag::Double], &store).unwrap_err();
        match err {
            FolioError::MissingArtifacts { stage, pattern } => {
                assert_eq!(stage, Stage::Split);
                assert_eq!(pattern, "Book_NNN_double.png");
            }
            other => panic!("unexpected error: {other}"),
        }

        std::fs::write(dir.path().join("Book_003_double.png"), b"").unwrap();
        let found = ctx.resolve(Stage::Split, &[StageTag::Double], &store).unwrap();
        assert_eq!(found.indices(), vec![3]);
    }

    #[test]
    fn empty_in_run_sets_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Book_001.png"), b"").unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();

        let mut ctx = PipelineContext::new();
        ctx.record(ArtifactSet::empty(StageTag::NoHighlight));
        let chosen = ctx
            .resolve(Stage::Sharpen, &StageTag::SHARPEN_INPUTS, &store)
            .unwrap();
        assert_eq!(chosen.tag(), StageTag::Leaf);
    }
}
