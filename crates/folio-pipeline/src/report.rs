// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run report — what a run did, returned to the caller and saved next to the
// output document as `{prefix}_run.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use folio_core::error::Result;
use folio_core::types::{Stage, StageTag};
use folio_document::write_atomically;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::stages::AssemblyOutcome;
use crate::strategy::StrategyKind;

/// Which strategy processed one page in one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub stage: Stage,
    pub index: u32,
    pub strategy: StrategyKind,
}

impl StrategyRecord {
    pub fn new(stage: Stage, index: u32, strategy: StrategyKind) -> Self {
        Self {
            stage,
            index,
            strategy,
        }
    }
}

/// The assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub path: PathBuf,
    /// Artifact tier the pages were taken from.
    pub tier: StageTag,
    pub pages: usize,
    pub sha256: String,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub prefix: String,
    /// Stages executed, in execution order.
    pub stages: Vec<Stage>,
    /// Artifacts written per tag.
    pub produced: BTreeMap<String, usize>,
    pub strategies: Vec<StrategyRecord>,
    /// Positions dropped before assembly.
    pub removed_positions: Vec<usize>,
    pub document: Option<DocumentSummary>,
}

impl RunReport {
    pub(crate) fn start(
        source: &Path,
        output_dir: &Path,
        artifact_dir: &Path,
        prefix: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            source: source.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            artifact_dir: artifact_dir.to_path_buf(),
            prefix: prefix.to_string(),
            stages: Vec::new(),
            produced: BTreeMap::new(),
            strategies: Vec::new(),
            removed_positions: Vec::new(),
            document: None,
        }
    }

    pub(crate) fn count(&mut self, tag: StageTag, written: usize) {
        *self.produced.entry(tag.as_str().to_string()).or_default() += written;
    }

    pub(crate) fn record_assembly(&mut self, tier: StageTag, outcome: &AssemblyOutcome) {
        if let AssemblyOutcome::Written {
            path,
            pages,
            sha256,
        } = outcome
        {
            self.document = Some(DocumentSummary {
                path: path.clone(),
                tier,
                pages: *pages,
                sha256: sha256.clone(),
            });
        }
    }

    /// How many pages each strategy handled.
    pub fn strategy_counts(&self) -> BTreeMap<StrategyKind, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.strategies {
            *counts.entry(record.strategy).or_default() += 1;
        }
        counts
    }

    /// `{output_dir}/{prefix}_run.json`.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_run.json", self.prefix))
    }

    /// Stamp the finish time and save the report as pretty JSON.
    pub(crate) fn finish(&mut self) -> Result<PathBuf> {
        self.finished_at = Utc::now();
        let path = self.manifest_path();
        let json = serde_json::to_vec_pretty(self)?;
        write_atomically(&path, &json)?;
        info!(path = %path.display(), run_id = %self.run_id, "Run manifest written");
        Ok(path)
    }

    /// Read a saved manifest back.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = RunReport::start(
            Path::new("book.pdf"),
            dir.path(),
            &dir.path().join("images"),
            "Book",
        );
        report.stages = vec![Stage::Rasterize, Stage::Split];
        report.count(StageTag::Leaf, 4);
        report.count(StageTag::Leaf, 2);
        report
            .strategies
            .push(StrategyRecord::new(Stage::Sharpen, 1, StrategyKind::Builtin));

        let path = report.finish().unwrap();
        assert!(path.ends_with("Book_run.json"));

        let loaded = RunReport::load(&path).unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert_eq!(loaded.stages, report.stages);
        assert_eq!(loaded.produced["leaf"], 6);
        assert!(loaded.finished_at >= loaded.started_at);
        assert_eq!(loaded.strategy_counts()[&StrategyKind::Builtin], 1);
    }

    #[test]
    fn only_written_documents_are_recorded() {
        let mut report = RunReport::start(Path::new("a"), Path::new("b"), Path::new("c"), "P");
        report.record_assembly(StageTag::Leaf, &AssemblyOutcome::Empty);
        assert!(report.document.is_none());

        report.record_assembly(
            StageTag::Filtered,
            &AssemblyOutcome::Written {
                path: PathBuf::from("b/P.pdf"),
                pages: 3,
                sha256: "ab".repeat(32),
            },
        );
        let doc = report.document.unwrap();
        assert_eq!(doc.tier, StageTag::Filtered);
        assert_eq!(doc.pages, 3);
    }
}
