// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact store — naming, writing, and rediscovering the per-page images
// kept in `{output}/images/`.

use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use folio_core::types::{ArtifactSet, PageArtifact, StageTag, artifact_file_name};
use folio_document::ImageProcessor;
use image::DynamicImage;
use regex::Regex;
use tracing::{debug, instrument};

/// Directory holding every artifact of one prefix.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    prefix: String,
    /// `{prefix}_{digits}{suffix?}.png`; group 1 is the index, group 2 the suffix.
    name_pattern: Regex,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Result<Self> {
        let expr = format!(
            r"^{}_(\d{{3,}})(_double_crop|_double|_no_highlight|_filtered)?\.png$",
            regex::escape(prefix)
        );
        let name_pattern = Regex::new(&expr)
            .map_err(|err| FolioError::InvalidConfig(format!("prefix {prefix:?}: {err}")))?;
        Ok(Self {
            dir: dir.into(),
            prefix: prefix.to_string(),
            name_pattern,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Create the directory if needed.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn path(&self, index: u32, tag: StageTag) -> PathBuf {
        self.dir.join(artifact_file_name(&self.prefix, index, tag))
    }

    /// Save `image` as the `tag` artifact for `index`.
    pub fn write(&self, index: u32, tag: StageTag, image: DynamicImage) -> Result<PageArtifact> {
        let path = self.path(index, tag);
        ImageProcessor::from_dynamic(image).save(&path)?;
        debug!(index, %tag, path = %path.display(), "Artifact written");
        Ok(PageArtifact::new(index, tag, path))
    }

    /// Every file on disk carrying exactly `tag`, sorted by index.
    ///
    /// A missing directory is an empty set, not an error.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn discover(&self, tag: StageTag) -> Result<ArtifactSet> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ArtifactSet::empty(tag));
            }
            Err(err) => return Err(err.into()),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(caps) = self.name_pattern.captures(name) else {
                continue;
            };
            let suffix = caps.get(2).map_or("", |m| m.as_str());
            if StageTag::from_suffix(suffix) != Some(tag) {
                continue;
            }
            // Indices are 1-based; `000` is never written by a stage.
            match caps[1].parse::<u32>() {
                Ok(0) | Err(_) => debug!(name, "Index out of range; skipping"),
                Ok(index) => found.push(PageArtifact::new(index, tag, entry.path())),
            }
        }

        let set = ArtifactSet::new(tag, found);
        debug!(%tag, count = set.len(), "Discovered artifacts");
        Ok(set)
    }

    /// The first tag in `preference` with anything on disk.
    pub fn discover_first(&self, preference: &[StageTag]) -> Result<Option<ArtifactSet>> {
        for &tag in preference {
            let set = self.discover(tag)?;
            if !set.is_empty() {
                return Ok(Some(set));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn suffixes_are_matched_exactly() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "Book_001.png",
            "Book_002.png",
            "Book_001_double.png",
            "Book_001_double_crop.png",
            "Book_001_no_highlight.png",
            "Book_001_filtered.png",
            "Book_01.png",
            "Book_001.jpg",
            "Other_001.png",
        ] {
            touch(dir.path(), name);
        }
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();

        assert_eq!(store.discover(StageTag::Leaf).unwrap().indices(), vec![1, 2]);
        assert_eq!(store.discover(StageTag::Double).unwrap().len(), 1);
        assert_eq!(store.discover(StageTag::DoubleCrop).unwrap().len(), 1);
        assert_eq!(store.discover(StageTag::Filtered).unwrap().len(), 1);
    }

    #[test]
    fn indices_sort_numerically_past_three_digits() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["B_1000.png", "B_999.png", "B_010.png", "B_000.png"] {
            touch(dir.path(), name);
        }
        let store = ArtifactStore::new(dir.path(), "B").unwrap();
        assert_eq!(store.discover(StageTag::Leaf).unwrap().indices(), vec![10, 999, 1000]);
    }

    #[test]
    fn prefix_is_literal_not_a_pattern() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.b_001.png");
        touch(dir.path(), "axb_001.png");
        let store = ArtifactStore::new(dir.path(), "a.b").unwrap();
        let leaves = store.discover(StageTag::Leaf).unwrap();
        assert_eq!(leaves.len(), 1);
        assert!(leaves.as_slice()[0].path().ends_with("a.b_001.png"));
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("images"), "Book").unwrap();
        assert!(store.discover(StageTag::Leaf).unwrap().is_empty());
        assert!(store.discover_first(&StageTag::TIERS).unwrap().is_none());
    }

    #[test]
    fn first_preference_with_files_wins() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Book_001.png");
        touch(dir.path(), "Book_001_no_highlight.png");
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();
        let best = store.discover_first(&StageTag::TIERS).unwrap().unwrap();
        assert_eq!(best.tag(), StageTag::NoHighlight);
    }
}
