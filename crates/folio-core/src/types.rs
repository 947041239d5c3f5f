// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: crop rectangles, pipeline stages, artifact tags, and
// ordered artifact sets.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

// -- Rectangles ---------------------------------------------------------------

/// An axis-aligned crop rectangle `(x1, y1, x2, y2)` in pixels.
///
/// `x2`/`y2` are exclusive, so the width is `x2 - x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Rect {
    pub const fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// True when the rectangle encloses at least one pixel.
    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Whether two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }

    /// Multiply every coordinate by `ratio`, truncating toward zero.
    pub fn scale(&self, ratio: f64) -> Self {
        let scale = |v: u32| (v as f64 * ratio) as u32;
        Self {
            x1: scale(self.x1),
            y1: scale(self.y1),
            x2: scale(self.x2),
            y2: scale(self.y2),
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

impl FromStr for Rect {
    type Err = FolioError;

    /// Parse `"x1,y1,x2,y2"`. Whitespace around each number is allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| FolioError::InvalidCrop(s.to_string()))?;

        let &[x1, y1, x2, y2] = values.as_slice() else {
            return Err(FolioError::InvalidCrop(s.to_string()));
        };

        let rect = Rect::new(x1, y1, x2, y2);
        if !rect.is_valid() {
            return Err(FolioError::InvalidCrop(s.to_string()));
        }
        Ok(rect)
    }
}

// -- Stages -------------------------------------------------------------------

/// The six selectable pipeline stages, numbered as on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stage {
    Rasterize,
    Split,
    RemoveHighlights,
    Sharpen,
    Assemble,
    RemovePages,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Rasterize,
        Stage::Split,
        Stage::RemoveHighlights,
        Stage::Sharpen,
        Stage::Assemble,
        Stage::RemovePages,
    ];

    /// Execution order. Page removal runs right before assembly.
    pub const CANONICAL_ORDER: [Stage; 6] = [
        Stage::Rasterize,
        Stage::Split,
        Stage::RemoveHighlights,
        Stage::Sharpen,
        Stage::RemovePages,
        Stage::Assemble,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::Rasterize => 1,
            Self::Split => 2,
            Self::RemoveHighlights => 3,
            Self::Sharpen => 4,
            Self::Assemble => 5,
            Self::RemovePages => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rasterize => "rasterize",
            Self::Split => "split",
            Self::RemoveHighlights => "remove-highlights",
            Self::Sharpen => "sharpen",
            Self::Assemble => "assemble",
            Self::RemovePages => "remove-pages",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

impl TryFrom<u8> for Stage {
    type Error = FolioError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.number() == value)
            .ok_or_else(|| {
                FolioError::InvalidConfig(format!("unknown stage {value}, expected 1-6"))
            })
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage.number()
    }
}

// -- Artifact tags ------------------------------------------------------------

/// Which pipeline phase produced an image, encoded as a file-name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTag {
    Double,
    DoubleCrop,
    Leaf,
    NoHighlight,
    Filtered,
}

impl StageTag {
    /// Assembly preference order, best first.
    pub const TIERS: [StageTag; 3] = [StageTag::Filtered, StageTag::NoHighlight, StageTag::Leaf];

    /// Sharpening input preference order, best first.
    pub const SHARPEN_INPUTS: [StageTag; 2] = [StageTag::NoHighlight, StageTag::Leaf];

    /// File-name suffix placed between the index and `.png`.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Double => "_double",
            Self::DoubleCrop => "_double_crop",
            Self::Leaf => "",
            Self::NoHighlight => "_no_highlight",
            Self::Filtered => "_filtered",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::DoubleCrop => "double_crop",
            Self::Leaf => "leaf",
            Self::NoHighlight => "no_highlight",
            Self::Filtered => "filtered",
        }
    }

    /// Inverse of [`StageTag::suffix`].
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        [
            Self::Double,
            Self::DoubleCrop,
            Self::Leaf,
            Self::NoHighlight,
            Self::Filtered,
        ]
        .into_iter()
        .find(|tag| tag.suffix() == suffix)
    }
}

impl fmt::Display for StageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{prefix}_{NNN}{suffix}.png`, index zero-padded to three digits.
pub fn artifact_file_name(prefix: &str, index: u32, tag: StageTag) -> String {
    format!("{prefix}_{index:03}{}.png", tag.suffix())
}

/// Human-readable pattern for a tag, used in diagnostics.
pub fn artifact_pattern(prefix: &str, tag: StageTag) -> String {
    format!("{prefix}_NNN{}.png", tag.suffix())
}

// -- Artifacts ----------------------------------------------------------------

/// An image written by one stage. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArtifact {
    pub index: u32,
    pub tag: StageTag,
    pub path: PathBuf,
}

impl PageArtifact {
    pub fn new(index: u32, tag: StageTag, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            tag,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Artifacts sharing one tag, always ordered by ascending index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    tag: StageTag,
    artifacts: Vec<PageArtifact>,
}

impl ArtifactSet {
    /// Build a set, sorting by index regardless of the input order.
    pub fn new(tag: StageTag, mut artifacts: Vec<PageArtifact>) -> Self {
        artifacts.sort_by_key(|artifact| artifact.index);
        Self { tag, artifacts }
    }

    pub fn empty(tag: StageTag) -> Self {
        Self {
            tag,
            artifacts: Vec::new(),
        }
    }

    pub fn tag(&self) -> StageTag {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageArtifact> {
        self.artifacts.iter()
    }

    pub fn as_slice(&self) -> &[PageArtifact] {
        &self.artifacts
    }

    pub fn indices(&self) -> Vec<u32> {
        self.artifacts.iter().map(|a| a.index).collect()
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a PageArtifact;
    type IntoIter = std::slice::Iter<'a, PageArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

// -- Page lists ---------------------------------------------------------------

/// Parse a comma-separated list of 1-based page positions, e.g. `"1,3,5"`.
///
/// Empty input yields an empty list. Zero and non-numeric entries are errors;
/// positions past the end of the document are accepted here and ignored later.
pub fn parse_page_list(input: &str) -> Result<Vec<usize>, FolioError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    input
        .split(',')
        .map(|part| match part.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(FolioError::InvalidPageList(input.to_string())),
            Ok(position) => Ok(position),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_parses_with_whitespace() {
        let rect: Rect = " 608, 0,2288 ,1380".parse().unwrap();
        assert_eq!(rect, Rect::new(608, 0, 2288, 1380));
        assert_eq!(rect.width(), 1680);
        assert_eq!(rect.height(), 1380);
    }

    #[test]
    fn rect_rejects_malformed_tuples() {
        for bad in ["1,2,3", "1,2,3,4,5", "a,b,c,d", "10,10,5,20", "-1,0,4,4", ""] {
            assert!(
                matches!(bad.parse::<Rect>(), Err(FolioError::InvalidCrop(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rect_overlap() {
        let left = Rect::new(10, 10, 830, 1380);
        let right = Rect::new(850, 10, 1680, 1380);
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&Rect::new(800, 0, 900, 20)));
    }

    #[test]
    fn stage_numbers_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::try_from(stage.number()).unwrap(), stage);
        }
        assert!(Stage::try_from(7).is_err());
    }

    #[test]
    fn removal_runs_before_assembly() {
        let order = Stage::CANONICAL_ORDER;
        let remove = order.iter().position(|s| *s == Stage::RemovePages).unwrap();
        let assemble = order.iter().position(|s| *s == Stage::Assemble).unwrap();
        assert!(remove < assemble);
    }

    #[test]
    fn file_names_follow_convention() {
        assert_eq!(artifact_file_name("Book", 7, StageTag::Double), "Book_007_double.png");
        assert_eq!(artifact_file_name("Book", 7, StageTag::DoubleCrop), "Book_007_double_crop.png");
        assert_eq!(artifact_file_name("Book", 12, StageTag::Leaf), "Book_012.png");
        assert_eq!(
            artifact_file_name("Book", 3, StageTag::NoHighlight),
            "Book_003_no_highlight.png"
        );
        assert_eq!(artifact_file_name("Book", 1000, StageTag::Filtered), "Book_1000_filtered.png");
    }

    #[test]
    fn suffix_round_trip() {
        for tag in [
            StageTag::Double,
            StageTag::DoubleCrop,
            StageTag::Leaf,
            StageTag::NoHighlight,
            StageTag::Filtered,
        ] {
            assert_eq!(StageTag::from_suffix(tag.suffix()), Some(tag));
        }
        assert_eq!(StageTag::from_suffix("_bogus"), None);
    }

    #[test]
    fn artifact_set_sorts_by_index() {
        let set = ArtifactSet::new(
            StageTag::Leaf,
            vec![
                PageArtifact::new(10, StageTag::Leaf, "b_010.png"),
                PageArtifact::new(2, StageTag::Leaf, "b_002.png"),
                PageArtifact::new(9, StageTag::Leaf, "b_009.png"),
            ],
        );
        assert_eq!(set.indices(), vec![2, 9, 10]);
    }

    #[test]
    fn page_list_parsing() {
        assert_eq!(parse_page_list("1, 3,5").unwrap(), vec![1, 3, 5]);
        assert!(parse_page_list("").unwrap().is_empty());
        assert!(parse_page_list("1,x").is_err());
        assert!(parse_page_list("0").is_err());
        assert!(parse_page_list("1,,2").is_err());
    }
}
