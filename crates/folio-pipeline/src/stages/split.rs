// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage 2 — cut each double page down to the spread, then into its left and
// right leaves.

use folio_core::error::Result;
use folio_core::geometry::CropGeometry;
use folio_core::types::{ArtifactSet, StageTag};
use folio_document::ImageProcessor;
use tracing::{debug, info, instrument};

use crate::artifact::ArtifactStore;

/// Everything stage 2 writes.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    /// Cropped spreads, indexed by sheet position.
    pub double_crops: ArtifactSet,
    /// Leaves: the `k`-th sheet yields `2k-1` (left) and `2k` (right).
    pub leaves: ArtifactSet,
}

#[instrument(skip_all, fields(sheets = doubles.len()))]
pub fn split(
    doubles: &ArtifactSet,
    geometry: &CropGeometry,
    store: &ArtifactStore,
) -> Result<SplitOutput> {
    let mut crops = Vec::with_capacity(doubles.len());
    let mut leaves = Vec::with_capacity(doubles.len() * 2);

    // Numbering follows position in the set, so a gap in the `double`
    // indices (a sheet deleted before resuming) leaves no gap in the leaves.
    for (sheet, double) in (1u32..).zip(doubles.iter()) {
        let spread = ImageProcessor::open(double.path())?.crop(geometry.double_page)?;
        let spread = spread.into_dynamic();
        crops.push(store.write(sheet, StageTag::DoubleCrop, spread.clone())?);

        let (left_index, right_index) = leaf_indices(sheet);
        let left = ImageProcessor::from_dynamic(spread.clone()).crop(geometry.left)?;
        leaves.push(store.write(left_index, StageTag::Leaf, left.into_dynamic())?);
        let right = ImageProcessor::from_dynamic(spread).crop(geometry.right)?;
        leaves.push(store.write(right_index, StageTag::Leaf, right.into_dynamic())?);

        debug!(
            source = double.index,
            sheet,
            left_index,
            right_index,
            "Sheet split"
        );
    }

    info!(leaves = leaves.len(), "Split complete");
    Ok(SplitOutput {
        double_crops: ArtifactSet::new(StageTag::DoubleCrop, crops),
        leaves: ArtifactSet::new(StageTag::Leaf, leaves),
    })
}

/// Leaf indices for the sheet at 1-based position `k`.
pub fn leaf_indices(sheet: u32) -> (u32, u32) {
    (2 * sheet - 1, 2 * sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::types::Rect;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    #[test]
    fn leaves_interleave_across_sheets() {
        assert_eq!(leaf_indices(1), (1, 2));
        assert_eq!(leaf_indices(2), (3, 4));
        assert_eq!(leaf_indices(7), (13, 14));
    }

    /// Columns are painted with their own x coordinate so every crop can be
    /// traced back to its source region.
    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            Rgb([(x % 256) as u8, (x / 256) as u8, 0])
        }))
    }

    fn source_x(image: &DynamicImage, x: u32) -> u32 {
        let px = image.get_pixel(x, 0).0;
        px[0] as u32 + px[1] as u32 * 256
    }

    #[test]
    fn leaves_come_from_the_cropped_spread() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();
        let double = store.write(2, StageTag::Double, gradient(300, 40)).unwrap();
        let doubles = ArtifactSet::new(StageTag::Double, vec![double]);
        let geometry = CropGeometry {
            double_page: Rect::new(100, 0, 300, 40),
            left: Rect::new(0, 0, 90, 40),
            right: Rect::new(110, 0, 200, 40),
        };

        let out = split(&doubles, &geometry, &store).unwrap();
        assert_eq!(out.double_crops.indices(), vec![1]);
        assert_eq!(out.leaves.indices(), vec![1, 2]);

        let left = image::open(out.leaves.as_slice()[0].path()).unwrap();
        let right = image::open(out.leaves.as_slice()[1].path()).unwrap();
        assert_eq!(left.dimensions(), (90, 40));
        assert_eq!(source_x(&left, 0), 100);
        assert_eq!(source_x(&right, 0), 210);
        // Disjoint leaf rectangles map to disjoint source columns.
        assert!(source_x(&left, 89) < source_x(&right, 0));
    }

    #[test]
    fn gaps_in_sheet_indices_do_not_leave_gaps_in_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();
        let doubles = ArtifactSet::new(
            StageTag::Double,
            vec![
                store.write(3, StageTag::Double, gradient(300, 40)).unwrap(),
                store.write(1, StageTag::Double, gradient(300, 40)).unwrap(),
            ],
        );
        let geometry = CropGeometry {
            double_page: Rect::new(100, 0, 300, 40),
            left: Rect::new(0, 0, 90, 40),
            right: Rect::new(110, 0, 200, 40),
        };

        let out = split(&doubles, &geometry, &store).unwrap();
        assert_eq!(out.leaves.indices(), vec![1, 2, 3, 4]);
        assert_eq!(out.double_crops.indices(), vec![1, 2]);
        assert!(store.path(4, StageTag::Leaf).exists());
        assert!(!store.path(5, StageTag::Leaf).exists());
    }

    #[test]
    fn oversized_crops_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();
        let double = store.write(1, StageTag::Double, gradient(120, 30)).unwrap();
        let doubles = ArtifactSet::new(StageTag::Double, vec![double]);
        let geometry = CropGeometry {
            double_page: Rect::new(0, 0, 500, 500),
            left: Rect::new(0, 0, 60, 500),
            right: Rect::new(60, 0, 500, 500),
        };

        let out = split(&doubles, &geometry, &store).unwrap();
        let right = image::open(out.leaves.as_slice()[1].path()).unwrap();
        assert_eq!(right.dimensions(), (60, 30));
    }

    #[test]
    fn crop_outside_the_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "Book").unwrap();
        let double = store.write(1, StageTag::Double, gradient(50, 50)).unwrap();
        let geometry = CropGeometry {
            double_page: Rect::new(60, 0, 100, 50),
            ..CropGeometry::default()
        };
        let doubles = ArtifactSet::new(StageTag::Double, vec![double]);
        assert!(split(&doubles, &geometry, &store).is_err());
    }
}
