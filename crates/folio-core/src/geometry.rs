// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop geometry — the three rectangles used to split a double-page spread,
// expressed at a reference resolution and rescaled to the working one.

use serde::{Deserialize, Serialize};

use crate::types::Rect;

/// Resolution (DPI) at which crop rectangles are expressed.
pub const REFERENCE_DPI: u32 = 200;

/// Crop rectangles for one book layout.
///
/// `left` and `right` are relative to the cropped double page, not to the
/// full rotated sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropGeometry {
    pub double_page: Rect,
    pub left: Rect,
    pub right: Rect,
}

impl Default for CropGeometry {
    fn default() -> Self {
        Self {
            double_page: Rect::new(608, 0, 2288, 1380),
            left: Rect::new(10, 10, 830, 1380),
            right: Rect::new(850, 10, 1680, 1380),
        }
    }
}

impl CropGeometry {
    /// Rescale from `reference_dpi` to `working_dpi`.
    ///
    /// Each coordinate is multiplied by `working / reference` and truncated.
    /// Equal resolutions return the geometry unchanged. No check against real
    /// image bounds happens here.
    pub fn resolve(&self, reference_dpi: u32, working_dpi: u32) -> Self {
        if working_dpi == reference_dpi || reference_dpi == 0 || working_dpi == 0 {
            return *self;
        }
        let ratio = working_dpi as f64 / reference_dpi as f64;
        Self {
            double_page: self.double_page.scale(ratio),
            left: self.left.scale(ratio),
            right: self.right.scale(ratio),
        }
    }

    /// Shorthand for [`CropGeometry::resolve`] from [`REFERENCE_DPI`].
    pub fn at_resolution(&self, working_dpi: u32) -> Self {
        self.resolve(REFERENCE_DPI, working_dpi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_resolution_is_identity() {
        let geometry = CropGeometry::default();
        assert_eq!(geometry.at_resolution(REFERENCE_DPI), geometry);
    }

    #[test]
    fn scales_to_300_dpi() {
        let scaled = CropGeometry::default().at_resolution(300);
        assert_eq!(scaled.double_page, Rect::new(912, 0, 3432, 2070));
        assert_eq!(scaled.left, Rect::new(15, 15, 1245, 2070));
        assert_eq!(scaled.right, Rect::new(1275, 15, 2520, 2070));
    }

    #[test]
    fn truncates_toward_zero() {
        let geometry = CropGeometry {
            double_page: Rect::new(3, 5, 7, 9),
            left: Rect::new(1, 1, 3, 3),
            right: Rect::new(1, 1, 3, 3),
        };
        // ratio 0.75: 3 -> 2.25, 5 -> 3.75, 7 -> 5.25, 9 -> 6.75
        assert_eq!(geometry.at_resolution(150).double_page, Rect::new(2, 3, 5, 6));
    }

    #[test]
    fn round_trip_within_truncation_tolerance() {
        let original = CropGeometry::default();
        for dpi in [1u32, 37, 72, 96, 150, 199, 201, 300, 333, 600, 1200] {
            let back = original.at_resolution(dpi).resolve(dpi, REFERENCE_DPI);
            // One truncation per direction: the forward step loses up to one
            // working pixel (REFERENCE/dpi reference pixels), the return step
            // loses up to one reference pixel.
            let tolerance = (REFERENCE_DPI as f64 / dpi as f64).ceil() as u32 + 1;
            let pairs = [
                (original.double_page, back.double_page),
                (original.left, back.left),
                (original.right, back.right),
            ];
            for (a, b) in pairs {
                for (x, y) in [(a.x1, b.x1), (a.y1, b.y1), (a.x2, b.x2), (a.y2, b.y2)] {
                    assert!(
                        x.abs_diff(y) <= tolerance,
                        "dpi {dpi}: {x} came back as {y} (tolerance {tolerance})"
                    );
                }
            }
        }
    }
}
