// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Highlight removal — keeps dark text, whitens everything bright enough to be
// paper or a highlighter stroke.

use image::{DynamicImage, Rgb, RgbImage};
use tracing::{debug, instrument};

use crate::image::processor::bt601_luma;

/// Threshold-and-mask highlight removal.
///
/// A pixel whose brightest channel (the HSV value) is below `threshold` is
/// text: it becomes its gray intensity. Every other pixel becomes white.
///
/// Applying this to its own output with the same threshold changes nothing:
/// a gray level is never above the brightest channel it came from, so kept
/// pixels stay below the threshold, and white stays white.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn remove_highlights(image: &DynamicImage, threshold: u8) -> RgbImage {
    let rgb = image.to_rgb8();
    let mut kept: u64 = 0;

    let output = RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
        if r.max(g).max(b) < threshold {
            kept += 1;
            let gray = bt601_luma(r, g, b);
            Rgb([gray, gray, gray])
        } else {
            Rgb([255, 255, 255])
        }
    });

    debug!(threshold, foreground_pixels = kept, "Highlights removed");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Black text, yellow and pink highlighter, a dark-blue pen stroke, paper.
    fn highlighted_page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| match (x / 16, y / 16) {
            (0, _) => Rgb([20, 20, 20]),
            (1, 0) => Rgb([250, 240, 90]),
            (1, _) => Rgb([245, 150, 200]),
            (2, _) => Rgb([30, 40, 80]),
            _ => Rgb([235, 232, 225]),
        }))
    }

    #[test]
    fn highlighter_becomes_white_and_text_stays() {
        let out = remove_highlights(&highlighted_page(), 85);
        assert_eq!(out.get_pixel(3, 3).0, [20, 20, 20]);
        assert_eq!(out.get_pixel(20, 3).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(20, 30).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(60, 40).0, [255, 255, 255]);
        // Dark pen: max channel 80 < 85, kept as gray.
        let pen = out.get_pixel(40, 10).0;
        assert_eq!(pen, [bt601_luma(30, 40, 80); 3]);
    }

    #[test]
    fn threshold_is_strict() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([84, 84, 84])
            } else {
                Rgb([85, 10, 10])
            }
        }));
        let out = remove_highlights(&img, 85);
        assert_eq!(out.get_pixel(0, 0).0, [84, 84, 84]);
        assert_eq!(out.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn idempotent_for_fixed_threshold() {
        for threshold in [0u8, 1, 85, 128, 200, 255] {
            let once = remove_highlights(&highlighted_page(), threshold);
            let twice = remove_highlights(&DynamicImage::ImageRgb8(once.clone()), threshold);
            assert_eq!(once, twice, "threshold {threshold}");
        }
    }

    #[test]
    fn zero_threshold_whitens_everything() {
        let out = remove_highlights(&highlighted_page(), 0);
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255]));
    }
}
