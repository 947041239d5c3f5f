// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// High-pass sharpening — subtracts a heavy blur from the page to flatten
// uneven lighting, then stretches contrast so strokes stand out.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::{box_filter, gaussian_blur_f32};
use tracing::{debug, instrument};

use crate::image::processor::bt601_luma;

/// Above this sigma the exact Gaussian kernel gets too wide to be practical,
/// and the blur is approximated with three box passes.
const EXACT_GAUSSIAN_MAX_SIGMA: f32 = 25.0;

/// Grayscale → blur → `original - blurred + 128` → contrast × `contrast`
/// around the mean, returned as RGB with the gray level in every channel.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn high_pass(image: &DynamicImage, sigma: f32, contrast: f32) -> RgbImage {
    let gray = to_gray(image);
    let blurred = blur(&gray, sigma);

    let detail = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let original = gray.get_pixel(x, y).0[0] as i32;
        let background = blurred.get_pixel(x, y).0[0] as i32;
        Luma([(original - background + 128).clamp(0, 255) as u8])
    });

    let enhanced = enhance_contrast(&detail, contrast);
    debug!(sigma, contrast, "High-pass filter applied");

    RgbImage::from_fn(enhanced.width(), enhanced.height(), |x, y| {
        let v = enhanced.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

/// BT.601 grayscale conversion.
fn to_gray(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
        Luma([bt601_luma(r, g, b)])
    })
}

fn blur(gray: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= EXACT_GAUSSIAN_MAX_SIGMA {
        return gaussian_blur_f32(gray, sigma);
    }

    // Three successive box filters of width w approximate a Gaussian with
    // variance 3 * (w^2 - 1) / 12.
    let width = (4.0 * sigma * sigma + 1.0).sqrt();
    let radius = ((width - 1.0) / 2.0).round().max(1.0) as u32;
    // A window wider than the page averages the same pixels as one that just
    // covers it.
    let radius = radius.min(gray.width().max(gray.height()));

    let mut out = box_filter(gray, radius, radius);
    out = box_filter(&out, radius, radius);
    box_filter(&out, radius, radius)
}

/// Scale each pixel's distance from the rounded image mean by `factor`.
fn enhance_contrast(gray: &GrayImage, factor: f32) -> GrayImage {
    let count = (gray.width() as u64 * gray.height() as u64).max(1);
    let sum: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (sum as f64 / count as f64 + 0.5).floor() as f32;

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0] as f32;
        Luma([(mean + factor * (v - mean)).round().clamp(0.0, 255.0) as u8])
    })
}
