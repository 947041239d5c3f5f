// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — rotation with canvas expansion, rectangle crops, and
// PNG persistence for page artifacts. Operates on in-memory images using the
// `image` and `imageproc` crates.

use std::path::Path;

use folio_core::error::FolioError;
use folio_core::Rect;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::geometric_transformations::{self, Interpolation};
use tracing::{debug, instrument, warn};

/// Fill colour for canvas area uncovered by a rotation.
const PAPER_WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Transformation pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor`, so calls
/// chain:
///
/// ```ignore
/// ImageProcessor::open("Book_001_double.png")?
///     .crop(double_page)?
///     .save("Book_001_double_crop.png")?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FolioError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            FolioError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate counter-clockwise by `degrees`, growing the canvas so no corner
    /// of the original is cut off.
    ///
    /// Quarter turns are lossless. Other angles use bilinear interpolation and
    /// fill the uncovered canvas with white.
    #[instrument(skip_all, fields(degrees = degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        let near = |target: f32| (normalised - target).abs() < 0.01;

        if near(0.0) || near(360.0) {
            return self;
        }
        if near(90.0) {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if near(180.0) {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if near(270.0) {
            return Self {
                image: self.image.rotate90(),
            };
        }

        let rgb = self.image.to_rgb8();
        let (w, h) = rgb.dimensions();
        let radians = degrees.to_radians();
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        let out_w = (w as f32 * cos + h as f32 * sin).ceil().max(1.0) as u32;
        let out_h = (w as f32 * sin + h as f32 * cos).ceil().max(1.0) as u32;

        // Centre the source on a canvas large enough for both the source and
        // the rotated bounding box, rotate there, then trim to the bounding box.
        let pad_w = out_w.max(w);
        let pad_h = out_h.max(h);
        let mut canvas = RgbImage::from_pixel(pad_w, pad_h, PAPER_WHITE);
        image::imageops::overlay(
            &mut canvas,
            &rgb,
            ((pad_w - w) / 2) as i64,
            ((pad_h - h) / 2) as i64,
        );

        // imageproc rotates clockwise for positive angles.
        let rotated = geometric_transformations::rotate_about_center(
            &canvas,
            -radians,
            Interpolation::Bilinear,
            PAPER_WHITE,
        );
        let trimmed = image::imageops::crop_imm(
            &rotated,
            (pad_w - out_w) / 2,
            (pad_h - out_h) / 2,
            out_w,
            out_h,
        )
        .to_image();

        debug!(from_w = w, from_h = h, out_w, out_h, "General rotation applied");
        Self {
            image: DynamicImage::ImageRgb8(trimmed),
        }
    }

    /// Crop to `rect` (`x2`/`y2` exclusive).
    ///
    /// A rectangle reaching past the image edge is clamped to the image and
    /// reported; a rectangle with nothing left after clamping is an error.
    #[instrument(skip_all, fields(rect = %rect))]
    pub fn crop(self, rect: Rect) -> Result<Self, FolioError> {
        let (img_w, img_h) = (self.image.width(), self.image.height());
        let clamped = Rect::new(
            rect.x1.min(img_w),
            rect.y1.min(img_h),
            rect.x2.min(img_w),
            rect.y2.min(img_h),
        );

        if !clamped.is_valid() {
            return Err(FolioError::ImageError(format!(
                "crop {} lies outside the {}x{} image",
                rect, img_w, img_h
            )));
        }
        if clamped != rect {
            warn!(
                requested = %rect,
                clamped = %clamped,
                img_w,
                img_h,
                "Crop exceeds image bounds; clamping"
            );
        }

        let cropped = self
            .image
            .crop_imm(clamped.x1, clamped.y1, clamped.width(), clamped.height());
        Ok(Self { image: cropped })
    }

    /// Normalise to 8-bit RGB.
    pub fn to_rgb(self) -> Self {
        match self.image {
            DynamicImage::ImageRgb8(_) => self,
            other => Self {
                image: DynamicImage::ImageRgb8(other.to_rgb8()),
            },
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image as PNG, whatever the file extension says.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FolioError> {
        self.image
            .save_with_format(path.as_ref(), ImageFormat::Png)
            .map_err(|err| {
                FolioError::ImageError(format!(
                    "failed to save image to {}: {}",
                    path.as_ref().display(),
                    err
                ))
            })
    }
}

/// ITU-R BT.601 luma, rounded. Gray input maps to itself.
pub fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}
