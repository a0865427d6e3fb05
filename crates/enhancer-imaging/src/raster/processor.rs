// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode to RGB, tonal adjustments, Lanczos resampling and
// lossless PNG output. Operates on in-memory images using the `image` and
// `imageproc` crates.

use std::io::Cursor;

use enhancer_core::error::{EnhancerError, Result};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};
use tracing::{debug, instrument};

use crate::raster::adjust;

/// Image processing pipeline operating on a single in-memory RGB image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let png = ImageProcessor::from_bytes(&bytes)?
///     .sharpen(2.0)
///     .adjust_contrast(1.2)
///     .to_png_bytes()?;
/// ```
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// The current working image, always 8-bit RGB.
    image: RgbImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (PNG, JPEG, WebP, ...) and normalise to RGB.
    ///
    /// Any alpha channel is dropped; 16-bit and float inputs are reduced to 8 bits.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| EnhancerError::Decode(err.to_string()))?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image decoded from bytes"
        );
        Ok(Self {
            image: img.into_rgb8(),
        })
    }

    /// Wrap an already-decoded RGB image.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Borrow the underlying image.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the processor and return the underlying image.
    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Sharpen (factor > 1) or soften (factor < 1) edges.
    pub fn sharpen(self, factor: f32) -> Self {
        Self {
            image: adjust::sharpness(&self.image, factor),
        }
    }

    /// Adjust contrast by a factor around the mean luma.
    pub fn adjust_contrast(self, factor: f32) -> Self {
        Self {
            image: adjust::contrast(&self.image, factor),
        }
    }

    /// Scale brightness by a factor.
    pub fn adjust_brightness(self, factor: f32) -> Self {
        Self {
            image: adjust::brightness(&self.image, factor),
        }
    }

    /// Scale saturation by a factor. 0.0 yields grayscale.
    pub fn adjust_color(self, factor: f32) -> Self {
        Self {
            image: adjust::color(&self.image, factor),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_png(&self.image)
    }
}

/// Lanczos3 resample of `image` to exactly `width` x `height`.
pub fn resize_lanczos(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    debug!(
        from_w = image.width(),
        from_h = image.height(),
        width,
        height,
        "Lanczos resample"
    );
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Encode an RGB image as PNG, returning the raw bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| EnhancerError::Encode(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}
