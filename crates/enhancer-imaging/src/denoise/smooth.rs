// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use enhancer_core::error::Result;
use image::RgbImage;

use super::Denoiser;
use crate::raster::kernel::{self, SMOOTH, SMOOTH_MORE};

/// Strong 5x5 smoothing followed by a gentle 3x3 pass. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothingDenoiser;

impl SmoothingDenoiser {
    pub fn smooth(&self, image: &RgbImage) -> RgbImage {
        let strong = kernel::convolve(image, &SMOOTH_MORE);
        kernel::convolve(&strong, &SMOOTH)
    }
}

impl Denoiser for SmoothingDenoiser {
    fn name(&self) -> &'static str {
        "smoothing"
    }

    fn denoise(&self, image: &RgbImage) -> Result<RgbImage> {
        Ok(self.smooth(image))
    }
}
