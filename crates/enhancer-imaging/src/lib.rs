// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// enhancer-imaging — The classical enhancement pipeline.
//
// Decodes an image, applies denoising, sharpening, contrast, brightness and
// colour adjustments, upscales by 2x/4x/8x with interleaved sharpening, and
// re-encodes losslessly to PNG. Also provides header inspection, base64
// previews and file/batch helpers.

pub mod denoise;
pub mod pipeline;
pub mod raster;

// Re-export the primary types so callers can use `enhancer_imaging::Enhancer` etc.
pub use denoise::{Denoiser, NlMeansDenoiser, SmoothingDenoiser};
pub use pipeline::Enhancer;
pub use pipeline::inspect::image_info;
pub use raster::ImageProcessor;
