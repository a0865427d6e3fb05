// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Denoising strategies — a preferred non-local-means filter and a two-pass
// smoothing filter that stands in whenever the preferred one cannot run.

pub mod nlmeans;
pub mod smooth;

use enhancer_core::error::{EnhancerError, Result};
use image::RgbImage;
use tracing::warn;

pub use nlmeans::NlMeansDenoiser;
pub use smooth::SmoothingDenoiser;

/// A colour denoising filter.
pub trait Denoiser: Send + Sync {
    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Produce a denoised copy of `image` with identical dimensions.
    ///
    /// Return [`EnhancerError::FilterUnavailable`] when the filter cannot run in
    /// this build or environment; callers treat that as recoverable.
    fn denoise(&self, image: &RgbImage) -> Result<RgbImage>;
}

/// Denoise with `preferred`, degrading to [`SmoothingDenoiser`] if it reports
/// itself unavailable.
///
/// Only `FilterUnavailable` triggers the fallback. Any other error from the
/// preferred filter is returned unchanged.
pub fn denoise_with_fallback(preferred: &dyn Denoiser, image: &RgbImage) -> Result<RgbImage> {
    match preferred.denoise(image) {
        Err(EnhancerError::FilterUnavailable(reason)) => {
            warn!(
                denoiser = preferred.name(),
                %reason,
                "Preferred denoiser unavailable; falling back to smoothing"
            );
            Ok(SmoothingDenoiser.smooth(image))
        }
        other => other,
    }
}
