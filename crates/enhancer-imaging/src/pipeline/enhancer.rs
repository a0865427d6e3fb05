// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The enhancement pipeline: decode, run the configured stages in a fixed
// order, encode to PNG.

use std::fmt;
use std::time::Instant;

use enhancer_core::config::EnhancementConfig;
use enhancer_core::error::Result;
use tracing::{info, instrument};

use crate::denoise::{self, Denoiser, NlMeansDenoiser};
use crate::pipeline::upscale;
use crate::raster::ImageProcessor;

/// Sharpening applied after any upscale, independent of the configured
/// sharpness.
pub const FINAL_SHARPEN: f32 = 1.1;

/// Runs the enhancement pipeline.
///
/// Holds no per-request state, so one instance can be shared across threads.
pub struct Enhancer {
    denoiser: Box<dyn Denoiser>,
}

impl Default for Enhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Enhancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enhancer")
            .field("denoiser", &self.denoiser.name())
            .finish()
    }
}

impl Enhancer {
    /// Pipeline using non-local-means denoising.
    pub fn new() -> Self {
        Self::with_denoiser(NlMeansDenoiser::default())
    }

    /// Pipeline using a caller-supplied denoising strategy.
    pub fn with_denoiser(denoiser: impl Denoiser + 'static) -> Self {
        Self {
            denoiser: Box::new(denoiser),
        }
    }

    /// Enhance encoded image bytes, returning PNG bytes.
    ///
    /// Output dimensions are the input dimensions times the super-resolution
    /// factor. Factors are applied as given; range checks belong to callers.
    #[instrument(
        skip(self, data, config),
        fields(data_len = data.len(), factor = config.super_resolution.factor())
    )]
    pub fn enhance(&self, data: &[u8], config: &EnhancementConfig) -> Result<Vec<u8>> {
        let started = Instant::now();
        let processor = ImageProcessor::from_bytes(data)?;
        let (width, height) = processor.dimensions();
        info!(width, height, "Enhancement started");

        let processor = self.apply(processor, config)?;
        let png = processor.to_png_bytes()?;

        let (out_w, out_h) = processor.dimensions();
        info!(
            width = out_w,
            height = out_h,
            output_len = png.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enhancement complete"
        );
        Ok(png)
    }

    /// Run every applicable stage on an already-decoded image.
    pub fn apply(
        &self,
        processor: ImageProcessor,
        config: &EnhancementConfig,
    ) -> Result<ImageProcessor> {
        let mut processor = processor;

        if config.denoise {
            let stage = Instant::now();
            let denoised = denoise::denoise_with_fallback(&*self.denoiser, processor.as_rgb())?;
            processor = ImageProcessor::from_rgb(denoised);
            info!(
                stage = "denoise",
                denoiser = self.denoiser.name(),
                elapsed_ms = elapsed_ms(stage),
                "Stage applied"
            );
        }

        if config.sharpness != 1.0 {
            let stage = Instant::now();
            processor = processor.sharpen(config.sharpness);
            info!(
                stage = "sharpness",
                factor = config.sharpness,
                elapsed_ms = elapsed_ms(stage),
                "Stage applied"
            );
        }

        if config.contrast != 1.0 {
            let stage = Instant::now();
            processor = processor.adjust_contrast(config.contrast);
            info!(
                stage = "contrast",
                factor = config.contrast,
                elapsed_ms = elapsed_ms(stage),
                "Stage applied"
            );
        }

        if config.brightness != 1.0 {
            let stage = Instant::now();
            processor = processor.adjust_brightness(config.brightness);
            info!(
                stage = "brightness",
                factor = config.brightness,
                elapsed_ms = elapsed_ms(stage),
                "Stage applied"
            );
        }

        if config.color != 1.0 {
            let stage = Instant::now();
            processor = processor.adjust_color(config.color);
            info!(
                stage = "color",
                factor = config.color,
                elapsed_ms = elapsed_ms(stage),
                "Stage applied"
            );
        }

        if config.super_resolution.is_upscale() {
            let factor = config.super_resolution.factor();
            let stage = Instant::now();
            let upscaled = upscale::super_resolve(processor.as_rgb(), factor)?;
            processor = ImageProcessor::from_rgb(upscaled);
            info!(
                stage = "super_resolution",
                factor,
                elapsed_ms = elapsed_ms(stage),
                "Stage applied"
            );

            let stage = Instant::now();
            processor = processor.sharpen(FINAL_SHARPEN);
            info!(
                stage = "final_sharpen",
                factor = FINAL_SHARPEN,
                elapsed_ms = elapsed_ms(stage),
                "Stage applied"
            );
        }

        Ok(processor)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
