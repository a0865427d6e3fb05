// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Non-local-means colour denoising.
//
// The image is split into YCbCr planes. Luma is filtered on its own with the
// luma strength; the two chroma planes are filtered together (one shared
// weight per candidate) with the chroma strength. Every pixel becomes a
// weighted average of the pixels in its search window, each weighted by
//
//     w = exp(-d / h^2)
//
// where `d` is the mean squared difference between the two surrounding
// patches. Patch distances are computed per search offset with a summed-area
// table, so the cost is O(pixels * search_window^2) rather than also scaling
// with the patch area.

use enhancer_core::error::{EnhancerError, Result};
use image::RgbImage;
use tracing::debug;

use super::Denoiser;

/// Tunables for [`NlMeansDenoiser`]. Window sizes must be odd.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlMeansDenoiser {
    /// Filter strength `h` for the luma plane.
    pub luma_strength: f32,
    /// Filter strength `h` for the chroma planes.
    pub chroma_strength: f32,
    /// Side length of the compared patches, in pixels.
    pub patch_size: u32,
    /// Side length of the search window, in pixels.
    pub search_window: u32,
}

impl Default for NlMeansDenoiser {
    fn default() -> Self {
        Self {
            luma_strength: 10.0,
            chroma_strength: 10.0,
            patch_size: 7,
            search_window: 21,
        }
    }
}

impl NlMeansDenoiser {
    fn check(&self) -> Result<()> {
        for (name, size) in [
            ("patch_size", self.patch_size),
            ("search_window", self.search_window),
        ] {
            if size == 0 || size % 2 == 0 {
                return Err(EnhancerError::InvalidConfig(format!(
                    "{name} must be a positive odd number (got {size})"
                )));
            }
        }
        if !(self.luma_strength > 0.0 && self.chroma_strength > 0.0) {
            return Err(EnhancerError::InvalidConfig(
                "denoise strengths must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Denoiser for NlMeansDenoiser {
    fn name(&self) -> &'static str {
        "nl-means"
    }

    #[cfg(feature = "nlmeans")]
    fn denoise(&self, image: &RgbImage) -> Result<RgbImage> {
        self.check()?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(image.clone());
        }
        let (w, h) = (width as usize, height as usize);
        let [luma, cb, cr] = to_ycbcr(image);
        let patch_radius = (self.patch_size / 2) as usize;
        let search_radius = (self.search_window / 2) as usize;

        debug!(
            width,
            height,
            patch_size = self.patch_size,
            search_window = self.search_window,
            "Running non-local means"
        );

        let luma = nl_means(
            &[luma.as_slice()],
            w,
            h,
            self.luma_strength,
            patch_radius,
            search_radius,
        );
        let chroma = nl_means(
            &[cb.as_slice(), cr.as_slice()],
            w,
            h,
            self.chroma_strength,
            patch_radius,
            search_radius,
        );

        Ok(from_ycbcr(width, height, &luma[0], &chroma[0], &chroma[1]))
    }

    #[cfg(not(feature = "nlmeans"))]
    fn denoise(&self, _image: &RgbImage) -> Result<RgbImage> {
        self.check()?;
        debug!("Non-local means requested but not compiled in");
        Err(EnhancerError::FilterUnavailable(
            "built without the `nlmeans` feature".into(),
        ))
    }
}

// -- Colour space ---------------------------------------------------------------

/// Full-range BT.601 YCbCr planes.
#[cfg(feature = "nlmeans")]
fn to_ycbcr(image: &RgbImage) -> [Vec<f32>; 3] {
    let count = image.width() as usize * image.height() as usize;
    let mut planes = [
        Vec::with_capacity(count),
        Vec::with_capacity(count),
        Vec::with_capacity(count),
    ];
    for pixel in image.pixels() {
        let [r, g, b] = pixel.0.map(f32::from);
        planes[0].push(0.299 * r + 0.587 * g + 0.114 * b);
        planes[1].push(128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b);
        planes[2].push(128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b);
    }
    planes
}

#[cfg(feature = "nlmeans")]
fn from_ycbcr(width: u32, height: u32, luma: &[f32], cb: &[f32], cr: &[f32]) -> RgbImage {
    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    RgbImage::from_fn(width, height, |x, y| {
        let i = y as usize * width as usize + x as usize;
        let (l, b, r) = (luma[i], cb[i] - 128.0, cr[i] - 128.0);
        image::Rgb([
            to_u8(l + 1.402 * r),
            to_u8(l - 0.344_136 * b - 0.714_136 * r),
            to_u8(l + 1.772 * b),
        ])
    })
}

// -- Filter -------------------------------------------------------------------

/// Filter `planes` jointly: one weight per (pixel, candidate) computed from the
/// patch distance averaged over all planes.
#[cfg(feature = "nlmeans")]
fn nl_means(
    planes: &[&[f32]],
    width: usize,
    height: usize,
    strength: f32,
    patch_radius: usize,
    search_radius: usize,
) -> Vec<Vec<f32>> {
    let count = width * height;
    let inv_h2 = 1.0 / (strength as f64 * strength as f64);
    let plane_norm = 1.0 / planes.len() as f64;
    let reach = search_radius as isize;

    let mut sums = vec![vec![0.0f64; count]; planes.len()];
    let mut weights = vec![0.0f64; count];
    let mut diff = vec![0.0f64; count];
    let mut integral = vec![0.0f64; (width + 1) * (height + 1)];

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            // Squared difference between each pixel and its offset partner.
            for y in 0..height {
                let sy = shift(y, dy, height);
                for x in 0..width {
                    let p = y * width + x;
                    let q = sy * width + shift(x, dx, width);
                    let d: f64 = planes
                        .iter()
                        .map(|plane| {
                            let e = (plane[p] - plane[q]) as f64;
                            e * e
                        })
                        .sum();
                    diff[p] = d * plane_norm;
                }
            }

            fill_integral(&diff, width, height, &mut integral);

            for y in 0..height {
                let sy = shift(y, dy, height);
                for x in 0..width {
                    let p = y * width + x;
                    let q = sy * width + shift(x, dx, width);
                    let distance = region_mean(&integral, width, height, x, y, patch_radius);
                    let weight = (-distance * inv_h2).exp();
                    weights[p] += weight;
                    for (sum, plane) in sums.iter_mut().zip(planes) {
                        sum[p] += weight * plane[q] as f64;
                    }
                }
            }
        }
    }

    // The zero offset always contributes weight 1, so no division by zero.
    sums.into_iter()
        .map(|sum| {
            sum.iter()
                .zip(&weights)
                .map(|(s, w)| (s / w) as f32)
                .collect()
        })
        .collect()
}

/// `index + delta`, clamped to `0..len`.
#[cfg(feature = "nlmeans")]
fn shift(index: usize, delta: isize, len: usize) -> usize {
    (index as isize + delta).clamp(0, len as isize - 1) as usize
}

/// Summed-area table of `values` with a zero-padded first row and column.
///
/// `table[y * (width+1) + x]` holds the sum over the rectangle `[0, x) x [0, y)`.
#[cfg(feature = "nlmeans")]
fn fill_integral(values: &[f64], width: usize, height: usize, table: &mut [f64]) {
    let stride = width + 1;
    table[..stride].fill(0.0);
    for y in 0..height {
        let mut row_sum = 0.0;
        table[(y + 1) * stride] = 0.0;
        for x in 0..width {
            row_sum += values[y * width + x];
            table[(y + 1) * stride + x + 1] = row_sum + table[y * stride + x + 1];
        }
    }
}

/// Mean of the square of side `2 * radius + 1` centred on (cx, cy), clipped
/// to the image.
#[cfg(feature = "nlmeans")]
fn region_mean(
    table: &[f64],
    width: usize,
    height: usize,
    cx: usize,
    cy: usize,
    radius: usize,
) -> f64 {
    let stride = width + 1;
    let x1 = cx.saturating_sub(radius);
    let y1 = cy.saturating_sub(radius);
    let x2 = (cx + radius + 1).min(width);
    let y2 = (cy + radius + 1).min(height);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    let sum = table[y2 * stride + x2] - table[y1 * stride + x2] - table[y2 * stride + x1]
        + table[y1 * stride + x1];
    // Rounding in the table can leave a tiny negative residue.
    (sum / area).max(0.0)
}
