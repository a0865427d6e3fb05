// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed smoothing kernels and the square convolution that applies them.

use image::{Rgb, RgbImage};

/// A square, odd-sized convolution kernel with an integer normalising scale.
#[derive(Debug, Clone, Copy)]
pub struct ConvolutionKernel {
    /// Side length (3 or 5).
    pub size: u32,
    /// Row-major weights, `size * size` entries.
    pub weights: &'static [f32],
    /// Divisor applied to the weighted sum.
    pub scale: f32,
}

/// Mild 3x3 smoothing: centre weight 5, neighbours 1.
pub const SMOOTH: ConvolutionKernel = ConvolutionKernel {
    size: 3,
    weights: &[
        1.0, 1.0, 1.0, //
        1.0, 5.0, 1.0, //
        1.0, 1.0, 1.0,
    ],
    scale: 13.0,
};

/// Strong 5x5 smoothing.
pub const SMOOTH_MORE: ConvolutionKernel = ConvolutionKernel {
    size: 5,
    weights: &[
        1.0, 1.0, 1.0, 1.0, 1.0, //
        1.0, 5.0, 5.0, 5.0, 1.0, //
        1.0, 5.0, 44.0, 5.0, 1.0, //
        1.0, 5.0, 5.0, 5.0, 1.0, //
        1.0, 1.0, 1.0, 1.0, 1.0,
    ],
    scale: 100.0,
};

/// Convolve every channel of `image` with `kernel`.
///
/// Pixels closer to the edge than the kernel radius are copied through
/// unchanged, so an image smaller than the kernel comes back untouched.
/// Results are rounded to the nearest integer and clamped to `0..=255`.
pub fn convolve(image: &RgbImage, kernel: &ConvolutionKernel) -> RgbImage {
    let (width, height) = image.dimensions();
    let radius = kernel.size / 2;
    let mut output = image.clone();

    if width <= 2 * radius || height <= 2 * radius {
        return output;
    }

    for y in radius..height - radius {
        for x in radius..width - radius {
            let mut acc = [0.0f32; 3];
            for ky in 0..kernel.size {
                for kx in 0..kernel.size {
                    let weight = kernel.weights[(ky * kernel.size + kx) as usize];
                    let Rgb(channels) = *image.get_pixel(x + kx - radius, y + ky - radius);
                    for (sum, value) in acc.iter_mut().zip(channels) {
                        *sum += weight * value as f32;
                    }
                }
            }
            let pixel = acc.map(|sum| (sum / kernel.scale).round().clamp(0.0, 255.0) as u8);
            output.put_pixel(x, y, Rgb(pixel));
        }
    }

    output
}
