// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Factor-based tonal adjustments.
//
// Each adjustment builds a "degenerate" reference image and extrapolates from
// it towards (factor > 1) or interpolates back to it (factor < 1) the input:
//
//     out = degenerate + factor * (image - degenerate)
//
// A factor of exactly 1.0 reproduces the input.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::map::{map_colors, map_colors2};

use crate::raster::kernel::{self, SMOOTH};

/// ITU-R 601 luma of an RGB pixel, in 16-bit fixed point.
pub fn luma(pixel: Rgb<u8>) -> u8 {
    let Rgb([r, g, b]) = pixel;
    ((r as u32 * 19_595 + g as u32 * 38_470 + b as u32 * 7_471 + 0x8000) >> 16) as u8
}

/// Single-channel luma copy of `image`.
pub fn grayscale(image: &RgbImage) -> GrayImage {
    map_colors(image, |pixel: Rgb<u8>| Luma([luma(pixel)]))
}

/// Mean luma, rounded to the nearest level. Empty images report 0.
pub fn mean_luma(image: &RgbImage) -> u8 {
    let gray = grayscale(image);
    let count = gray.len() as u64;
    if count == 0 {
        return 0;
    }
    let total: u64 = gray.iter().map(|&v| v as u64).sum();
    (total as f64 / count as f64 + 0.5) as u8
}

/// Per-channel `degenerate + factor * (image - degenerate)`, clamped to 0..=255.
///
/// Both images must have the same dimensions.
pub fn blend(degenerate: &RgbImage, image: &RgbImage, factor: f32) -> RgbImage {
    map_colors2(degenerate, image, |low: Rgb<u8>, high: Rgb<u8>| {
        Rgb([
            mix(low[0], high[0], factor),
            mix(low[1], high[1], factor),
            mix(low[2], high[2], factor),
        ])
    })
}

fn mix(low: u8, high: u8, factor: f32) -> u8 {
    let value = low as f32 + factor * (high as f32 - low as f32);
    value.clamp(0.0, 255.0) as u8
}

/// Edge enhancement relative to a 3x3-smoothed copy.
pub fn sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let smoothed = kernel::convolve(image, &SMOOTH);
    blend(&smoothed, image, factor)
}

/// Contrast around the image's mean luma.
pub fn contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luma(image);
    let (width, height) = image.dimensions();
    let gray = RgbImage::from_pixel(width, height, Rgb([mean, mean, mean]));
    blend(&gray, image, factor)
}

/// Brightness as a blend from black.
pub fn brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    blend(&RgbImage::new(width, height), image, factor)
}

/// Saturation as a blend from the grayscale rendition.
pub fn color(image: &RgbImage, factor: f32) -> RgbImage {
    let gray = map_colors(image, |pixel: Rgb<u8>| {
        let l = luma(pixel);
        Rgb([l, l, l])
    });
    blend(&gray, image, factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> RgbImage {
        RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([100, 100, 100])
            } else {
                Rgb([200, 200, 200])
            }
        })
    }

    #[test]
    fn luma_of_primaries() {
        assert_eq!(luma(Rgb([255, 255, 255])), 255);
        assert_eq!(luma(Rgb([0, 0, 0])), 0);
        assert_eq!(luma(Rgb([255, 0, 0])), 76);
        assert_eq!(luma(Rgb([0, 255, 0])), 150);
        assert_eq!(luma(Rgb([0, 0, 255])), 29);
    }

    #[test]
    fn factor_one_is_identity() {
        let img = RgbImage::from_fn(7, 5, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 77]));
        assert_eq!(sharpness(&img, 1.0), img);
        assert_eq!(contrast(&img, 1.0), img);
        assert_eq!(brightness(&img, 1.0), img);
        assert_eq!(color(&img, 1.0), img);
    }

    #[test]
    fn contrast_pivots_on_mean_luma() {
        let img = two_tone();
        assert_eq!(mean_luma(&img), 150);
        let out = contrast(&img, 2.0);
        assert_eq!(*out.get_pixel(0, 0), Rgb([50, 50, 50]));
        assert_eq!(*out.get_pixel(3, 0), Rgb([250, 250, 250]));
    }

    #[test]
    fn brightness_scales_and_clamps() {
        let img = two_tone();
        let out = brightness(&img, 1.5);
        assert_eq!(*out.get_pixel(0, 0), Rgb([150, 150, 150]));
        assert_eq!(*out.get_pixel(3, 1), Rgb([255, 255, 255]));
        let dark = brightness(&img, 0.0);
        assert!(dark.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn zero_color_is_grayscale() {
        let img = RgbImage::from_pixel(3, 3, Rgb([255, 0, 0]));
        let out = color(&img, 0.0);
        assert_eq!(*out.get_pixel(1, 1), Rgb([76, 76, 76]));
    }

    #[test]
    fn sharpness_amplifies_edges() {
        let img = RgbImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgb([60, 60, 60])
            } else {
                Rgb([180, 180, 180])
            }
        });
        let out = sharpness(&img, 2.0);
        assert!(out.get_pixel(3, 4)[0] < 60);
        assert!(out.get_pixel(4, 4)[0] > 180);
        // Flat regions and the border stay put.
        assert_eq!(out.get_pixel(1, 4)[0], 60);
        assert_eq!(out.get_pixel(0, 4)[0], 60);
    }
}
