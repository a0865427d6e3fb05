// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the enhancement pipeline. Covers the default tonal
// pass, progressive 4x upscaling, and non-local-means denoising on small
// synthetic images.

use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{ImageFormat, Rgb, RgbImage};

use enhancer_core::{EnhancementConfig, SuperResolution};
use enhancer_imaging::{Denoiser, Enhancer, NlMeansDenoiser};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Diagonal colour gradient with a faint periodic texture, so sharpening and
/// denoising have real work to do.
fn textured(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let ripple = ((x * 7 + y * 13) % 11) as u8;
        Rgb([
            (x * 255 / width) as u8 ^ ripple,
            (y * 255 / height) as u8,
            ((x + y) * 2) as u8 ^ ripple,
        ])
    })
}

fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode fixture");
    bytes
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Default configuration (sharpness, contrast, brightness, colour; no upscale)
/// on a 128x128 image, including decode and PNG encode.
fn bench_default_pipeline(c: &mut Criterion) {
    let input = png_bytes(&textured(128, 128));
    let enhancer = Enhancer::new();
    let config = EnhancementConfig::default();

    c.bench_function("enhance default (128x128)", |b| {
        b.iter(|| black_box(enhancer.enhance(black_box(&input), &config)));
    });
}

/// Progressive 4x super resolution on a 64x64 image.
fn bench_super_resolution(c: &mut Criterion) {
    let input = png_bytes(&textured(64, 64));
    let enhancer = Enhancer::new();
    let config = EnhancementConfig::identity().with_super_resolution(SuperResolution::X4);

    c.bench_function("super_resolution 4x (64x64)", |b| {
        b.iter(|| black_box(enhancer.enhance(black_box(&input), &config)));
    });
}

/// Non-local-means denoising alone on a 64x64 image.
fn bench_nl_means(c: &mut Criterion) {
    let image = textured(64, 64);
    let denoiser = NlMeansDenoiser::default();

    c.bench_function("nl_means denoise (64x64)", |b| {
        b.iter(|| black_box(denoiser.denoise(black_box(&image))));
    });
}

criterion_group!(
    benches,
    bench_default_pipeline,
    bench_super_resolution,
    bench_nl_means
);
criterion_main!(benches);
