// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — decode/encode, Lanczos resampling, smoothing kernels, and
// factor-based tonal adjustment.

pub mod adjust;
pub mod kernel;
pub mod processor;

pub use processor::ImageProcessor;
