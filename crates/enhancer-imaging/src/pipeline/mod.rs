// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

pub mod batch;
pub mod enhancer;
pub mod inspect;
pub mod upscale;

pub use enhancer::Enhancer;
