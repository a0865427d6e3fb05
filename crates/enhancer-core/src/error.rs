// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the image enhancer.

use thiserror::Error;

/// Top-level error type for all enhancer operations.
#[derive(Debug, Error)]
pub enum EnhancerError {
    // -- Pipeline errors --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The preferred implementation of an optional filter cannot run here.
    /// Callers recover from this one; every other variant propagates.
    #[error("filter unavailable: {0}")]
    FilterUnavailable(String),

    #[error("image too large: {width}x{height} cannot be scaled by {factor}")]
    ImageTooLarge { width: u32, height: u32, factor: u32 },

    #[error("invalid enhancement parameter: {0}")]
    InvalidConfig(String),

    // -- Service errors --
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("enhancement server error: {0}")]
    Server(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EnhancerError>;
