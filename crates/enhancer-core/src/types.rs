// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the image enhancer.

use serde::{Deserialize, Serialize};

/// Header-level facts about an encoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Upper-case container name, e.g. `PNG` or `JPEG`.
    pub format: String,
    /// Channel layout, e.g. `RGB`, `RGBA`, `L`, `I;16`.
    pub mode: String,
    /// Length of the encoded input.
    pub size_bytes: usize,
}

/// Side-by-side renderings returned by the preview operation.
///
/// Every field is a self-describing `data:image/png;base64,...` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewImages {
    /// The decoded input, re-encoded untouched.
    pub original: String,
    /// Pipeline output with the caller's configuration.
    pub enhanced: String,
    /// Pipeline output with the upscaling factor forced to 2.
    pub enhanced_2x: String,
}

/// Lifecycle of the HTTP front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ServerStatus::Stopped => "stopped",
            ServerStatus::Starting => "starting",
            ServerStatus::Running => "running",
        };
        f.write_str(label)
    }
}
