// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for API clients.
//
// Every technical error is mapped to plain English, a suggestion, and the HTTP
// status the service answers with.

use crate::error::EnhancerError;

/// Who has to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The caller sent something we cannot use; resending it will not help.
    Rejected,
    /// Something on our side failed; the same request may work later.
    Transient,
    /// A local problem that was already worked around.
    Degraded,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the caller should try next.
    pub suggestion: String,
    /// HTTP status code for the response.
    pub status: u16,
    /// Whether retrying the identical request is worthwhile.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert an `EnhancerError` into a `HumanError`.
pub fn humanize_error(err: &EnhancerError) -> HumanError {
    match err {
        EnhancerError::Decode(_) => HumanError {
            message: "This file could not be read as an image.".into(),
            suggestion: "Upload a PNG, JPEG, WebP, BMP, GIF or TIFF file.".into(),
            status: 400,
            retriable: false,
            severity: Severity::Rejected,
        },

        EnhancerError::Encode(detail) => HumanError {
            message: "The enhanced image could not be saved.".into(),
            suggestion: format!("Try again, or try a smaller image. ({detail})"),
            status: 500,
            retriable: true,
            severity: Severity::Transient,
        },

        EnhancerError::FilterUnavailable(detail) => HumanError {
            message: "Noise reduction ran in reduced-quality mode.".into(),
            suggestion: format!("The result is usable but smoother than usual. ({detail})"),
            status: 200,
            retriable: false,
            severity: Severity::Degraded,
        },

        EnhancerError::ImageTooLarge {
            width,
            height,
            factor,
        } => HumanError {
            message: "The image is too large for this upscaling factor.".into(),
            suggestion: format!(
                "A {width}x{height} image cannot be enlarged {factor}x. Pick a smaller factor or resize the image first."
            ),
            status: 413,
            retriable: false,
            severity: Severity::Rejected,
        },

        EnhancerError::InvalidConfig(detail) => HumanError {
            message: detail.clone(),
            suggestion: "Adjust the parameter to fall inside its documented range.".into(),
            status: 400,
            retriable: false,
            severity: Severity::Rejected,
        },

        EnhancerError::BadRequest(detail) => HumanError {
            message: detail.clone(),
            suggestion: "Send the image as a multipart `file` field or as a raw image/* body.".into(),
            status: 400,
            retriable: false,
            severity: Severity::Rejected,
        },

        EnhancerError::Server(detail) => HumanError {
            message: "The enhancement service had a problem.".into(),
            suggestion: format!("Try again in a moment. ({detail})"),
            status: 500,
            retriable: true,
            severity: Severity::Transient,
        },

        EnhancerError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    status: 404,
                    retriable: false,
                    severity: Severity::Rejected,
                }
            } else {
                HumanError {
                    message: "A file could not be read or written.".into(),
                    suggestion: format!("Check disk space and permissions. ({io_err})"),
                    status: 500,
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        EnhancerError::Serialization(_) => HumanError {
            message: "A response could not be assembled.".into(),
            suggestion: "Try again. If it keeps happening, report it.".into(),
            status: 500,
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
