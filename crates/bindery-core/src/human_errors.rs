// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every engine error is mapped to a plain English message with a clear
// suggestion. The severity tells the calling service how to present it.

use crate::error::BinderyError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retrying later may succeed (timeouts, cancellation).
    Transient,
    /// The user must change something (options, page ranges).
    ActionRequired,
    /// Retrying with the same input will fail again.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `BinderyError` into a `HumanError`.
pub fn humanize_error(err: &BinderyError) -> HumanError {
    match err {
        BinderyError::Decode(detail) => humanize_decode_error(detail),

        BinderyError::Range { start, end, .. } => HumanError {
            message: format!("Pages {start}-{end} don't exist in this document."),
            suggestion: "Check the page numbers against the document's page count.".into(),
            severity: Severity::ActionRequired,
        },

        BinderyError::Encode(_) => HumanError {
            message: "We couldn't produce the finished document.".into(),
            suggestion: "Try again with fewer options enabled. If this keeps happening, please report it.".into(),
            severity: Severity::Permanent,
        },

        BinderyError::Element { index, .. } => HumanError {
            message: format!("Item {} couldn't be used and was left out.", index + 1),
            suggestion: "Try saving that image or page in a common format such as JPEG or PNG.".into(),
            severity: Severity::ActionRequired,
        },

        BinderyError::Unsupported(detail) => HumanError {
            message: "Part of this document uses a format we can't process.".into(),
            suggestion: format!("That part was left unchanged. ({detail})"),
            severity: Severity::Permanent,
        },

        BinderyError::InvalidOptions(detail) => HumanError {
            message: "Some of the chosen settings don't work together.".into(),
            suggestion: format!("Adjust the settings and try again: {detail}."),
            severity: Severity::ActionRequired,
        },

        BinderyError::Cancelled => HumanError {
            message: "The operation was cancelled.".into(),
            suggestion: "Start it again when you're ready.".into(),
            severity: Severity::Transient,
        },

        BinderyError::DeadlineExceeded => HumanError {
            message: "This took too long and was stopped.".into(),
            suggestion: "Try a smaller document, or a lighter compression level.".into(),
            severity: Severity::Transient,
        },

        BinderyError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        BinderyError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check that it is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

/// Parse codec error details into human-readable messages.
fn humanize_decode_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("encrypt") {
        HumanError {
            message: "This document is password-protected.".into(),
            suggestion: "Remove the password in your PDF viewer, save a copy, and use that instead.".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("no pages") {
        HumanError {
            message: "This document has no pages.".into(),
            suggestion: "Check that you picked the right file.".into(),
            severity: Severity::Permanent,
        }
    } else {
        HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer to check it works, or try a different file.".into(),
            severity: Severity::Permanent,
        }
    }
}
