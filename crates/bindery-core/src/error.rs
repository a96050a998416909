// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bindery.

use thiserror::Error;

/// Top-level error type for all Bindery operations.
///
/// `Decode`, `Encode`, `InvalidOptions`, `Cancelled` and `DeadlineExceeded`
/// are terminal. `Range`, `Element` and `Unsupported` describe recoverable
/// per-element problems; the engine logs them and carries on.
#[derive(Debug, Error)]
pub enum BinderyError {
    // -- Input --
    #[error("could not read document: {0}")]
    Decode(String),

    #[error("page range {start}-{end} rejected: {reason}")]
    Range { start: u32, end: u32, reason: String },

    // -- Output --
    #[error("could not write document: {0}")]
    Encode(String),

    // -- Per-element (recovered) --
    #[error("element {index} skipped: {reason}")]
    Element { index: usize, reason: String },

    #[error("unsupported content: {0}")]
    Unsupported(String),

    // -- Caller --
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation exceeded its deadline")]
    DeadlineExceeded,

    // -- Configuration / service layer --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BinderyError {
    /// Shorthand for an [`BinderyError::InvalidOptions`] error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOptions(reason.into())
    }

    /// Whether the engine may log this error and continue with the next element.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Range { .. } | Self::Element { .. } | Self::Unsupported(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BinderyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_errors_are_recoverable() {
        let err = BinderyError::Element {
            index: 3,
            reason: "bad header".into(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "element 3 skipped: bad header");
    }

    #[test]
    fn decode_errors_are_terminal() {
        assert!(!BinderyError::Decode("truncated".into()).is_recoverable());
        assert!(!BinderyError::Cancelled.is_recoverable());
    }
}
