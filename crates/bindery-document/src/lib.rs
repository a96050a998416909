// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bindery-document: the document assembly engine.
//
// Merges documents, splits them by page count, size, bookmark or custom
// ranges, recompresses them, and lays raster images out on new pages. All
// input and output is in-memory byte buffers; the engine does no file,
// network or database I/O.

pub mod compress;
pub mod engine;
pub mod image;
pub mod layout;
pub mod pdf;
pub mod plan;
pub mod source;

#[cfg(test)]
mod fixtures;

// Re-export the primary types so callers can use `bindery_document::Bindery` etc.
pub use compress::{CompressionPlan, CompressionReport};
pub use engine::{Bindery, SplitOutput};
pub use crate::image::{EmbeddableImage, ImageProcessor};
pub use pdf::{BuildStage, DocumentBuilder};
pub use source::SourceDocument;
