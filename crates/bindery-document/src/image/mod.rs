// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec: decoding, re-encoding, and XObject embedding of raster images.

pub mod embed;
pub mod processor;

pub use embed::{EmbeddableImage, JpegColor};
pub use processor::ImageProcessor;
