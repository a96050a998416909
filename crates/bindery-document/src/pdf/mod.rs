// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document building on top of `lopdf` (page copying, stamping, outlines) and
// `printpdf` (generated title pages).

pub mod builder;
mod clone;
pub(crate) mod objects;
mod outline;
pub(crate) mod stamp;
mod writer;

pub use builder::{BuildStage, CopiedPages, DocumentBuilder};
