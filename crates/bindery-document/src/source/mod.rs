// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page source adapter: read-only access to decoded input documents.

mod content;
mod outline;
pub mod reader;

pub use reader::{PageDimensions, SourceDocument};
pub(crate) use content::{OBJECT_OVERHEAD, is_page};
