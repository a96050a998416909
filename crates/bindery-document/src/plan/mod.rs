// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Range planning for split operations.

pub mod ranges;

pub use ranges::{
    DOCUMENT_OVERHEAD, FRONT_MATTER_LABEL, by_bookmark, by_max_size, by_page_count, custom,
};
