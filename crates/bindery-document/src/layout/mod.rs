// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout calculator: pure geometry and numbering, no I/O.

pub mod geometry;
pub mod numerals;

pub use geometry::{
    PageFrame, Rect, TEXT_INSET, fit_image, grid_cells, page_dimensions_for, text_position, text_width,
};
pub use numerals::{format_page_number, to_roman};
