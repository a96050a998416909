// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry: page dimensioning, image fitting, grid cells, and text
// anchoring. Pure functions in PDF user space (points, origin bottom-left).

use bindery_core::{Anchor, LayoutMode, Orientation, PageSize};
use serde::Serialize;

/// Inset of anchored text from the page edges, in points.
pub const TEXT_INSET: f32 = 20.0;

/// Average Helvetica glyph width as a fraction of the font size.
pub const HELVETICA_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Axis-aligned rectangle; `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shift by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink by `margin` on every side, never below zero size.
    pub fn inset(&self, margin: f32) -> Self {
        Self::new(
            self.x + margin,
            self.y + margin,
            (self.width - 2.0 * margin).max(0.0),
            (self.height - 2.0 * margin).max(0.0),
        )
    }
}

/// What a viewer shows of a page: the visible box in user space and the
/// clockwise display rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageFrame {
    pub visible: Rect,
    /// 0, 90, 180 or 270.
    pub rotation: u16,
}

impl PageFrame {
    /// Frame of an unrotated page showing all of `visible`.
    pub fn upright(visible: Rect) -> Self {
        Self {
            visible,
            rotation: 0,
        }
    }

    /// Frame for a page with `media` and optional `crop` boxes and a raw
    /// /Rotate value. The crop box is clipped to the media box.
    pub fn from_boxes(media: Rect, crop: Option<Rect>, rotate: i64) -> Self {
        let visible = crop
            .and_then(|crop| {
                let x0 = crop.x.max(media.x);
                let y0 = crop.y.max(media.y);
                let x1 = (crop.x + crop.width).min(media.x + media.width);
                let y1 = (crop.y + crop.height).min(media.y + media.height);
                (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
            })
            .unwrap_or(media);
        let rotate = rotate.rem_euclid(360);
        Self {
            visible,
            rotation: (rotate - rotate % 90) as u16,
        }
    }

    /// Width and height as displayed.
    pub fn display_size(&self) -> (f32, f32) {
        match self.rotation {
            90 | 270 => (self.visible.height, self.visible.width),
            _ => (self.visible.width, self.visible.height),
        }
    }

    /// `cm` operands taking display space (origin at the displayed
    /// bottom-left corner, axes as the reader sees them) to user space.
    pub fn display_matrix(&self) -> [f32; 6] {
        let Rect {
            x,
            y,
            width,
            height,
        } = self.visible;
        match self.rotation {
            90 => [0.0, 1.0, -1.0, 0.0, x + width, y],
            180 => [-1.0, 0.0, 0.0, -1.0, x + width, y + height],
            270 => [0.0, -1.0, 1.0, 0.0, x, y + height],
            _ => [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }
}

/// Page dimensions for a named or custom size in the given orientation.
pub fn page_dimensions_for(size: PageSize, orientation: Orientation) -> (f32, f32) {
    let (width, height) = size.dimensions_pt();
    match orientation {
        Orientation::Portrait => (width, height),
        Orientation::Landscape => (height, width),
    }
}

/// Place an `image_w` x `image_h` image in a `box_w` x `box_h` box.
///
/// The returned rect is relative to the box's bottom-left corner. `Fit`
/// scales uniformly and centres; `Fill` and `Stretch` use the box as-is;
/// `Center` keeps the original size and may overflow the box.
pub fn fit_image(image_w: f32, image_h: f32, box_w: f32, box_h: f32, mode: LayoutMode) -> Rect {
    match mode {
        LayoutMode::Fit => {
            if image_w <= 0.0 || image_h <= 0.0 {
                return Rect::new(box_w / 2.0, box_h / 2.0, 0.0, 0.0);
            }
            let scale = (box_w / image_w).min(box_h / image_h);
            let width = image_w * scale;
            let height = image_h * scale;
            Rect::new((box_w - width) / 2.0, (box_h - height) / 2.0, width, height)
        }
        LayoutMode::Fill | LayoutMode::Stretch => Rect::new(0.0, 0.0, box_w, box_h),
        LayoutMode::Center => Rect::new(
            (box_w - image_w) / 2.0,
            (box_h - image_h) / 2.0,
            image_w,
            image_h,
        ),
    }
}

/// Baseline origin for a line of text `text_width` wide at `anchor`.
pub fn text_position(page_w: f32, page_h: f32, text_width: f32, anchor: Anchor) -> (f32, f32) {
    let x = match anchor {
        Anchor::TopLeft | Anchor::BottomLeft => TEXT_INSET,
        Anchor::TopCenter | Anchor::BottomCenter => (page_w - text_width) / 2.0,
        Anchor::TopRight | Anchor::BottomRight => page_w - text_width - TEXT_INSET,
    };
    let y = if anchor.is_top() {
        page_h - TEXT_INSET
    } else {
        TEXT_INSET
    };
    (x, y)
}

/// Estimated rendered width of `text` in Helvetica at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * HELVETICA_CHAR_WIDTH_RATIO
}

/// Split `area` into `count` cells of a near-square grid separated by
/// `spacing`, returned row-major from the top-left.
pub fn grid_cells(area: Rect, count: u32, spacing: f32) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let cols = (count as f32).sqrt().ceil() as u32;
    let rows = count.div_ceil(cols);
    let cell_w = ((area.width - spacing * (cols - 1) as f32) / cols as f32).max(0.0);
    let cell_h = ((area.height - spacing * (rows - 1) as f32) / rows as f32).max(0.0);

    (0..count)
        .map(|index| {
            let col = index % cols;
            let row = index / cols;
            let x = area.x + col as f32 * (cell_w + spacing);
            let top = area.y + area.height - row as f32 * (cell_h + spacing);
            Rect::new(x, top - cell_h, cell_w, cell_h)
        })
        .collect()
}
