// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bindery document engine.

use serde::{Deserialize, Serialize};

/// Standard page sizes. All dimensions are in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_pt: f32, height_pt: f32 },
}

impl PageSize {
    /// Portrait dimensions in points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A3 => (842.0, 1191.0),
            Self::A4 => (595.0, 842.0),
            Self::A5 => (420.0, 595.0),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            Self::Custom {
                width_pt,
                height_pt,
            } => (*width_pt, *height_pt),
        }
    }

    /// Look up a named size, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a3" => Some(Self::A3),
            "a4" => Some(Self::A4),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            _ => None,
        }
    }
}

/// Page orientation. Landscape swaps width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Strategy for fitting a raster image into a bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Uniform scale to the largest size that fits, centred.
    #[default]
    Fit,
    /// Box dimensions used directly; aspect ratio not preserved.
    Fill,
    /// Same geometry as `Fill`.
    Stretch,
    /// Original size, centred; may overflow the box.
    Center,
}

/// One of the six text anchors used for page numbers and stamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub fn is_top(&self) -> bool {
        matches!(self, Self::TopLeft | Self::TopCenter | Self::TopRight)
    }
}

/// Where a watermark is drawn on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatermarkPosition {
    #[default]
    Center,
    At(Anchor),
}

/// How page numbers are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberStyle {
    /// `3`
    #[default]
    Arabic,
    /// `iii`
    RomanLower,
    /// `III`
    RomanUpper,
    /// `Page 3 of 9`
    PageOfTotal,
}

/// Named compression preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
    Maximum,
}

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Components clamped into the valid range.
    pub fn clamped(&self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Inclusive interval of 1-based page numbers within one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
    /// Empty means "derive from the bounds".
    #[serde(default)]
    pub label: String,
}

impl PageRange {
    /// A range labelled `pages-S-E`.
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            label: Self::default_label(start, end),
        }
    }

    pub fn with_label(start: u32, end: u32, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    pub fn default_label(start: u32, end: u32) -> String {
        if start == end {
            format!("page-{start}")
        } else {
            format!("pages-{start}-{end}")
        }
    }

    /// Number of pages covered (0 for an inverted range).
    pub fn len(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// Named jump target. `page` is 1-based and absolute in the document that
/// carries the bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub page: u32,
    #[serde(default)]
    pub children: Vec<Bookmark>,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, page: u32) -> Self {
        Self {
            title: title.into(),
            page,
            children: Vec::new(),
        }
    }

    /// Total number of entries in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Bookmark::subtree_len).sum::<usize>()
    }
}

/// Entries of a document's /Info dictionary that the engine reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

impl DocumentMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
            && self.creator.is_none()
            && self.producer.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_sizes_in_points() {
        assert_eq!(PageSize::A4.dimensions_pt(), (595.0, 842.0));
        assert_eq!(PageSize::Letter.dimensions_pt(), (612.0, 792.0));
        assert_eq!(PageSize::Legal.dimensions_pt(), (612.0, 1008.0));
        assert_eq!(PageSize::A3.dimensions_pt(), (842.0, 1191.0));
        assert_eq!(PageSize::A5.dimensions_pt(), (420.0, 595.0));
    }

    #[test]
    fn size_names_are_case_insensitive() {
        assert_eq!(PageSize::from_name("LETTER"), Some(PageSize::Letter));
        assert_eq!(PageSize::from_name("tabloid"), None);
    }

    #[test]
    fn hex_colours() {
        assert_eq!(Rgb::from_hex("#ffffff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::from_hex("000000"), Some(Rgb::BLACK));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
    }

    #[test]
    fn range_length_and_labels() {
        let range = PageRange::new(4, 6);
        assert_eq!(range.len(), 3);
        assert_eq!(range.label, "pages-4-6");
        assert_eq!(PageRange::new(2, 2).label, "page-2");
        assert!(PageRange::with_label(5, 4, "x").is_empty());
    }

    #[test]
    fn bookmark_subtree_counts_children() {
        let mut root = Bookmark::new("Part", 1);
        root.children.push(Bookmark::new("Chapter 1", 1));
        root.children.push(Bookmark::new("Chapter 2", 4));
        assert_eq!(root.subtree_len(), 3);
    }
}
