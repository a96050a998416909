// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed option structs for the four engine operations. Every field has its
// default at the type level; callers override with struct-update syntax.

use serde::{Deserialize, Serialize};

use crate::error::{BinderyError, Result};
use crate::types::{
    Anchor, CompressionLevel, LayoutMode, NumberStyle, Orientation, PageRange, PageSize, Rgb,
    WatermarkPosition,
};

/// Largest quality value accepted by the JPEG encoder.
pub const MAX_IMAGE_QUALITY: u8 = 100;

// -- Decorations --------------------------------------------------------------

/// Page number stamp applied to every output page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNumbering {
    pub position: Anchor,
    pub style: NumberStyle,
    pub font_size: f32,
    /// Number printed on the first output page.
    pub start_at: u32,
    pub color: Rgb,
}

impl Default for PageNumbering {
    fn default() -> Self {
        Self {
            position: Anchor::BottomCenter,
            style: NumberStyle::Arabic,
            font_size: 10.0,
            start_at: 1,
            color: Rgb::BLACK,
        }
    }
}

impl PageNumbering {
    /// Check the stamp against an output of `page_count` pages.
    pub fn validate(&self, page_count: u32) -> Result<()> {
        if !(self.font_size > 0.0 && self.font_size.is_finite()) {
            return Err(BinderyError::invalid("page number font size must be positive"));
        }
        self.last_number(page_count).map(|_| ())
    }

    /// Number printed on the last of `page_count` pages.
    pub fn last_number(&self, page_count: u32) -> Result<u32> {
        self.start_at
            .checked_add(page_count.saturating_sub(1))
            .ok_or_else(|| {
                BinderyError::invalid(format!(
                    "page numbers starting at {} overflow over {page_count} pages",
                    self.start_at
                ))
            })
    }
}

/// Semi-transparent rotated text stamp drawn on top of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Watermark {
    pub text: String,
    /// In `(0, 1]`.
    pub opacity: f32,
    pub rotation_degrees: f32,
    pub font_size: f32,
    pub color: Rgb,
    pub position: WatermarkPosition,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            text: "CONFIDENTIAL".into(),
            opacity: 0.3,
            rotation_degrees: 45.0,
            font_size: 48.0,
            color: Rgb::GRAY,
            position: WatermarkPosition::Center,
        }
    }
}

impl Watermark {
    pub fn validate(&self) -> Result<()> {
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(BinderyError::invalid(format!(
                "watermark opacity must be in (0, 1], got {}",
                self.opacity
            )));
        }
        if self.font_size <= 0.0 {
            return Err(BinderyError::invalid("watermark font size must be positive"));
        }
        if self.text.trim().is_empty() {
            return Err(BinderyError::invalid("watermark text is empty"));
        }
        Ok(())
    }
}

/// Title page inserted as output page 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitlePage {
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
}

// -- Merge --------------------------------------------------------------------

/// One input of a merge.
#[derive(Debug, Clone)]
pub struct MergeSource {
    /// Declared name, used as the bookmark title.
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

impl MergeSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { name: None, bytes }
    }

    pub fn named(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSpec {
    /// One bookmark per source at the page where it begins.
    pub add_bookmarks: bool,
    /// Nest each source's own outline under its bookmark.
    pub preserve_source_bookmarks: bool,
    pub page_numbers: Option<PageNumbering>,
    pub title_page: Option<TitlePage>,
    pub remove_blank_pages: bool,
    pub optimize_for_print: bool,
    pub watermark: Option<Watermark>,
}

impl Default for MergeSpec {
    fn default() -> Self {
        Self {
            add_bookmarks: true,
            preserve_source_bookmarks: false,
            page_numbers: None,
            title_page: None,
            remove_blank_pages: false,
            optimize_for_print: false,
            watermark: None,
        }
    }
}

impl MergeSpec {
    pub fn validate(&self, source_count: usize) -> Result<()> {
        if source_count < 2 {
            return Err(BinderyError::invalid(format!(
                "merge needs at least 2 documents, got {source_count}"
            )));
        }
        if let Some(numbering) = &self.page_numbers {
            numbering.validate(1)?;
        }
        if let Some(watermark) = &self.watermark {
            watermark.validate()?;
        }
        Ok(())
    }
}

// -- Split --------------------------------------------------------------------

/// How a document is cut into ranges. Each variant carries only its own
/// parameters, so strategies cannot be mixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitStrategy {
    ByPageCount { pages_per_file: u32 },
    ByMaxSize { max_bytes: u64 },
    ByBookmark,
    Custom { ranges: Vec<PageRange> },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        Self::ByPageCount { pages_per_file: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSpec {
    pub strategy: SplitStrategy,
    /// Prefix of every output name: `{base_name}_{label}.pdf`.
    pub base_name: String,
    /// Copy the source /Info dictionary into each output.
    pub preserve_metadata: bool,
    /// Carry bookmarks that fall inside a range into its output.
    pub preserve_bookmarks: bool,
}

impl Default for SplitSpec {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::default(),
            base_name: "document".into(),
            preserve_metadata: true,
            preserve_bookmarks: true,
        }
    }
}

impl SplitSpec {
    pub fn validate(&self) -> Result<()> {
        match &self.strategy {
            SplitStrategy::ByPageCount { pages_per_file: 0 } => {
                Err(BinderyError::invalid("pages per file must be at least 1"))
            }
            SplitStrategy::ByMaxSize { max_bytes: 0 } => {
                Err(BinderyError::invalid("maximum output size must be positive"))
            }
            SplitStrategy::Custom { ranges } if ranges.is_empty() => {
                Err(BinderyError::invalid("custom split needs at least one range"))
            }
            _ => Ok(()),
        }
    }
}

// -- Compress -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressSpec {
    pub level: CompressionLevel,
    /// JPEG quality 0-100; `None` uses the level default.
    pub image_quality: Option<u8>,
    /// Downsampling target; `None` uses the level default.
    pub max_image_dpi: Option<u32>,
    pub optimize_images: bool,
    pub downsample_images: bool,
    pub grayscale: bool,
    pub remove_metadata: bool,
    pub remove_annotations: bool,
    pub remove_bookmarks: bool,
}

impl Default for CompressSpec {
    fn default() -> Self {
        Self {
            level: CompressionLevel::Medium,
            image_quality: None,
            max_image_dpi: None,
            optimize_images: true,
            downsample_images: true,
            grayscale: false,
            remove_metadata: false,
            remove_annotations: false,
            remove_bookmarks: false,
        }
    }
}

impl CompressSpec {
    pub fn validate(&self) -> Result<()> {
        if let Some(quality) = self.image_quality
            && quality > MAX_IMAGE_QUALITY
        {
            return Err(BinderyError::invalid(format!(
                "image quality must be 0-100, got {quality}"
            )));
        }
        if self.max_image_dpi == Some(0) {
            return Err(BinderyError::invalid("maximum image DPI must be positive"));
        }
        Ok(())
    }
}

// -- Images to document -------------------------------------------------------

/// Stroke drawn around each placed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    pub width: f32,
    pub color: Rgb,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Rgb::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAssemblySpec {
    pub page_size: PageSize,
    pub orientation: Orientation,
    /// Margin on every side, in points.
    pub margin: f32,
    pub images_per_page: u32,
    pub layout_mode: LayoutMode,
    pub border: Option<Border>,
    pub background: Option<Rgb>,
    pub page_numbers: Option<PageNumbering>,
    /// Stamp the assembly time on every page at this anchor.
    pub timestamp: Option<Anchor>,
    pub watermark: Option<Watermark>,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl Default for ImageAssemblySpec {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin: 36.0,
            images_per_page: 1,
            layout_mode: LayoutMode::Fit,
            border: None,
            background: None,
            page_numbers: None,
            timestamp: None,
            watermark: None,
            title: None,
            author: None,
        }
    }
}

impl ImageAssemblySpec {
    pub fn validate(&self, image_count: usize) -> Result<()> {
        if image_count == 0 {
            return Err(BinderyError::invalid("no images supplied"));
        }
        if self.images_per_page == 0 {
            return Err(BinderyError::invalid("images per page must be at least 1"));
        }
        let (width, height) = self.page_size.dimensions_pt();
        if self.margin < 0.0 || self.margin * 2.0 >= width.min(height) {
            return Err(BinderyError::invalid(format!(
                "margin {} leaves no room on a {width}x{height} page",
                self.margin
            )));
        }
        if let Some(numbering) = &self.page_numbers {
            numbering.validate(image_count.div_ceil(self.images_per_page as usize) as u32)?;
        }
        if let Some(watermark) = &self.watermark {
            watermark.validate()?;
        }
        Ok(())
    }
}
