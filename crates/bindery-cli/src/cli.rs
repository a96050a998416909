// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their translation into engine option structs.

use std::path::PathBuf;

use bindery_core::{
    Anchor, BinderyError, Border, CompressSpec, CompressionLevel, ImageAssemblySpec, LayoutMode,
    MergeSpec, NumberStyle, Orientation, PageNumbering, PageRange, PageSize, Result, Rgb,
    SplitStrategy, TitlePage, Watermark,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "bindery")]
#[command(version)]
#[command(about = "Merge, split, compress, and assemble PDF documents", long_about = None)]
pub struct Cli {
    /// Engine configuration as JSON; missing fields keep their defaults
    #[arg(long, global = true, value_name = "FILE", env = "BINDERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Abandon the operation after this many seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge two or more documents into one
    Merge(MergeArgs),
    /// Split a document into several
    Split(SplitArgs),
    /// Reduce the size of a document
    Compress(CompressArgs),
    /// Lay images out on the pages of a new document
    Images(ImagesArgs),
}

// -- Shared -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnchorArg {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl From<AnchorArg> for Anchor {
    fn from(value: AnchorArg) -> Self {
        match value {
            AnchorArg::TopLeft => Anchor::TopLeft,
            AnchorArg::TopCenter => Anchor::TopCenter,
            AnchorArg::TopRight => Anchor::TopRight,
            AnchorArg::BottomLeft => Anchor::BottomLeft,
            AnchorArg::BottomCenter => Anchor::BottomCenter,
            AnchorArg::BottomRight => Anchor::BottomRight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NumberStyleArg {
    Arabic,
    RomanLower,
    RomanUpper,
    PageOfTotal,
}

impl From<NumberStyleArg> for NumberStyle {
    fn from(value: NumberStyleArg) -> Self {
        match value {
            NumberStyleArg::Arabic => NumberStyle::Arabic,
            NumberStyleArg::RomanLower => NumberStyle::RomanLower,
            NumberStyleArg::RomanUpper => NumberStyle::RomanUpper,
            NumberStyleArg::PageOfTotal => NumberStyle::PageOfTotal,
        }
    }
}

/// Page numbering and watermark flags shared by `merge` and `images`.
#[derive(Debug, Clone, Args)]
pub struct DecorationArgs {
    /// Stamp page numbers at this position
    #[arg(long, value_enum, value_name = "ANCHOR")]
    pub number_pages: Option<AnchorArg>,

    /// Page number format
    #[arg(long, value_enum, default_value = "arabic")]
    pub number_style: NumberStyleArg,

    /// Number of the first page
    #[arg(long, default_value_t = 1)]
    pub start_at: u32,

    /// Watermark text drawn across every page
    #[arg(long, value_name = "TEXT")]
    pub watermark: Option<String>,

    /// Watermark opacity, above 0 and at most 1
    #[arg(long, default_value_t = 0.3)]
    pub watermark_opacity: f32,
}

impl DecorationArgs {
    pub fn page_numbers(&self) -> Option<PageNumbering> {
        self.number_pages.map(|position| PageNumbering {
            position: position.into(),
            style: self.number_style.into(),
            start_at: self.start_at,
            ..PageNumbering::default()
        })
    }

    pub fn watermark(&self) -> Option<Watermark> {
        self.watermark.as_ref().map(|text| Watermark {
            text: text.clone(),
            opacity: self.watermark_opacity,
            ..Watermark::default()
        })
    }
}

// -- Merge --------------------------------------------------------------------

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Documents to merge, in order
    #[arg(required = true, num_args = 2.., value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Do not add a bookmark per input document
    #[arg(long)]
    pub no_bookmarks: bool,

    /// Keep each input's own bookmarks under its entry
    #[arg(long)]
    pub keep_outlines: bool,

    /// Insert a title page with this title
    #[arg(long)]
    pub title: Option<String>,

    /// Author shown on the title page
    #[arg(long, requires = "title")]
    pub author: Option<String>,

    /// Subject shown on the title page
    #[arg(long, requires = "title")]
    pub subject: Option<String>,

    /// Leave out pages with no visible content
    #[arg(long)]
    pub remove_blank: bool,

    /// Prepare the output for printing
    #[arg(long)]
    pub print: bool,

    #[command(flatten)]
    pub decoration: DecorationArgs,
}

impl MergeArgs {
    pub fn spec(&self) -> MergeSpec {
        MergeSpec {
            add_bookmarks: !self.no_bookmarks,
            preserve_source_bookmarks: self.keep_outlines,
            page_numbers: self.decoration.page_numbers(),
            title_page: self.title.as_ref().map(|title| TitlePage {
                title: title.clone(),
                author: self.author.clone(),
                subject: self.subject.clone(),
            }),
            remove_blank_pages: self.remove_blank,
            optimize_for_print: self.print,
            watermark: self.decoration.watermark(),
        }
    }
}

// -- Split --------------------------------------------------------------------

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("strategy").required(true).multiple(false)))]
pub struct SplitArgs {
    /// Document to split
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Directory for the outputs
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Output name prefix (defaults to the input file name)
    #[arg(long)]
    pub base_name: Option<String>,

    /// Fixed number of pages per output
    #[arg(long, group = "strategy", value_name = "N")]
    pub pages_per_file: Option<u32>,

    /// Maximum size of each output in bytes
    #[arg(long, group = "strategy", value_name = "BYTES")]
    pub max_size: Option<u64>,

    /// One output per top-level bookmark
    #[arg(long, group = "strategy")]
    pub by_bookmark: bool,

    /// Comma-separated ranges such as `1-3,4,7-9`
    #[arg(long, group = "strategy", value_name = "RANGES")]
    pub ranges: Option<String>,

    /// Do not copy document metadata into the outputs
    #[arg(long)]
    pub no_metadata: bool,

    /// Do not carry bookmarks into the outputs
    #[arg(long)]
    pub no_bookmarks: bool,
}

impl SplitArgs {
    pub fn strategy(&self) -> Result<SplitStrategy> {
        if let Some(pages_per_file) = self.pages_per_file {
            return Ok(SplitStrategy::ByPageCount { pages_per_file });
        }
        if let Some(max_bytes) = self.max_size {
            return Ok(SplitStrategy::ByMaxSize { max_bytes });
        }
        if self.by_bookmark {
            return Ok(SplitStrategy::ByBookmark);
        }
        match &self.ranges {
            Some(ranges) => Ok(SplitStrategy::Custom {
                ranges: parse_ranges(ranges)?,
            }),
            None => Err(BinderyError::invalid("no split strategy given")),
        }
    }
}

/// Parse `1-3,4,7-9` into inclusive ranges.
pub fn parse_ranges(text: &str) -> Result<Vec<PageRange>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let bad = || BinderyError::invalid(format!("cannot read page range {part:?}"));
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (start.trim(), end.trim()),
                None => (part, part),
            };
            let start: u32 = start.parse().map_err(|_| bad())?;
            let end: u32 = end.parse().map_err(|_| bad())?;
            Ok(PageRange::new(start, end))
        })
        .collect()
}

// -- Compress -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Low,
    Medium,
    High,
    Maximum,
}

impl From<LevelArg> for CompressionLevel {
    fn from(value: LevelArg) -> Self {
        match value {
            LevelArg::Low => CompressionLevel::Low,
            LevelArg::Medium => CompressionLevel::Medium,
            LevelArg::High => CompressionLevel::High,
            LevelArg::Maximum => CompressionLevel::Maximum,
        }
    }
}

#[derive(Debug, Args)]
pub struct CompressArgs {
    /// Document to compress
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value = "medium")]
    pub level: LevelArg,

    /// JPEG quality for re-encoded images (0-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Downsample images above this resolution
    #[arg(long, value_name = "DPI")]
    pub max_dpi: Option<u32>,

    /// Leave embedded images untouched
    #[arg(long)]
    pub no_images: bool,

    /// Re-encode images without downsampling
    #[arg(long)]
    pub no_downsample: bool,

    /// Convert images to grayscale
    #[arg(long)]
    pub grayscale: bool,

    /// Remove document metadata
    #[arg(long)]
    pub strip_metadata: bool,

    /// Remove annotations
    #[arg(long)]
    pub strip_annotations: bool,

    /// Remove bookmarks
    #[arg(long)]
    pub strip_bookmarks: bool,

    /// Write the output even when it saves less than 5%
    #[arg(long)]
    pub force: bool,
}

impl CompressArgs {
    pub fn spec(&self) -> CompressSpec {
        CompressSpec {
            level: self.level.into(),
            image_quality: self.quality,
            max_image_dpi: self.max_dpi,
            optimize_images: !self.no_images,
            downsample_images: !self.no_downsample,
            grayscale: self.grayscale,
            remove_metadata: self.strip_metadata,
            remove_annotations: self.strip_annotations,
            remove_bookmarks: self.strip_bookmarks,
        }
    }
}

// -- Images -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Fit,
    Fill,
    Stretch,
    Center,
}

impl From<LayoutArg> for LayoutMode {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Fit => LayoutMode::Fit,
            LayoutArg::Fill => LayoutMode::Fill,
            LayoutArg::Stretch => LayoutMode::Stretch,
            LayoutArg::Center => LayoutMode::Center,
        }
    }
}

#[derive(Debug, Args)]
pub struct ImagesArgs {
    /// Images to place, in order
    #[arg(required = true, value_name = "IMAGE")]
    pub inputs: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// A3, A4, A5, Letter or Legal
    #[arg(long, default_value = "A4", value_parser = parse_page_size)]
    pub page_size: PageSize,

    #[arg(long)]
    pub landscape: bool,

    /// Margin on every side, in points
    #[arg(long, default_value_t = 36.0)]
    pub margin: f32,

    #[arg(long, default_value_t = 1)]
    pub per_page: u32,

    #[arg(long, value_enum, default_value = "fit")]
    pub layout: LayoutArg,

    /// Draw a border of this width (points) around each image
    #[arg(long, value_name = "WIDTH")]
    pub border: Option<f32>,

    /// Page background as `#rrggbb`
    #[arg(long, value_name = "COLOUR", value_parser = parse_colour)]
    pub background: Option<Rgb>,

    /// Stamp the creation time at this position
    #[arg(long, value_enum, value_name = "ANCHOR")]
    pub timestamp: Option<AnchorArg>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[command(flatten)]
    pub decoration: DecorationArgs,
}

impl ImagesArgs {
    pub fn spec(&self) -> ImageAssemblySpec {
        ImageAssemblySpec {
            page_size: self.page_size,
            orientation: if self.landscape {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            },
            margin: self.margin,
            images_per_page: self.per_page,
            layout_mode: self.layout.into(),
            border: self.border.map(|width| Border {
                width,
                ..Border::default()
            }),
            background: self.background,
            page_numbers: self.decoration.page_numbers(),
            timestamp: self.timestamp.map(Anchor::from),
            watermark: self.decoration.watermark(),
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

fn parse_page_size(value: &str) -> std::result::Result<PageSize, String> {
    PageSize::from_name(value).ok_or_else(|| format!("unknown page size {value:?}"))
}

fn parse_colour(value: &str) -> std::result::Result<Rgb, String> {
    Rgb::from_hex(value).ok_or_else(|| format!("expected #rrggbb, got {value:?}"))
}
